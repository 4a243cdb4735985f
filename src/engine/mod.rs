pub mod arena;
pub mod bot_strategy;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod room;
pub mod store;
