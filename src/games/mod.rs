pub mod monopoly;
