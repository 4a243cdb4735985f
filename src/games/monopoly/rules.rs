//! Tunable house rules. Every field has a default so a partial `[rules]`
//! table in the config file is enough.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Rules {
    pub starting_money: i64,
    pub go_bonus: i64,
    pub jail_fine: i64,
    /// Failed doubles attempts before the fine is forced.
    pub max_jail_turns: u8,
    pub auction_seconds: u32,
    pub min_players: usize,
    pub max_players: usize,
    /// Surcharge on top of the mortgage value when lifting a mortgage.
    pub unmortgage_percent: i64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            starting_money: 1500,
            go_bonus: 200,
            jail_fine: 50,
            max_jail_turns: 3,
            auction_seconds: 10,
            min_players: 2,
            max_players: 4,
            unmortgage_percent: 10,
        }
    }
}

pub const PLAYER_COLORS: [&str; 4] = ["red", "blue", "green", "yellow"];
