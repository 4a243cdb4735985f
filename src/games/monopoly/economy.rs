//! Pure economic rules: rent, monopolies, mortgages and bankruptcy.

use super::board::{group_positions, Group};
use super::rules::Rules;
use super::types::{GameState, Property, PropertyKind};

/// How the player arrived on the square being charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    Dice,
    /// Moved by a card; utilities then always charge the 10x multiplier.
    Card,
}

/// True iff every square of `group` is owned by `player_id`.
pub fn has_monopoly(state: &GameState, player_id: &str, group: Group) -> bool {
    group_positions(group).iter().all(|pos| {
        state
            .properties
            .get(pos)
            .is_some_and(|p| p.is_owned_by(player_id))
    })
}

fn owned_in_group(state: &GameState, owner: &str, group: Group) -> usize {
    group_positions(group)
        .iter()
        .filter(|pos| {
            state
                .properties
                .get(pos)
                .is_some_and(|p| p.is_owned_by(owner))
        })
        .count()
}

/// Rent a visitor owes `owner` for landing on `property`.
///
/// Streets double their base rent while the owner holds the whole group
/// with nothing mortgaged and this street is unbuilt. Railroads charge
/// 25, 50, 100, 200 by count owned. Utilities charge 4x or 10x the dice
/// total by count owned, except that arriving by card always charges 10x.
pub fn rent_owed(
    state: &GameState,
    property: &Property,
    owner: &str,
    dice_total: i64,
    arrival: Arrival,
) -> i64 {
    match &property.kind {
        PropertyKind::Street { rent, houses, .. } => {
            let houses = usize::from(*houses).min(5);
            let base = rent[houses];
            if houses == 0 && full_group_unmortgaged(state, owner, property.group) {
                base * 2
            } else {
                base
            }
        }
        PropertyKind::Railroad => {
            let count = owned_in_group(state, owner, Group::Railroad).max(1);
            25 * (1 << (count - 1))
        }
        PropertyKind::Utility => {
            let multiplier = match (arrival, owned_in_group(state, owner, Group::Utility)) {
                (Arrival::Card, _) => 10,
                (_, n) if n >= 2 => 10,
                _ => 4,
            };
            dice_total * multiplier
        }
    }
}

fn full_group_unmortgaged(state: &GameState, owner: &str, group: Group) -> bool {
    has_monopoly(state, owner, group)
        && group_positions(group)
            .iter()
            .all(|pos| state.properties.get(pos).is_some_and(|p| !p.mortgaged))
}

pub fn mortgage_value(property: &Property) -> i64 {
    property.mortgage_value
}

/// Mortgage value plus the surcharge, rounded half-up to a whole credit.
pub fn unmortgage_cost(property: &Property, rules: &Rules) -> i64 {
    (property.mortgage_value * (100 + rules.unmortgage_percent) + 50) / 100
}

/// Refund for selling one house back to the bank.
pub fn house_sale_value(property: &Property) -> i64 {
    property.house_price().unwrap_or(0) / 2
}

/// Outcome of a bankruptcy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Solvency {
    Solvent,
    WentBankrupt,
    /// The player went bankrupt and a single survivor won.
    GameWon { winner: String },
}

/// Declares `player_id` bankrupt if their money is negative: every
/// property returns to the bank unbuilt and unmortgaged, and the game is
/// won once a single active player remains. A player already bankrupt is
/// never processed twice.
pub fn check_bankruptcy(state: &mut GameState, player_id: &str) -> Solvency {
    let Some(player) = state.player_mut(player_id) else {
        return Solvency::Solvent;
    };
    if player.bankrupt || player.money >= 0 {
        return Solvency::Solvent;
    }
    player.bankrupt = true;
    let name = player.name.clone();
    let released = std::mem::take(&mut player.properties);

    for pos in &released {
        if let Some(property) = state.properties.get_mut(pos) {
            property.owner = None;
            property.mortgaged = false;
            property.set_houses(0);
        }
    }
    state.log(format!(
        "{name} is bankrupt; {} properties return to the bank",
        released.len()
    ));
    tracing::info!(player_id, released = released.len(), "player bankrupt");

    let survivors: Vec<(String, String)> = state
        .active_players()
        .map(|p| (p.id.clone(), p.name.clone()))
        .collect();
    match survivors.as_slice() {
        [(winner_id, winner_name)] if !state.game_won => {
            let winner_id = winner_id.clone();
            state.game_won = true;
            state.winner = Some(winner_id.clone());
            state.auction = None;
            state.current_trade = None;
            state.log(format!("{winner_name} wins the game"));
            tracing::info!(winner = %winner_id, "game won");
            Solvency::GameWon { winner: winner_id }
        }
        _ => Solvency::WentBankrupt,
    }
}
