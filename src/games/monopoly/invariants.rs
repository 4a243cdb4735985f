//! Consistency checks over a [`GameState`].
//!
//! These never fire in a correctly applied game; simulations and tests run
//! them after every step to catch bookkeeping bugs.

use std::collections::BTreeMap;

use super::board::{group_positions, BOARD_SIZE};
use super::economy::has_monopoly;
use super::rules::Rules;
use super::types::GameState;

/// Cards per deck; a drawn card always returns before the action ends.
pub const DECK_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

#[must_use]
pub fn check_invariants(state: &GameState, rules: &Rules) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut fail = |message: String| violations.push(InvariantViolation { message });

    if state.players.len() > rules.max_players {
        fail(format!("{} players in a room of {}", state.players.len(), rules.max_players));
    }

    for player in &state.players {
        if player.position >= BOARD_SIZE {
            fail(format!("{} stands on square {}", player.id, player.position));
        }
        if !player.bankrupt && player.money < 0 {
            fail(format!("{} has {} but is not bankrupt", player.id, player.money));
        }
        if player.bankrupt && !player.properties.is_empty() {
            fail(format!("bankrupt {} still owns {:?}", player.id, player.properties));
        }
        if player.jail_turns >= rules.max_jail_turns {
            fail(format!("{} has spent {} turns in jail", player.id, player.jail_turns));
        }
        for pos in &player.properties {
            let owned = state.properties.get(pos).is_some_and(|p| p.is_owned_by(&player.id));
            if !owned {
                fail(format!("{} lists property {pos} it does not own", player.id));
            }
        }
    }

    let mut by_group: BTreeMap<_, Vec<u8>> = BTreeMap::new();
    for (pos, property) in &state.properties {
        if let Some(owner) = &property.owner {
            let listed = state.player(owner).is_some_and(|p| p.properties.contains(pos));
            if !listed {
                fail(format!("property {pos} owned by {owner} missing from portfolio"));
            }
        }
        let houses = property.houses();
        if houses > 5 {
            fail(format!("property {pos} has {houses} houses"));
        }
        if houses > 0 {
            if property.mortgaged {
                fail(format!("mortgaged property {pos} has buildings"));
            }
            let monopoly = property
                .owner
                .as_deref()
                .is_some_and(|owner| has_monopoly(state, owner, property.group));
            if !monopoly {
                fail(format!("property {pos} has buildings without a monopoly"));
            }
        }
        by_group.entry(property.group).or_default().push(houses);
    }

    for (group, houses) in &by_group {
        let (min, max) = (houses.iter().min(), houses.iter().max());
        if let (Some(min), Some(max)) = (min, max) {
            if max - min > 1 {
                fail(format!("{group:?} built unevenly: {houses:?}"));
            }
        }
        if houses.len() != group_positions(*group).len() {
            fail(format!("{group:?} has {} property records", houses.len()));
        }
    }

    for (name, deck) in [("chance", &state.chance_deck), ("community chest", &state.community_chest_deck)] {
        if deck.len() != DECK_SIZE {
            fail(format!("{name} deck holds {} cards", deck.len()));
        }
    }

    if let Some(auction) = &state.auction {
        if state.properties.get(&auction.property_id).map_or(true, |p| p.owner.is_some()) {
            fail(format!("auction for unavailable property {}", auction.property_id));
        }
    }

    if state.game_won {
        let active: Vec<_> = state.active_players().map(|p| p.id.as_str()).collect();
        if active.len() != 1 || state.winner.as_deref() != active.first().copied() {
            fail(format!("winner {:?} but active players {active:?}", state.winner));
        }
    } else if state.game_started && state.current_player().map_or(true, |p| p.bankrupt) {
        fail(format!("turn belongs to index {}, which cannot act", state.current_player_index));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::monopoly::types::PlayerState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fresh() -> GameState {
        let mut state = GameState::new(&mut StdRng::seed_from_u64(2));
        state.players.push(PlayerState::new("a", "A", "red", 1500));
        state.players.push(PlayerState::new("b", "B", "blue", 1500));
        state.game_started = true;
        state
    }

    #[test]
    fn test_fresh_game_is_consistent() {
        assert!(check_invariants(&fresh(), &Rules::default()).is_empty());
    }

    #[test]
    fn test_detects_orphan_portfolio_entry() {
        let mut state = fresh();
        state.player_mut("a").unwrap().properties.push(1);
        let violations = check_invariants(&state, &Rules::default());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("does not own"));
    }

    #[test]
    fn test_detects_uneven_building() {
        let mut state = fresh();
        state.transfer_property(1, Some("a"));
        state.transfer_property(3, Some("a"));
        state.properties.get_mut(&1).unwrap().set_houses(3);
        let violations = check_invariants(&state, &Rules::default());
        assert!(violations.iter().any(|v| v.message.contains("unevenly")));
    }

    #[test]
    fn test_detects_negative_solvent_player() {
        let mut state = fresh();
        state.player_mut("b").unwrap().money = -1;
        assert!(!check_invariants(&state, &Rules::default()).is_empty());
    }
}
