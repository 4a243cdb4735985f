//! Dice sources and the roll transition table.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll(pub u8, pub u8);

impl DiceRoll {
    pub fn total(self) -> u8 {
        self.0 + self.1
    }

    pub fn is_double(self) -> bool {
        self.0 == self.1
    }
}

/// Where dice come from. Rooms use [`RandomDice`]; tests script exact rolls.
pub trait DiceSource: Send + Sync {
    fn roll(&mut self) -> DiceRoll;
}

pub struct RandomDice {
    rng: StdRng,
}

impl RandomDice {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl DiceSource for RandomDice {
    fn roll(&mut self) -> DiceRoll {
        DiceRoll(self.rng.gen_range(1..=6), self.rng.gen_range(1..=6))
    }
}

/// Replays a fixed sequence of rolls, then falls back to (1, 2).
#[derive(Debug, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<DiceRoll>,
}

impl ScriptedDice {
    pub fn new(rolls: &[(u8, u8)]) -> Self {
        Self {
            rolls: rolls.iter().map(|&(a, b)| DiceRoll(a, b)).collect(),
        }
    }

    pub fn push(&mut self, a: u8, b: u8) {
        self.rolls.push_back(DiceRoll(a, b));
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self) -> DiceRoll {
        self.rolls.pop_front().unwrap_or(DiceRoll(1, 2))
    }
}

/// What a roll does, given the roller's jail status and doubles streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollTransition {
    /// Doubles in jail: released, but the dice are not used as a move and
    /// the player may roll again this turn.
    LeaveJail,
    /// Failed attempt in jail; the turn is over.
    StayInJail,
    /// Last allowed failed attempt: the fine is forced and the player is
    /// released without moving.
    ForcedFine,
    /// Third consecutive doubles: straight to jail, no move.
    Speeding,
    /// Move, then roll again.
    MoveAndRollAgain,
    /// Move; the roll is spent.
    Move,
}

pub fn roll_transition(
    roll: DiceRoll,
    in_jail: bool,
    jail_turns: u8,
    doubles_so_far: u8,
    max_jail_turns: u8,
) -> RollTransition {
    match (in_jail, roll.is_double()) {
        (true, true) => RollTransition::LeaveJail,
        (true, false) if jail_turns + 1 >= max_jail_turns => RollTransition::ForcedFine,
        (true, false) => RollTransition::StayInJail,
        (false, true) if doubles_so_far + 1 >= 3 => RollTransition::Speeding,
        (false, true) => RollTransition::MoveAndRollAgain,
        (false, false) => RollTransition::Move,
    }
}
