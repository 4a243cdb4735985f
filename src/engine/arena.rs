//! Bot-vs-bot arena: complete games played headless through the same
//! state machine the rooms use.

use std::collections::HashMap;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::engine::bot_strategy::{BotStrategy, Seat};
use crate::games::monopoly::actions::GameAction;
use crate::games::monopoly::dice::RandomDice;
use crate::games::monopoly::invariants::check_invariants;
use crate::games::monopoly::machine::MonopolyGame;
use crate::games::monopoly::rules::Rules;
use crate::games::monopoly::types::{GameState, Notice, TradeProposal};

/// Own-turn actions before the arena forces the turn along.
const MAX_ACTIONS_PER_TURN: usize = 40;
/// Consecutive rejected actions before a game is abandoned.
const MAX_STALLS: usize = 8;

#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub num_games: usize,
    pub base_seed: u64,
    pub alternate_seats: bool,
    /// Game steps before a game is declared unfinished.
    pub max_steps: usize,
    pub check_invariants: bool,
    pub rules: Rules,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            num_games: 100,
            base_seed: 42,
            alternate_seats: true,
            max_steps: 20_000,
            check_invariants: false,
            rules: Rules::default(),
        }
    }
}

/// Result of one headless game.
#[derive(Debug, Clone, Default)]
pub struct GameOutcome {
    /// Strategy name of the winning seat.
    pub winner: Option<String>,
    pub rolls: usize,
    pub steps: usize,
    pub violations: Vec<String>,
    pub duration_ms: f64,
}

/// Aggregated results from an arena run.
#[derive(Debug, Clone, Default)]
pub struct ArenaResult {
    pub num_games: usize,
    pub wins: HashMap<String, usize>,
    pub unfinished: usize,
    pub rolls: Vec<usize>,
    pub game_durations_ms: Vec<f64>,
    pub violations: Vec<String>,
}

impl ArenaResult {
    pub fn win_rate(&self, name: &str) -> f64 {
        *self.wins.get(name).unwrap_or(&0) as f64 / self.num_games.max(1) as f64
    }

    pub fn confidence_interval_95(&self, name: &str) -> (f64, f64) {
        let n = self.num_games;
        if n == 0 {
            return (0.0, 0.0);
        }
        let p = self.win_rate(name);
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n as f64;
        let center = (p + z * z / (2.0 * n as f64)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n as f64)) / n as f64).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn avg_rolls(&self) -> f64 {
        if self.rolls.is_empty() {
            return 0.0;
        }
        self.rolls.iter().sum::<usize>() as f64 / self.rolls.len() as f64
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Arena Results ({} games)", self.num_games)];
        lines.push("=".repeat(60));
        let mut names: Vec<_> = self.wins.keys().collect();
        names.sort();
        for name in names {
            let (ci_lo, ci_hi) = self.confidence_interval_95(name);
            lines.push(format!(
                "  {:>12}: {:3} wins ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]",
                name,
                self.wins[name],
                self.win_rate(name) * 100.0,
                ci_lo * 100.0,
                ci_hi * 100.0,
            ));
        }
        lines.push(format!("  {:>12}: {}", "Unfinished", self.unfinished));
        lines.push(format!("  Avg rolls per game: {:.1}", self.avg_rolls()));
        if !self.game_durations_ms.is_empty() {
            let avg_ms = self.game_durations_ms.iter().sum::<f64>() / self.game_durations_ms.len() as f64;
            let total_s = self.game_durations_ms.iter().sum::<f64>() / 1000.0;
            lines.push(format!("  Avg game: {:.1}ms  |  Total: {:.1}s", avg_ms, total_s));
        }
        if !self.violations.is_empty() {
            lines.push(format!("  Invariant violations: {}", self.violations.len()));
        }
        lines.join("\n")
    }
}

/// Plays `config.num_games` games in parallel, one seat per strategy.
pub fn run_arena(strategies: &[Box<dyn BotStrategy>], config: &ArenaConfig) -> ArenaResult {
    let num_players = strategies.len();
    let outcomes: Vec<GameOutcome> = (0..config.num_games)
        .into_par_iter()
        .map(|game_idx| {
            let seats: Vec<&dyn BotStrategy> = (0..num_players)
                .map(|i| {
                    let idx = if config.alternate_seats { (i + game_idx) % num_players } else { i };
                    strategies[idx].as_ref()
                })
                .collect();
            play_one_game(&seats, config.base_seed + game_idx as u64, config)
        })
        .collect();

    let mut result = ArenaResult {
        num_games: config.num_games,
        wins: strategies.iter().map(|s| (s.name().to_string(), 0)).collect(),
        ..ArenaResult::default()
    };
    for outcome in outcomes {
        match &outcome.winner {
            Some(name) => *result.wins.entry(name.clone()).or_default() += 1,
            None => result.unfinished += 1,
        }
        result.rolls.push(outcome.rolls);
        result.game_durations_ms.push(outcome.duration_ms);
        result.violations.extend(outcome.violations);
    }
    result
}

/// Plays a single seeded game to completion or to the step limit.
pub fn play_one_game(seats: &[&dyn BotStrategy], seed: u64, config: &ArenaConfig) -> GameOutcome {
    let t0 = Instant::now();
    let mut table = Table::new(seats, seed, config);
    table.play();
    let winner = table
        .state
        .winner
        .as_deref()
        .and_then(|id| table.seat_index(id))
        .map(|i| seats[i].name().to_string());
    GameOutcome {
        winner,
        rolls: table.rolls,
        steps: table.steps,
        violations: table.violations,
        duration_ms: t0.elapsed().as_secs_f64() * 1000.0,
    }
}

struct Table<'a> {
    seats: &'a [&'a dyn BotStrategy],
    config: &'a ArenaConfig,
    game: MonopolyGame,
    state: GameState,
    rng: StdRng,
    rolls: usize,
    steps: usize,
    stalls: usize,
    violations: Vec<String>,
}

impl<'a> Table<'a> {
    fn new(seats: &'a [&'a dyn BotStrategy], seed: u64, config: &'a ArenaConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = GameState::new(&mut rng);
        let game = MonopolyGame::new(config.rules.clone(), Box::new(RandomDice::seeded(seed.wrapping_mul(31).wrapping_add(7))));
        Self {
            seats,
            config,
            game,
            state,
            rng,
            rolls: 0,
            steps: 0,
            stalls: 0,
            violations: Vec::new(),
        }
    }

    fn seat_index(&self, player_id: &str) -> Option<usize> {
        player_id.strip_prefix('p')?.parse().ok()
    }

    fn strategy(&self, player_id: &str) -> Option<&'a dyn BotStrategy> {
        self.seat_index(player_id).and_then(|i| self.seats.get(i).copied())
    }

    fn play(&mut self) {
        for (i, strategy) in self.seats.iter().enumerate() {
            if let Err(e) = self.game.join(&mut self.state, &format!("p{i}"), strategy.name(), None) {
                tracing::warn!(error = %e, "arena seat rejected");
                return;
            }
        }
        if let Err(e) = self.game.apply(&mut self.state, "p0", &GameAction::StartGame) {
            tracing::warn!(error = %e, "arena game did not start");
            return;
        }

        let mut turn_owner = None;
        let mut turn_actions = 0;
        let mut traded = false;

        while !self.state.game_won && self.steps < self.config.max_steps && self.stalls < MAX_STALLS {
            self.steps += 1;
            if self.state.auction.is_some() {
                self.auction_round();
                continue;
            }
            if let Some(trade) = self.state.current_trade.clone() {
                self.answer_trade(&trade.to, &trade);
                continue;
            }

            let Some(player_id) = self.state.current_player_id() else {
                break;
            };
            if turn_owner.as_deref() != Some(player_id.as_str()) {
                turn_owner = Some(player_id.clone());
                turn_actions = 0;
                traded = false;
            }
            turn_actions += 1;

            let Some(strategy) = self.strategy(&player_id) else {
                break;
            };
            let action = if turn_actions > MAX_ACTIONS_PER_TURN {
                self.forced_action()
            } else {
                let seat = Seat {
                    state: &self.state,
                    rules: self.game.rules(),
                    player_id: &player_id,
                    traded_this_turn: traded,
                };
                strategy.choose_action(&seat, &mut self.rng)
            };
            if matches!(action, GameAction::ProposeTrade { .. }) {
                traded = true;
            }
            if !self.step(&player_id, &action) {
                let fallback = self.forced_action();
                self.step(&player_id, &fallback);
            }
        }
    }

    fn forced_action(&self) -> GameAction {
        if self.state.has_rolled || self.state.last_dice.is_some() {
            GameAction::EndTurn
        } else {
            GameAction::RollDice
        }
    }

    /// Applies one action and follows up on any buy prompt it raised.
    fn step(&mut self, player_id: &str, action: &GameAction) -> bool {
        match self.game.apply(&mut self.state, player_id, action) {
            Ok(notices) => {
                self.stalls = 0;
                if *action == GameAction::RollDice {
                    self.rolls += 1;
                }
                self.check();
                for notice in notices {
                    if let Notice::BuyOrAuction {
                        player_id,
                        property_id,
                        price,
                        ..
                    } = notice
                    {
                        self.buy_prompt(&player_id, property_id, price);
                    }
                }
                true
            }
            Err(e) => {
                self.stalls += 1;
                tracing::trace!(player_id, action = action.name(), error = %e, "arena action rejected");
                false
            }
        }
    }

    fn buy_prompt(&mut self, player_id: &str, property_id: u8, price: i64) {
        let Some(strategy) = self.strategy(player_id) else {
            return;
        };
        let seat = Seat {
            state: &self.state,
            rules: self.game.rules(),
            player_id,
            traded_this_turn: false,
        };
        let choice = strategy.on_buy_prompt(&seat, property_id, price, &mut self.rng);
        if self.game.apply(&mut self.state, player_id, &choice).is_err() {
            let auction = GameAction::StartAuction {
                property_id: Some(property_id),
            };
            let _ = self.game.apply(&mut self.state, player_id, &auction);
        }
        self.check();
    }

    /// Offers every solvent player a chance to bid, then lets one second
    /// pass.
    fn auction_round(&mut self) {
        let bidders: Vec<String> = self.state.active_players().map(|p| p.id.clone()).collect();
        for player_id in bidders {
            let (Some(strategy), Some(auction)) = (self.strategy(&player_id), self.state.auction.clone()) else {
                continue;
            };
            let seat = Seat {
                state: &self.state,
                rules: self.game.rules(),
                player_id: &player_id,
                traded_this_turn: false,
            };
            if let Some(amount) = strategy.bid(&seat, &auction, &mut self.rng) {
                let _ = self.game.apply(&mut self.state, &player_id, &GameAction::Bid { amount });
            }
        }
        self.game.auction_tick(&mut self.state);
        self.check();
    }

    fn answer_trade(&mut self, recipient: &str, trade: &TradeProposal) {
        let accept = match self.strategy(recipient) {
            Some(strategy) => {
                let seat = Seat {
                    state: &self.state,
                    rules: self.game.rules(),
                    player_id: recipient,
                    traded_this_turn: false,
                };
                strategy.accept_trade(&seat, trade, &mut self.rng)
            }
            None => false,
        };
        let answer = if accept { GameAction::AcceptTrade } else { GameAction::RejectTrade };
        if self.game.apply(&mut self.state, recipient, &answer).is_err() {
            let _ = self.game.apply(&mut self.state, recipient, &GameAction::RejectTrade);
        }
        self.check();
    }

    fn check(&mut self) {
        if !self.config.check_invariants {
            return;
        }
        for violation in check_invariants(&self.state, self.game.rules()) {
            if self.violations.len() < 20 {
                self.violations.push(violation.to_string());
            }
        }
    }
}
