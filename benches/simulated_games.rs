//! Criterion benchmarks for whole headless games and the per-action
//! state copy.
//!
//! Run with:
//!     cargo bench --bench simulated_games

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use monopoly_room_engine::engine::arena::{play_one_game, ArenaConfig};
use monopoly_room_engine::engine::bot_strategy::{BotStrategy, InvestorStrategy, RandomStrategy};
use monopoly_room_engine::games::monopoly::invariants::check_invariants;
use monopoly_room_engine::games::monopoly::rules::Rules;

fn bench_full_game(c: &mut Criterion) {
    let investor = InvestorStrategy::default();
    let random = RandomStrategy;
    let matchups: [(&str, Vec<&dyn BotStrategy>); 3] = [
        ("investor_vs_random", vec![&investor, &random]),
        ("four_investors", vec![&investor, &investor, &investor, &investor]),
        ("four_random", vec![&random, &random, &random, &random]),
    ];
    let config = ArenaConfig::default();

    let mut group = c.benchmark_group("full_game");
    group.sample_size(20);

    for (label, seats) in &matchups {
        group.bench_with_input(BenchmarkId::new("play_one_game", label), seats, |b, seats| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                play_one_game(seats, seed, &config)
            });
        });
    }

    group.finish();
}

/// A mid-game state, taken from a seeded game cut short.
fn mid_game_state() -> monopoly_room_engine::games::monopoly::types::GameState {
    use monopoly_room_engine::games::monopoly::actions::GameAction;
    use monopoly_room_engine::games::monopoly::dice::RandomDice;
    use monopoly_room_engine::games::monopoly::machine::MonopolyGame;
    use monopoly_room_engine::games::monopoly::types::GameState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut game = MonopolyGame::new(Rules::default(), Box::new(RandomDice::seeded(8)));
    let mut state = GameState::new(&mut StdRng::seed_from_u64(8));
    for id in ["a", "b", "c", "d"] {
        let _ = game.join(&mut state, id, id, None);
    }
    let _ = game.apply(&mut state, "a", &GameAction::StartGame);
    for _ in 0..120 {
        let Some(current) = state.current_player_id() else {
            break;
        };
        let action = if state.has_rolled {
            GameAction::EndTurn
        } else {
            GameAction::RollDice
        };
        if game.apply(&mut state, &current, &action).is_err() {
            let _ = game.apply(&mut state, &current, &GameAction::BuyProperty { property_id: None });
            let _ = game.apply(&mut state, &current, &GameAction::EndTurn);
        }
    }
    state
}

fn bench_state_clone(c: &mut Criterion) {
    let state = mid_game_state();
    c.bench_function("state_clone", |b| b.iter(|| state.clone()));
}

fn bench_check_invariants(c: &mut Criterion) {
    let state = mid_game_state();
    let rules = Rules::default();
    c.bench_function("check_invariants", |b| b.iter(|| check_invariants(&state, &rules)));
}

criterion_group!(benches, bench_full_game, bench_state_clone, bench_check_invariants);
criterion_main!(benches);
