//! Simulation CLI: headless bot-vs-bot games through the room state machine.
//!
//! Usage:
//!   cargo run --release --bin simulate -- --games 500 --bots investor,random,random,random
//!   cargo run --release --bin simulate -- --games 200 --check-invariants --config monopoly_engine.toml

use std::path::PathBuf;

use clap::Parser;

use monopoly_room_engine::engine::arena::{run_arena, ArenaConfig};
use monopoly_room_engine::engine::bot_strategy::{BotStrategy, InvestorStrategy, RandomStrategy};
use monopoly_room_engine::engine::config::load_config;

#[derive(Parser)]
#[command(name = "simulate", about = "Run bot-vs-bot Monopoly games")]
struct Cli {
    /// Number of games to play
    #[arg(long, default_value = "100")]
    games: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Comma-separated strategies, one per seat: "random" or "investor"
    #[arg(long, value_delimiter = ',', default_value = "investor,random")]
    bots: Vec<String>,

    /// Rotate seats between games
    #[arg(long, default_value = "true")]
    alternate_seats: bool,

    /// Steps before a game counts as unfinished
    #[arg(long, default_value = "20000")]
    max_steps: usize,

    /// Check state invariants after every step
    #[arg(long)]
    check_invariants: bool,

    /// Cash reserve kept by the investor bot
    #[arg(long, default_value = "150")]
    reserve: i64,

    /// Path to monopoly_engine.toml for house rules
    #[arg(long)]
    config: Option<PathBuf>,
}

fn build_strategy(name: &str, reserve: i64) -> Option<Box<dyn BotStrategy>> {
    match name {
        "random" => Some(Box::new(RandomStrategy)),
        "investor" => Some(Box::new(InvestorStrategy { reserve })),
        _ => None,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let rules = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config.rules,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        },
        None => Default::default(),
    };

    if cli.bots.len() < rules.min_players || cli.bots.len() > rules.max_players {
        eprintln!(
            "Need between {} and {} bots, got {}",
            rules.min_players,
            rules.max_players,
            cli.bots.len()
        );
        std::process::exit(1);
    }

    let mut strategies = Vec::with_capacity(cli.bots.len());
    for name in &cli.bots {
        match build_strategy(name.trim(), cli.reserve) {
            Some(strategy) => strategies.push(strategy),
            None => {
                eprintln!("Unknown strategy: {}", name);
                std::process::exit(1);
            }
        }
    }

    eprintln!(
        "Simulating {} games, seed={}, seats=[{}], alternate_seats={}",
        cli.games,
        cli.seed,
        cli.bots.join(", "),
        cli.alternate_seats
    );

    let config = ArenaConfig {
        num_games: cli.games,
        base_seed: cli.seed,
        alternate_seats: cli.alternate_seats,
        max_steps: cli.max_steps,
        check_invariants: cli.check_invariants,
        rules,
    };
    let result = run_arena(&strategies, &config);
    println!("{}", result.summary());

    if !result.violations.is_empty() {
        for violation in result.violations.iter().take(10) {
            eprintln!("  violation: {}", violation);
        }
        std::process::exit(2);
    }
}
