// Self-play tool: runs full games between copies of the agent on the local arena
//
// Usage:
//   cargo run --release --bin selfplay -- [options]
//
// Options:
//   --games <n>       Number of games (default: 20)
//   --size <WxH>      Board size (default: 20x20)
//   --players <n>     Players per game (default: 2)
//   --walls <n>       Random walls per board (default: 0)
//   --coins <n>       Random coins per board (default: 10)
//   --seed <n>        Seed of the first game; game k uses seed + k (default: 1)
//   --max-turns <n>   Turn cap per game (default: 1000)
//   --turn-ms <n>     Clock given to each decision (default: config turn_time_ms)
//   --log <path>      Write player 0's turns of the first game as a replayable JSONL log
//   --config <path>   Path to Tron.toml (default: Tron.toml)
//
// Set TRON_PROFILE=1 for a per-phase timing report.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process;
use std::time::Instant;

use tron_lookahead::agent::Agent;
use tron_lookahead::arena::Arena;
use tron_lookahead::config::Config;
use tron_lookahead::debug_logger::DebugLogEntry;
use tron_lookahead::simple_profiler;
use tron_lookahead::types::Direction;

struct Settings {
    games: u64,
    width: i32,
    height: i32,
    players: usize,
    walls: usize,
    coins: usize,
    seed: u64,
    max_turns: u32,
    turn_ms: i64,
    log_path: Option<String>,
}

struct GameOutcome {
    seed: u64,
    winner: Option<usize>,
    turns: u32,
    fallbacks: usize,
    log: Vec<DebugLogEntry>,
}

fn print_usage() {
    eprintln!("Light-cycle Self-Play Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  selfplay [--games N] [--size WxH] [--players N] [--walls N] [--coins N]");
    eprintln!("           [--seed N] [--max-turns N] [--turn-ms N] [--log PATH] [--config PATH]");
}

fn parse_size(s: &str) -> Result<(i32, i32), String> {
    let mut parts = s.split('x');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(w), Some(h), None) => {
            let w = w.parse::<i32>().map_err(|e| format!("Invalid width '{}': {}", w, e))?;
            let h = h.parse::<i32>().map_err(|e| format!("Invalid height '{}': {}", h, e))?;
            if w <= 0 || h <= 0 {
                return Err(format!("Board size must be positive, got {}", s));
            }
            Ok((w, h))
        }
        _ => Err(format!("Invalid size '{}'. Expected WxH", s)),
    }
}

fn parse_num<T: std::str::FromStr>(flag: &str, value: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Error: {} expects a number, got '{}'", flag, value);
        process::exit(1);
    })
}

fn play(seed: u64, settings: &Settings, config: &Config, record: bool) -> GameOutcome {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut arena = Arena::random(
        settings.width,
        settings.height,
        settings.players,
        settings.walls,
        settings.coins,
        &mut rng,
    );

    let mut agents: Vec<Agent> = (0..settings.players)
        .map(|i| Agent::new(i, &arena.view(settings.turn_ms), config.clone()))
        .collect();
    let mut fallbacks = 0;
    let mut log = Vec::new();

    while !arena.is_over() && arena.turn() < settings.max_turns {
        let mut moves = vec![Direction::Up; settings.players];
        for (i, agent) in agents.iter_mut().enumerate() {
            if !arena.players()[i].alive {
                continue;
            }
            let carried = agent.state().clone();
            let decision = agent.decide(&arena.view(settings.turn_ms));
            if decision.fallback {
                fallbacks += 1;
            }
            if record && i == 0 {
                log.push(DebugLogEntry::new(
                    arena.to_game_state(&format!("selfplay-{}", seed), 0, settings.turn_ms),
                    carried,
                    decision.direction,
                ));
            }
            moves[i] = decision.direction;
        }
        arena.step(&moves);
    }

    simple_profiler::merge_thread_local();

    GameOutcome {
        seed,
        winner: arena.winner(),
        turns: arena.turn(),
        fallbacks,
        log,
    }
}

fn write_log(path: &str, entries: &[DebugLogEntry]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for entry in entries {
        let line = serde_json::to_string(entry)?;
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(0);
    }

    let mut config_path = "Tron.toml".to_string();
    let mut settings = Settings {
        games: 20,
        width: 20,
        height: 20,
        players: 2,
        walls: 0,
        coins: 10,
        seed: 1,
        max_turns: 1000,
        turn_ms: -1,
        log_path: None,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = match args.get(i + 1) {
            Some(v) => v.clone(),
            None => {
                eprintln!("Error: {} requires an argument", flag);
                print_usage();
                process::exit(1);
            }
        };
        match flag {
            "--games" => settings.games = parse_num(flag, &value),
            "--size" => match parse_size(&value) {
                Ok((w, h)) => {
                    settings.width = w;
                    settings.height = h;
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            },
            "--players" => settings.players = parse_num(flag, &value),
            "--walls" => settings.walls = parse_num(flag, &value),
            "--coins" => settings.coins = parse_num(flag, &value),
            "--seed" => settings.seed = parse_num(flag, &value),
            "--max-turns" => settings.max_turns = parse_num(flag, &value),
            "--turn-ms" => settings.turn_ms = parse_num(flag, &value),
            "--log" => settings.log_path = Some(value),
            "--config" => config_path = value,
            _ => {
                eprintln!("Error: Unknown option '{}'", flag);
                print_usage();
                process::exit(1);
            }
        }
        i += 2;
    }

    if settings.players == 0 || settings.players > 10 {
        eprintln!("Error: --players must be between 1 and 10");
        process::exit(1);
    }
    if settings.players > (settings.width * settings.height) as usize {
        eprintln!("Error: board too small for {} players", settings.players);
        process::exit(1);
    }

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });
    if settings.turn_ms < 0 {
        settings.turn_ms = config.server.turn_time_ms;
    }

    println!(
        "Playing {} game(s) on {}x{} with {} player(s), {} walls, {} coins",
        settings.games, settings.width, settings.height, settings.players, settings.walls, settings.coins
    );

    let started = Instant::now();
    let seeds: Vec<u64> = (0..settings.games).map(|k| settings.seed + k).collect();
    let outcomes: Vec<GameOutcome> = seeds
        .par_iter()
        .map(|&seed| {
            let record = settings.log_path.is_some() && seed == settings.seed;
            play(seed, &settings, &config, record)
        })
        .collect();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let mut wins = vec![0usize; settings.players];
    let mut draws = 0;
    for outcome in &outcomes {
        match outcome.winner {
            Some(w) => wins[w] += 1,
            None => draws += 1,
        }
        println!(
            "seed {:>6}: {:>4} turns, winner {}, {} fallback(s)",
            outcome.seed,
            outcome.turns,
            outcome
                .winner
                .map(|w| w.to_string())
                .unwrap_or_else(|| "-".to_string()),
            outcome.fallbacks
        );
    }

    let total_turns: u32 = outcomes.iter().map(|o| o.turns).sum();
    println!("\n═══════════════════════════════════════════════════════════");
    println!("                   SELF-PLAY SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    for (p, w) in wins.iter().enumerate() {
        println!("Player {} wins:  {}", p, w);
    }
    println!("Draws/capped:   {}", draws);
    if !outcomes.is_empty() {
        println!("Average turns:  {:.1}", total_turns as f64 / outcomes.len() as f64);
    }
    println!("Wall time:      {}ms", elapsed_ms);
    println!("═══════════════════════════════════════════════════════════\n");

    if let Some(path) = &settings.log_path {
        let entries = outcomes
            .iter()
            .find(|o| o.seed == settings.seed)
            .map(|o| o.log.as_slice())
            .unwrap_or(&[]);
        match write_log(path, entries) {
            Ok(()) => println!("Wrote {} log entries to {}", entries.len(), path),
            Err(e) => {
                eprintln!("Error writing log '{}': {}", path, e);
                process::exit(1);
            }
        }
    }

    simple_profiler::merge_thread_local();
    simple_profiler::print_report(elapsed_ms);
}
