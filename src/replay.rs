// Replay module for analyzing logged turns and debugging decision-making
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Re-run the decision on each logged state with the carried agent state restored
// 3. Compare logged vs replayed moves
// 4. Generate summary reports
//
// A decision depends only on the board and the carried state, so a replay of
// an unmodified build must reproduce every logged move.

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::agent::Agent;
use crate::config::Config;
use crate::debug_logger::DebugLogEntry;
use crate::error::TronError;
use crate::grid::Geometry;
use crate::types::Direction;
use crate::world::{GameStateView, TurnClock};

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: u32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    pub replayed_score: i64,
    pub nodes_created: usize,
    pub fallback: bool,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub fallbacks: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<DebugLogEntry>, TronError> {
        let path = log_path.as_ref().display().to_string();
        let file = File::open(log_path.as_ref()).map_err(|e| TronError::Io {
            path: path.clone(),
            source: e,
        })?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| TronError::Io {
                path: path.clone(),
                source: e,
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: DebugLogEntry =
                serde_json::from_str(&line).map_err(|e| TronError::LogParse {
                    line: line_num + 1,
                    source: e,
                })?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &DebugLogEntry) -> Result<ReplayResult, TronError> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let original_move: Direction = entry.chosen_move.parse()?;
        let state = &entry.state;
        state.board.validate()?;
        if state.you >= state.board.players.len() {
            return Err(TronError::PlayerOutOfRange {
                index: state.you,
                players: state.board.players.len(),
            });
        }

        let clock = TurnClock::start(
            state
                .remaining_time
                .unwrap_or(self.config.server.turn_time_ms),
        );
        let view = GameStateView::new(state, clock);
        let geometry = Geometry::from_world(&view, state.you);

        let start_time = Instant::now();
        let mut agent = Agent::with_state(geometry, self.config.clone(), entry.carried.clone());
        let decision = agent.decide(&view);
        let computation_time = start_time.elapsed().as_millis();

        let matches = original_move == decision.direction;

        let result = ReplayResult {
            turn: entry.turn,
            original_move,
            replayed_move: decision.direction,
            matches,
            replayed_score: decision.score,
            nodes_created: decision.stats.nodes_created,
            fallback: decision.fallback,
            computation_time_ms: computation_time,
        };

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: MATCH - {} (score: {}, nodes: {}, time: {}ms)",
                    entry.turn, decision.direction, decision.score, result.nodes_created, computation_time
                );
            } else {
                warn!(
                    "Turn {}: MISMATCH - Original: {}, Replayed: {} (score: {}, nodes: {}, time: {}ms)",
                    entry.turn,
                    original_move,
                    decision.direction,
                    decision.score,
                    result.nodes_created,
                    computation_time
                );
            }
        }

        Ok(result)
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[DebugLogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                }
            }
        }

        results
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[DebugLogEntry],
        turn_numbers: &[u32],
    ) -> Result<Vec<ReplayResult>, TronError> {
        let mut results = Vec::new();

        for &turn_num in turn_numbers {
            let entry = find_turn(entries, turn_num)?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches: total_turns - matches,
            fallbacks: results.iter().filter(|r| r.fallback).count(),
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("Fallbacks:      {}", stats.fallbacks);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let n = results.len() as f64;
            let avg_time: f64 = results.iter().map(|r| r.computation_time_ms as f64).sum::<f64>() / n;
            let avg_nodes: f64 = results.iter().map(|r| r.nodes_created as f64).sum::<f64>() / n;

            println!("Average Nodes Created:      {:.1}", avg_nodes);
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} (score: {}, nodes: {}, time: {}ms)",
                    result.turn,
                    result.original_move,
                    result.replayed_move,
                    result.replayed_score,
                    result.nodes_created,
                    result.computation_time_ms
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[DebugLogEntry],
        expected_moves: &[(u32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), TronError> {
        for (turn, acceptable) in expected_moves {
            let entry = find_turn(entries, *turn)?;
            let actual_move: Direction = entry.chosen_move.parse()?;

            if !acceptable.contains(&actual_move) {
                return Err(TronError::UnexpectedMove {
                    turn: *turn,
                    expected: acceptable.iter().map(|d| d.as_str().to_string()).collect(),
                    actual: actual_move.as_str().to_string(),
                });
            }
        }

        Ok(())
    }
}

fn find_turn(entries: &[DebugLogEntry], turn: u32) -> Result<&DebugLogEntry, TronError> {
    entries
        .iter()
        .find(|e| e.turn == turn)
        .ok_or(TronError::TurnNotFound(turn))
}
