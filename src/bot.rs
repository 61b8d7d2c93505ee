// Remote-player bot
//
// Holds one `Agent` per running game and maps the HTTP endpoints onto them.
// The search is CPU-bound, so each move runs on a blocking task. Each agent
// sits behind its own lock, so requests for one game are decided one at a
// time while other games proceed.

use log::{error, info, warn};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::{Agent, AgentState};
use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::error::TronError;
use crate::grid::Geometry;
use crate::types::{Direction, GameState};
use crate::world::{GameStateView, TurnClock};

type AgentSlot = Arc<Mutex<Agent>>;

pub struct Bot {
    config: Config,
    games: Mutex<HashMap<String, AgentSlot>>,
    logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration
    pub fn new(config: Config) -> Self {
        Self::with_logger(config, DebugLogger::disabled())
    }

    pub fn with_logger(config: Config, logger: DebugLogger) -> Self {
        Bot {
            config,
            games: Mutex::new(HashMap::new()),
            logger,
        }
    }

    /// Returns bot metadata
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "tron-lookahead",
            "color": "#00DEAD",
            "version": env!("CARGO_PKG_VERSION"),
        })
    }

    /// Number of games with a live agent
    pub fn active_games(&self) -> usize {
        self.games.lock().len()
    }

    /// Carried state of a game's agent; waits for an in-flight move
    pub fn agent_state(&self, game_id: &str) -> Option<AgentState> {
        let slot = self.games.lock().get(game_id).cloned()?;
        let state = slot.lock().state().clone();
        Some(state)
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, state: &GameState) {
        info!("GAME START {} as player {}", state.game.id, state.you);
        match check_request(state) {
            Ok(()) => {
                let agent = self.fresh_agent(state);
                self.games
                    .lock()
                    .insert(state.game.id.clone(), Arc::new(Mutex::new(agent)));
            }
            Err(e) => warn!("Game {}: refusing start request: {}", state.game.id, e),
        }
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, state: &GameState) {
        self.games.lock().remove(&state.game.id);
        info!("GAME OVER {}", state.game.id);
    }

    /// Computes and returns the next move
    /// Corresponds to POST /move endpoint
    ///
    /// A request that does not fit its game is answered with the agent's
    /// previous direction and leaves the agent untouched.
    pub async fn get_move(&self, state: &GameState) -> Value {
        let clock = TurnClock::start(
            state
                .remaining_time
                .unwrap_or(self.config.server.turn_time_ms),
        );
        let checked = check_request(state);

        let slot = {
            let mut games = self.games.lock();
            match games.get(&state.game.id) {
                Some(slot) => Some(slot.clone()),
                None if checked.is_ok() => {
                    let slot = Arc::new(Mutex::new(self.fresh_agent(state)));
                    games.insert(state.game.id.clone(), slot.clone());
                    Some(slot)
                }
                None => None,
            }
        };
        let slot = match (slot, &checked) {
            (Some(slot), _) => slot,
            (None, Err(e)) => {
                warn!("Game {}: malformed move request, answering up: {}", state.game.id, e);
                return json!({ "move": Direction::Up.as_str() });
            }
            (None, Ok(())) => return json!({ "move": Direction::Up.as_str() }),
        };

        let request = state.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut agent = slot.lock();
            if let Err(e) = checked.and_then(|()| check_geometry(agent.geometry(), &request)) {
                return Err((e, agent.state().prev_direction));
            }
            let carried = agent.state().clone();
            let decision = agent.decide(&GameStateView::new(&request, clock));
            Ok((request, carried, decision.direction))
        })
        .await;

        match outcome {
            Ok(Ok((request, carried, direction))) => {
                self.logger.log_move(request, carried, direction);
                json!({ "move": direction.as_str() })
            }
            Ok(Err((e, previous))) => {
                warn!(
                    "Game {} turn {}: rejected request, repeating {}: {}",
                    state.game.id, state.turn, previous, e
                );
                json!({ "move": previous.as_str() })
            }
            Err(e) => {
                error!("Game {}: search task failed: {}", state.game.id, e);
                json!({ "move": Direction::Up.as_str() })
            }
        }
    }

    /// Agent for a request that already passed `check_request`
    fn fresh_agent(&self, state: &GameState) -> Agent {
        let view = GameStateView::new(state, TurnClock::start(self.config.server.turn_time_ms));
        Agent::new(state.you, &view, self.config.clone())
    }
}

/// Board well-formed and `you` names one of its players
fn check_request(state: &GameState) -> Result<(), TronError> {
    state.board.validate()?;
    if state.you >= state.board.players.len() {
        return Err(TronError::PlayerOutOfRange {
            index: state.you,
            players: state.board.players.len(),
        });
    }
    Ok(())
}

/// Board size, player count and seat must not change during a game
fn check_geometry(geometry: &Geometry, state: &GameState) -> Result<(), TronError> {
    let board = &state.board;
    if board.width != geometry.width || board.height != geometry.height {
        return Err(TronError::GameMismatch(format!(
            "board is {}x{}, game started on {}x{}",
            board.width, board.height, geometry.width, geometry.height
        )));
    }
    if board.players.len() != geometry.num_players {
        return Err(TronError::GameMismatch(format!(
            "{} players, game started with {}",
            board.players.len(),
            geometry.num_players
        )));
    }
    if state.you != geometry.me {
        return Err(TronError::GameMismatch(format!(
            "seat {}, game started as {}",
            state.you, geometry.me
        )));
    }
    Ok(())
}
