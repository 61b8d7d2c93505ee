// Read-only view of the live game supplied by the engine each turn

use std::time::Instant;

use crate::types::{Cell, Coord, GameState};

/// Everything the decision core reads from the engine
///
/// Board dimensions and player count are fixed for the lifetime of a game.
/// `remaining_time` is read live after the search finishes, so
/// implementations must report the clock at call time.
pub trait WorldView {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn num_players(&self) -> usize;
    fn object_at(&self, x: i32, y: i32) -> Cell;
    fn position_of(&self, player: usize) -> Coord;
    fn turn(&self) -> u32;
    fn remaining_time(&self) -> i64;
}

/// Per-turn countdown in milliseconds
#[derive(Debug, Clone, Copy)]
pub struct TurnClock {
    started: Instant,
    allowance_ms: i64,
}

impl TurnClock {
    pub fn start(allowance_ms: i64) -> Self {
        TurnClock {
            started: Instant::now(),
            allowance_ms,
        }
    }

    pub fn allowance_ms(&self) -> i64 {
        self.allowance_ms
    }

    pub fn remaining(&self) -> i64 {
        self.allowance_ms - self.started.elapsed().as_millis() as i64
    }
}

/// Adapts a wire `GameState` to `WorldView`
pub struct GameStateView<'a> {
    state: &'a GameState,
    clock: TurnClock,
}

impl<'a> GameStateView<'a> {
    pub fn new(state: &'a GameState, clock: TurnClock) -> Self {
        GameStateView { state, clock }
    }
}

impl<'a> WorldView for GameStateView<'a> {
    fn width(&self) -> i32 {
        self.state.board.width
    }

    fn height(&self) -> i32 {
        self.state.board.height
    }

    fn num_players(&self) -> usize {
        self.state.board.players.len()
    }

    fn object_at(&self, x: i32, y: i32) -> Cell {
        self.state.board.cell_at(x, y)
    }

    fn position_of(&self, player: usize) -> Coord {
        self.state.board.players[player].position
    }

    fn turn(&self) -> u32 {
        self.state.turn
    }

    fn remaining_time(&self) -> i64 {
        self.clock.remaining()
    }
}
