// Local toroidal light-cycle engine
//
// A small authoritative implementation of the game rules, used for self-play,
// for producing debug-log fixtures and for end-to-end tests. It exposes the
// same `WorldView` the remote engine does.

use log::debug;
use rand::Rng;

use crate::types::{Board, Cell, Coord, Direction, Game, GameState, Player};
use crate::world::{TurnClock, WorldView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaPlayer {
    /// Current head, or the last cell held before elimination
    pub position: Coord,
    pub alive: bool,
    pub coins: u32,
}

#[derive(Debug, Clone)]
pub struct Arena {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    players: Vec<ArenaPlayer>,
    turn: u32,
}

impl Arena {
    /// Empty board with players at the given cells
    pub fn new(width: i32, height: i32, starts: &[Coord]) -> Self {
        let mut arena = Arena {
            width,
            height,
            cells: vec![Cell::Free; (width * height) as usize],
            players: Vec::with_capacity(starts.len()),
            turn: 0,
        };
        for (i, &start) in starts.iter().enumerate() {
            arena.set(start, Cell::Player(i));
            arena.players.push(ArenaPlayer {
                position: start,
                alive: true,
                coins: 0,
            });
        }
        arena
    }

    /// Random board: players on distinct free cells, then walls and coins
    pub fn random<R: Rng>(
        width: i32,
        height: i32,
        num_players: usize,
        walls: usize,
        coins: usize,
        rng: &mut R,
    ) -> Self {
        let mut arena = Arena::new(width, height, &[]);
        let mut starts = Vec::with_capacity(num_players);
        while starts.len() < num_players {
            let c = arena.random_free_cell(rng);
            if !starts.contains(&c) {
                starts.push(c);
            }
        }
        arena = Arena::new(width, height, &starts);

        let free = (width * height) as usize - num_players;
        for _ in 0..walls.min(free) {
            let c = arena.random_free_cell(rng);
            arena.set(c, Cell::Wall);
        }
        let free = free - walls.min(free);
        for _ in 0..coins.min(free) {
            let c = arena.random_free_cell(rng);
            arena.set(c, Cell::Coin);
        }
        arena
    }

    fn random_free_cell<R: Rng>(&self, rng: &mut R) -> Coord {
        loop {
            let c = Coord::new(
                rng.random_range(0..self.width),
                rng.random_range(0..self.height),
            );
            if self.cell(c) == Cell::Free {
                return c;
            }
        }
    }

    fn idx(&self, c: Coord) -> usize {
        debug_assert!(c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height);
        (c.y * self.width + c.x) as usize
    }

    pub fn cell(&self, c: Coord) -> Cell {
        self.cells[self.idx(c)]
    }

    fn set(&mut self, c: Coord, cell: Cell) {
        let i = self.idx(c);
        self.cells[i] = cell;
    }

    pub fn place_wall(&mut self, c: Coord) {
        self.set(c, Cell::Wall);
    }

    pub fn place_coin(&mut self, c: Coord) {
        self.set(c, Cell::Coin);
    }

    pub fn players(&self) -> &[ArenaPlayer] {
        &self.players
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    /// The game ends when at most one player is left
    pub fn is_over(&self) -> bool {
        self.alive_count() <= 1
    }

    /// Sole survivor, if the game ended with one
    pub fn winner(&self) -> Option<usize> {
        if self.alive_count() == 1 {
            self.players.iter().position(|p| p.alive)
        } else {
            None
        }
    }

    fn wrap(&self, c: Coord, dir: Direction) -> Coord {
        let (dx, dy) = dir.delta();
        Coord::new(
            (c.x + dx).rem_euclid(self.width),
            (c.y + dy).rem_euclid(self.height),
        )
    }

    /// Applies one simultaneous move for every player
    ///
    /// `moves[i]` is ignored for eliminated players. A player dies when it
    /// enters a wall or trail, or when two players enter the same cell.
    pub fn step(&mut self, moves: &[Direction]) {
        debug_assert_eq!(moves.len(), self.players.len());

        let targets: Vec<Option<Coord>> = self
            .players
            .iter()
            .zip(moves)
            .map(|(p, &dir)| {
                if p.alive {
                    Some(self.wrap(p.position, dir))
                } else {
                    None
                }
            })
            .collect();

        for (i, target) in targets.iter().enumerate() {
            let to = match target {
                Some(to) => *to,
                None => continue,
            };
            let crashed = !self.cell(to).is_passable();
            let collided = targets
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && *other == Some(to));
            if crashed || collided {
                debug!("turn {}: player {} eliminated at {:?}", self.turn, i, to);
                self.players[i].alive = false;
            }
        }

        for (i, target) in targets.iter().enumerate() {
            if !self.players[i].alive {
                continue;
            }
            if let Some(to) = *target {
                if self.cell(to) == Cell::Coin {
                    self.players[i].coins += 1;
                }
                self.set(to, Cell::Player(i));
                self.players[i].position = to;
            }
        }

        self.turn += 1;
    }

    /// World view for one decision with its own turn clock
    pub fn view(&self, turn_time_ms: i64) -> ArenaView<'_> {
        ArenaView {
            arena: self,
            clock: TurnClock::start(turn_time_ms),
        }
    }

    /// Wire form of the current board, as a remote engine would send it
    pub fn to_game_state(&self, game_id: &str, you: usize, turn_time_ms: i64) -> GameState {
        let rows = (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| self.cell(Coord::new(x, y)).to_char())
                    .collect()
            })
            .collect();
        let players = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| Player {
                id: format!("p{}", i),
                name: format!("player {}", i),
                position: p.position,
            })
            .collect();

        GameState {
            game: Game {
                id: game_id.to_string(),
                timeout: turn_time_ms.max(0) as u32,
            },
            turn: self.turn,
            board: Board {
                width: self.width,
                height: self.height,
                rows,
                players,
            },
            you,
            remaining_time: Some(turn_time_ms),
        }
    }
}

pub struct ArenaView<'a> {
    arena: &'a Arena,
    clock: TurnClock,
}

impl<'a> WorldView for ArenaView<'a> {
    fn width(&self) -> i32 {
        self.arena.width
    }

    fn height(&self) -> i32 {
        self.arena.height
    }

    fn num_players(&self) -> usize {
        self.arena.players.len()
    }

    fn object_at(&self, x: i32, y: i32) -> Cell {
        self.arena.cell(Coord::new(x, y))
    }

    fn position_of(&self, player: usize) -> Coord {
        self.arena.players[player].position
    }

    fn turn(&self) -> u32 {
        self.arena.turn
    }

    fn remaining_time(&self) -> i64 {
        self.clock.remaining()
    }
}
