// Light-cycle wire types
// Shared by the HTTP server, the debug log and the local arena.
//
// Boards travel as ASCII rows: '.' free, '$' coin, '#' wall, '0'-'9' a
// player's head or trail. Row 0 is the top of the board and y grows downward.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TronError;

/// Game metadata
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Game {
    pub id: String,
    /// Per-turn time allowance advertised by the engine, in milliseconds
    pub timeout: u32,
}

/// A player as reported by the engine
///
/// Eliminated players keep reporting their last position; the agent detects
/// elimination by noticing that the position stopped changing.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub position: Coord,
}

/// Board contents for one turn
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    pub rows: Vec<String>,
    pub players: Vec<Player>,
}

impl Board {
    /// Checks that the rows match the declared dimensions and that every
    /// player sits on the board
    pub fn validate(&self) -> Result<(), TronError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(TronError::MalformedBoard(format!(
                "non-positive dimensions {}x{}",
                self.width, self.height
            )));
        }
        if self.rows.len() != self.height as usize {
            return Err(TronError::MalformedBoard(format!(
                "expected {} rows, got {}",
                self.height,
                self.rows.len()
            )));
        }
        for (y, row) in self.rows.iter().enumerate() {
            if !row.is_ascii() || row.len() != self.width as usize {
                return Err(TronError::MalformedBoard(format!(
                    "row {} must be {} ASCII cells",
                    y, self.width
                )));
            }
        }
        for player in &self.players {
            let p = player.position;
            if p.x < 0 || p.x >= self.width || p.y < 0 || p.y >= self.height {
                return Err(TronError::MalformedBoard(format!(
                    "player '{}' at ({}, {}) is off the board",
                    player.id, p.x, p.y
                )));
            }
        }
        Ok(())
    }

    /// Cell contents at an in-bounds coordinate
    pub fn cell_at(&self, x: i32, y: i32) -> Cell {
        debug_assert!(x >= 0 && x < self.width && y >= 0 && y < self.height);
        Cell::from_char(self.rows[y as usize].as_bytes()[x as usize] as char)
    }
}

/// Complete per-turn request received from the engine
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GameState {
    pub game: Game,
    pub turn: u32,
    pub board: Board,
    /// Index of the player this request is for
    pub you: usize,
    /// Remaining clock for this turn when the request was sent
    #[serde(default)]
    pub remaining_time: Option<i64>,
}

/// 2D coordinate on the board
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }
}

/// What the engine reports for a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Free,
    Coin,
    Wall,
    /// Head or trail of the given player
    Player(usize),
}

impl Cell {
    pub fn from_char(c: char) -> Cell {
        match c {
            '.' => Cell::Free,
            '$' => Cell::Coin,
            d if d.is_ascii_digit() => Cell::Player(d as usize - '0' as usize),
            _ => Cell::Wall,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Cell::Free => '.',
            Cell::Coin => '$',
            Cell::Wall => '#',
            Cell::Player(p) if p < 10 => (b'0' + p as u8) as char,
            Cell::Player(_) => '#',
        }
    }

    /// Free and coin cells can be entered; everything else is a wall
    pub fn is_passable(self) -> bool {
        matches!(self, Cell::Free | Cell::Coin)
    }
}

/// The four moves a light cycle can make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    /// Position of this direction in `Direction::all()`
    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Converts direction to string representation for API response
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Offset applied by this move, y growing downward
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(TronError::InvalidDirection(s.to_string())),
        }
    }
}
