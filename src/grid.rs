// Toroidal board geometry and the per-node occupancy snapshot

use std::fmt;

use crate::types::{Cell, Coord, Direction};
use crate::world::WorldView;

/// Fixed facts about one game, shared read-only by every search component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: i32,
    pub height: i32,
    pub num_players: usize,
    /// Index of the player we are deciding for
    pub me: usize,
}

impl Geometry {
    pub fn new(width: i32, height: i32, num_players: usize, me: usize) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert!(me < num_players);
        Geometry {
            width,
            height,
            num_players,
            me,
        }
    }

    pub fn from_world<W: WorldView>(world: &W, me: usize) -> Self {
        Self::new(world.width(), world.height(), world.num_players(), me)
    }

    pub fn cells(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Wraps any coordinate onto the torus
    #[inline]
    pub fn normalize(&self, x: i32, y: i32) -> Coord {
        Coord {
            x: x.rem_euclid(self.width),
            y: y.rem_euclid(self.height),
        }
    }

    /// Neighbour of `from` one step in `dir`, wrapped
    #[inline]
    pub fn step(&self, from: Coord, dir: Direction) -> Coord {
        let (dx, dy) = dir.delta();
        self.normalize(from.x + dx, from.y + dy)
    }

    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height
    }

    #[inline]
    pub fn index(&self, c: Coord) -> usize {
        debug_assert!(self.contains(c), "coordinate {:?} off the board", c);
        (c.y as usize) * (self.width as usize) + c.x as usize
    }
}

/// Occupancy bitmap: a set bit means the cell can't be entered
///
/// Each tree node owns its own `Grid`. Children clone the parent's grid and
/// only ever add blocked cells, so walls are monotonic down the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    bits: Vec<u64>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let cells = (width as usize) * (height as usize);
        Grid {
            width,
            height,
            bits: vec![0; (cells + 63) / 64],
        }
    }

    /// Every world cell that is neither free nor a coin becomes blocked
    pub fn from_world<W: WorldView>(world: &W) -> Self {
        let mut grid = Grid::new(world.width(), world.height());
        for y in 0..world.height() {
            for x in 0..world.width() {
                if !world.object_at(x, y).is_passable() {
                    grid.block(Coord { x, y });
                }
            }
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn slot(&self, c: Coord) -> (usize, u64) {
        debug_assert!(
            c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height,
            "coordinate {:?} off a {}x{} grid",
            c,
            self.width,
            self.height
        );
        let i = (c.y as usize) * (self.width as usize) + c.x as usize;
        (i / 64, 1u64 << (i % 64))
    }

    #[inline]
    pub fn is_blocked(&self, c: Coord) -> bool {
        let (word, mask) = self.slot(c);
        self.bits[word] & mask != 0
    }

    #[inline]
    pub fn block(&mut self, c: Coord) {
        let (word, mask) = self.slot(c);
        self.bits[word] |= mask;
    }

    pub fn blocked_count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = if self.is_blocked(Coord { x, y }) { '@' } else { '.' };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Coin locations at the root of the search
///
/// Coins are read once per turn; a cell keeps counting as a coin for the
/// whole tree, which is harmless because a collected cell is blocked.
#[derive(Debug, Clone)]
pub struct CoinMap {
    geometry: Geometry,
    coins: Vec<bool>,
}

impl CoinMap {
    pub fn from_world<W: WorldView>(world: &W, geometry: Geometry) -> Self {
        let mut coins = vec![false; geometry.cells()];
        for y in 0..geometry.height {
            for x in 0..geometry.width {
                if world.object_at(x, y) == Cell::Coin {
                    coins[geometry.index(Coord { x, y })] = true;
                }
            }
        }
        CoinMap { geometry, coins }
    }

    pub fn empty(geometry: Geometry) -> Self {
        CoinMap {
            geometry,
            coins: vec![false; geometry.cells()],
        }
    }

    pub fn insert(&mut self, c: Coord) {
        let i = self.geometry.index(c);
        self.coins[i] = true;
    }

    #[inline]
    pub fn has_coin(&self, c: Coord) -> bool {
        self.coins[self.geometry.index(c)]
    }

    pub fn len(&self) -> usize {
        self.coins.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
