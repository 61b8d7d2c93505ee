// Joint-move expansion
//
// Players move in index order. Each surviving candidate of player `i`
// recurses into player `i + 1` with its own copy of the partial joint move,
// so sibling branches never share positions, grids or coin counts.

use log::trace;

use crate::grid::{CoinMap, Geometry, Grid};
use crate::tree::{Children, Node, Positions};
use crate::types::{Coord, Direction};

/// Candidate order within one player's fan-out
const EXPANSION_ORDER: [Direction; 4] = [
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Down,
];

/// A joint move that has been decided for players `0..i`
#[derive(Debug, Clone)]
struct Partial {
    grid: Grid,
    positions: Positions,
    coins: u32,
    agent_move: Option<Direction>,
}

impl Partial {
    fn into_node(self) -> Node {
        Node {
            grid: self.grid,
            positions: self.positions,
            coins: self.coins,
            agent_move: self.agent_move,
            children: Children::Unexpanded,
        }
    }
}

/// Generates the children of a node one virtual turn ahead
pub struct Expander<'a> {
    geometry: &'a Geometry,
    coins: &'a CoinMap,
}

impl<'a> Expander<'a> {
    pub fn new(geometry: &'a Geometry, coins: &'a CoinMap) -> Self {
        Expander { geometry, coins }
    }

    /// Every distinct joint continuation of `parent`
    ///
    /// An empty result means our agent has no move that keeps the line going.
    pub fn expand(&self, parent: &Node) -> Vec<Node> {
        let mut out = Vec::new();
        let start = Partial {
            grid: parent.grid.clone(),
            positions: parent.positions.clone(),
            coins: parent.coins,
            agent_move: None,
        };
        self.advance(parent, start, 0, &mut out);
        trace!("expanded node into {} children", out.len());
        out
    }

    fn advance(&self, parent: &Node, partial: Partial, player: usize, out: &mut Vec<Node>) {
        if player >= self.geometry.num_players {
            out.push(partial.into_node());
            return;
        }

        let mut survived = false;
        if let Some(from) = parent.positions[player] {
            for &dir in EXPANSION_ORDER.iter() {
                if let Some(next) = self.try_move(&partial, player, from, dir) {
                    self.advance(parent, next, player + 1, out);
                    survived = true;
                }
            }
        }

        // An opponent with no way out is simply gone; we keep searching
        // because its death matters. Our own death ends the line.
        if !survived && player != self.geometry.me {
            let mut partial = partial;
            partial.positions[player] = None;
            self.advance(parent, partial, player + 1, out);
        }
    }

    /// Moves `player` from `from` one step in `dir`
    ///
    /// Returns `None` when the destination is a wall. Moving into the cell a
    /// lower-index player just entered this round is a head-on collision:
    /// both players are eliminated and the continuation survives.
    fn try_move(
        &self,
        partial: &Partial,
        player: usize,
        from: Coord,
        dir: Direction,
    ) -> Option<Partial> {
        let to = self.geometry.step(from, dir);
        let is_me = player == self.geometry.me;

        if partial.grid.is_blocked(to) {
            let victim = (0..player).find(|&i| partial.positions[i] == Some(to))?;
            let mut next = partial.clone();
            next.positions[victim] = None;
            next.positions[player] = None;
            if is_me {
                next.agent_move = Some(dir);
            }
            return Some(next);
        }

        let mut next = partial.clone();
        next.grid.block(to);
        next.positions[player] = Some(to);
        if is_me {
            next.agent_move = Some(dir);
            if self.coins.has_coin(to) {
                next.coins += 1;
            }
        }
        Some(next)
    }
}
