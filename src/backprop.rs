// Worst-case score backup over the grown tree
//
// Opponents are assumed to pick the continuation that hurts us most, so each
// of our directions is worth the minimum over its children; a node is worth
// its best direction. Only the root turns that into a chosen move.

use log::trace;

use crate::config::Config;
use crate::flood_fill;
use crate::grid::Geometry;
use crate::simple_profiler::ProfileGuard;
use crate::tree::{Children, NodeId, Tree};
use crate::types::Direction;

/// Backed-up scores at the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootScores {
    pub score: i64,
    /// Worst-case score per direction, indexed by `Direction::index`;
    /// `None` unless the root was expanded with at least one continuation
    pub by_direction: Option<[i64; 4]>,
    /// Best direction, or `None` when there is nothing to choose from
    pub best: Option<Direction>,
}

pub struct Backprop<'a> {
    geometry: &'a Geometry,
    config: &'a Config,
}

impl<'a> Backprop<'a> {
    pub fn new(geometry: &'a Geometry, config: &'a Config) -> Self {
        Backprop { geometry, config }
    }

    /// Scores the root and picks our direction
    ///
    /// Ties go to the last of Up, Down, Left, Right reaching the maximum.
    pub fn score_root(&self, tree: &Tree) -> RootScores {
        let _guard = ProfileGuard::new("backprop");
        let root = tree.root();

        match self.direction_scores(tree, root) {
            Some(by_direction) => {
                let score = by_direction.iter().copied().max().unwrap_or(self.min_score());
                let best = Direction::all()
                    .iter()
                    .copied()
                    .filter(|d| by_direction[d.index()] == score)
                    .last();
                RootScores {
                    score,
                    by_direction: Some(by_direction),
                    best,
                }
            }
            None => RootScores {
                score: self.score_node(tree, root),
                by_direction: None,
                best: None,
            },
        }
    }

    /// Backed-up value of any node
    pub fn score_node(&self, tree: &Tree, id: NodeId) -> i64 {
        match self.direction_scores(tree, id) {
            Some(by_direction) => by_direction.iter().copied().max().unwrap_or(self.min_score()),
            None => self.leaf_score(tree, id),
        }
    }

    /// Value of a node that has no expanded children to fold
    fn leaf_score(&self, tree: &Tree, id: NodeId) -> i64 {
        let node = tree.node(id);
        if !node.is_alive(self.geometry.me) {
            return self.min_score();
        }
        match node.children {
            Children::Unexpanded => {
                let _guard = ProfileGuard::new("evaluate");
                flood_fill::evaluate(
                    node,
                    self.geometry,
                    &self.config.scores,
                    &self.config.flood_fill,
                )
            }
            // An empty expansion only happens when we had no move.
            Children::Dead | Children::Expanded(_) => self.min_score(),
        }
    }

    /// Minimum child score per direction we took, or `None` when the node is
    /// a leaf or we are already eliminated in it
    fn direction_scores(&self, tree: &Tree, id: NodeId) -> Option<[i64; 4]> {
        let node = tree.node(id);
        if !node.is_alive(self.geometry.me) {
            return None;
        }
        let children = match &node.children {
            Children::Expanded(ids) => ids,
            Children::Unexpanded | Children::Dead => return None,
        };

        let max_score = self.config.scores.max_score;
        let mut by_direction = [max_score; 4];
        for &child in children {
            let score = self.score_node(tree, child) + self.config.scores.survival_bonus;
            let dir = match tree.node(child).agent_move {
                Some(dir) => dir,
                None => {
                    debug_assert!(false, "child without an agent move");
                    continue;
                }
            };
            let slot = &mut by_direction[dir.index()];
            *slot = (*slot).min(score);
        }

        // Directions nobody reached are as bad as dying.
        for score in by_direction.iter_mut() {
            if *score == max_score {
                *score = self.min_score();
            }
        }
        trace!("node {} direction scores {:?}", id.index(), by_direction);
        Some(by_direction)
    }

    fn min_score(&self) -> i64 {
        self.config.scores.min_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::Expander;
    use crate::grid::{CoinMap, Grid};
    use crate::search;
    use crate::tree::Node;
    use crate::types::Coord;

    fn build(
        geometry: &Geometry,
        grid: Grid,
        positions: Vec<Option<Coord>>,
        budget: usize,
    ) -> Tree {
        let coins = CoinMap::empty(*geometry);
        let mut tree = Tree::new(Node::root(grid, positions));
        search::grow(&mut tree, &Expander::new(geometry, &coins), budget);
        tree
    }

    #[test]
    fn test_unexpanded_root_uses_flood_fill() {
        let g = Geometry::new(5, 5, 1, 0);
        let config = Config::default_hardcoded();
        let mut grid = Grid::new(5, 5);
        grid.block(Coord::new(2, 2));
        let tree = Tree::new(Node::root(grid, vec![Some(Coord::new(2, 2))]));

        let root = Backprop::new(&g, &config).score_root(&tree);
        assert_eq!(root.score, 24 * 3);
        assert_eq!(root.best, None);
        assert_eq!(root.by_direction, None);
    }

    #[test]
    fn test_walled_in_root_scores_min_sentinel() {
        let g = Geometry::new(5, 5, 2, 0);
        let config = Config::default_hardcoded();
        let mut grid = Grid::new(5, 5);
        let me = Coord::new(2, 2);
        grid.block(me);
        for dir in Direction::all().iter() {
            grid.block(g.step(me, *dir));
        }
        grid.block(Coord::new(0, 0));
        let tree = build(&g, grid, vec![Some(me), Some(Coord::new(0, 0))], 10);

        assert_eq!(tree.node(tree.root()).children, Children::Dead);
        let root = Backprop::new(&g, &config).score_root(&tree);
        assert_eq!(root.score, config.scores.min_score);
        assert_eq!(root.best, None);
    }

    #[test]
    fn test_eliminated_agent_scores_min_sentinel() {
        let g = Geometry::new(5, 5, 2, 0);
        let config = Config::default_hardcoded();
        let tree = Tree::new(Node::root(Grid::new(5, 5), vec![None, Some(Coord::new(1, 1))]));
        let root = Backprop::new(&g, &config).score_root(&tree);
        assert_eq!(root.score, config.scores.min_score);
        assert_eq!(root.best, None);
    }

    #[test]
    fn test_blocked_directions_default_to_min_sentinel() {
        let g = Geometry::new(6, 6, 1, 0);
        let config = Config::default_hardcoded();
        let me = Coord::new(2, 2);
        let mut grid = Grid::new(6, 6);
        grid.block(me);
        grid.block(Coord::new(2, 1)); // up
        grid.block(Coord::new(1, 2)); // left
        let tree = build(&g, grid, vec![Some(me)], 1);

        let root = Backprop::new(&g, &config).score_root(&tree);
        let by_dir = root.by_direction.unwrap();
        assert_eq!(by_dir[Direction::Up.index()], config.scores.min_score);
        assert_eq!(by_dir[Direction::Left.index()], config.scores.min_score);
        assert!(by_dir[Direction::Down.index()] > 0);
        assert!(by_dir[Direction::Right.index()] > 0);
        assert!(matches!(root.best, Some(Direction::Down) | Some(Direction::Right)));
    }

    #[test]
    fn test_ties_go_to_last_direction() {
        // Open single-player torus: every direction scores the same.
        let g = Geometry::new(7, 7, 1, 0);
        let config = Config::default_hardcoded();
        let me = Coord::new(3, 3);
        let mut grid = Grid::new(7, 7);
        grid.block(me);
        let tree = build(&g, grid, vec![Some(me)], 1);

        let root = Backprop::new(&g, &config).score_root(&tree);
        let by_dir = root.by_direction.unwrap();
        assert!(by_dir.iter().all(|&s| s == by_dir[0]));
        assert_eq!(root.best, Some(Direction::Right));
        // 47 free cells left after one step, plus the survival bonus
        assert_eq!(root.score, 47 * 3 + config.scores.survival_bonus);
    }

    #[test]
    fn test_prefers_open_side_over_dead_end() {
        // Corridor 1 cell wide to the left, open field to the right.
        let g = Geometry::new(9, 5, 1, 0);
        let config = Config::default_hardcoded();
        let me = Coord::new(2, 2);
        let mut grid = Grid::new(9, 5);
        grid.block(me);
        for x in 0..3 {
            grid.block(Coord::new(x, 1));
            grid.block(Coord::new(x, 3));
        }
        grid.block(Coord::new(8, 2));
        grid.block(Coord::new(8, 1));
        grid.block(Coord::new(8, 3));
        let tree = build(&g, grid, vec![Some(me)], 200);

        let root = Backprop::new(&g, &config).score_root(&tree);
        let by_dir = root.by_direction.unwrap();
        assert!(by_dir[Direction::Right.index()] > by_dir[Direction::Left.index()]);
        assert_eq!(root.best, Some(Direction::Right));
    }

    #[test]
    fn test_opponent_worst_case_is_used() {
        // Opponent one gap away: moving into the gap risks a head-on crash.
        let g = Geometry::new(9, 9, 2, 0);
        let config = Config::default_hardcoded();
        let me = Coord::new(3, 4);
        let them = Coord::new(5, 4);
        let mut grid = Grid::new(9, 9);
        grid.block(me);
        grid.block(them);
        let tree = build(&g, grid, vec![Some(me), Some(them)], 1);

        let root = Backprop::new(&g, &config).score_root(&tree);
        let by_dir = root.by_direction.unwrap();
        assert_eq!(
            by_dir[Direction::Right.index()],
            config.scores.min_score + config.scores.survival_bonus
        );
        assert_ne!(root.best, Some(Direction::Right));
    }
}
