// Breadth-first tree growth under a node budget, and the per-turn budget
// adaptation that keeps the search inside the engine's clock.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::BudgetConfig;
use crate::expand::Expander;
use crate::simple_profiler::ProfileGuard;
use crate::tree::Tree;

/// What one call to `grow` did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes popped from the queue and expanded
    pub expansions: usize,
    /// Child nodes materialized, the quantity the budget limits
    pub nodes_created: usize,
    pub budget: usize,
    /// True when the loop stopped on the budget rather than an empty queue
    pub exhausted: bool,
}

/// Expands the tree breadth-first, oldest node first
///
/// A new expansion only starts while fewer than `budget` nodes have been
/// created. The expansion that crosses the budget completes, so every
/// expanded node lists all of its continuations.
pub fn grow(tree: &mut Tree, expander: &Expander<'_>, budget: usize) -> SearchStats {
    let mut stats = SearchStats {
        budget,
        ..SearchStats::default()
    };
    let mut queue = VecDeque::new();
    queue.push_back(tree.root());

    while stats.nodes_created < budget {
        let id = match queue.pop_front() {
            Some(id) => id,
            None => break,
        };

        let children = {
            let _guard = ProfileGuard::new("expand");
            expander.expand(tree.node(id))
        };
        stats.expansions += 1;
        stats.nodes_created += children.len();
        queue.extend(tree.attach(id, children));
    }

    stats.exhausted = stats.nodes_created >= budget;
    debug!(
        "grew tree: {} expansions, {} nodes, {} queued, budget {}",
        stats.expansions,
        stats.nodes_created,
        queue.len(),
        budget
    );
    stats
}

/// Budget for the next turn given how this one went
///
/// Grows when the budget ran out with clock to spare, shrinks when the clock
/// ran low, otherwise stays put. Every change adds `increment` so the budget
/// never reaches zero.
pub fn adapt_budget(
    budget: usize,
    exhausted: bool,
    remaining_time: i64,
    config: &BudgetConfig,
) -> usize {
    if exhausted && remaining_time > config.generous_time {
        config.generous_growth.apply(budget) + config.increment
    } else if exhausted && remaining_time > config.moderate_time {
        config.moderate_growth.apply(budget) + config.increment
    } else if remaining_time < config.scarce_time {
        config.scarce_shrink.apply(budget) + config.increment
    } else {
        budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::grid::{CoinMap, Geometry, Grid};
    use crate::tree::{Children, Node};
    use crate::types::Coord;

    fn duel_tree(geometry: &Geometry) -> Tree {
        let a = Coord::new(1, 1);
        let b = Coord::new(8, 8);
        let mut grid = Grid::new(geometry.width, geometry.height);
        grid.block(a);
        grid.block(b);
        Tree::new(Node::root(grid, vec![Some(a), Some(b)]))
    }

    #[test]
    fn test_adapt_budget_documented_cases() {
        let config = Config::default_hardcoded().budget;
        assert_eq!(adapt_budget(100, true, 95, &config), 151);
        assert_eq!(adapt_budget(100, true, 85, &config), 134);
        assert_eq!(adapt_budget(100, false, 50, &config), 67);
        assert_eq!(adapt_budget(100, false, 70, &config), 100);
    }

    #[test]
    fn test_adapt_budget_thresholds_are_strict() {
        let config = Config::default_hardcoded().budget;
        // 92 is not generous, falls to moderate
        assert_eq!(adapt_budget(100, true, 92, &config), 134);
        // 80 is not moderate and not scarce
        assert_eq!(adapt_budget(100, true, 80, &config), 100);
        // 60 is not scarce
        assert_eq!(adapt_budget(100, false, 60, &config), 100);
        // plenty of time but the budget was never hit
        assert_eq!(adapt_budget(100, false, 99, &config), 100);
        // exhausted and scarce shrinks
        assert_eq!(adapt_budget(100, true, 10, &config), 67);
    }

    #[test]
    fn test_adapt_budget_never_collapses() {
        let config = Config::default_hardcoded().budget;
        let mut budget = 1;
        for _ in 0..20 {
            budget = adapt_budget(budget, false, 0, &config);
            assert!(budget >= 1);
        }
        assert_eq!(adapt_budget(0, false, 0, &config), 1);
        assert_eq!(adapt_budget(1, true, 99, &config), 2);
    }

    #[test]
    fn test_budget_of_one_expands_only_the_root() {
        let g = Geometry::new(10, 10, 2, 0);
        let coins = CoinMap::empty(g);
        let mut tree = duel_tree(&g);
        let stats = grow(&mut tree, &Expander::new(&g, &coins), 1);

        assert_eq!(stats.expansions, 1);
        assert_eq!(stats.nodes_created, 16);
        assert!(stats.exhausted);
        assert_eq!(tree.len(), 17);
    }

    #[test]
    fn test_budget_boundary_is_exact() {
        let g = Geometry::new(10, 10, 2, 0);
        let coins = CoinMap::empty(g);

        // Root creates 16 nodes; a budget of 16 stops right there.
        let mut tree = duel_tree(&g);
        let stats = grow(&mut tree, &Expander::new(&g, &coins), 16);
        assert_eq!(stats.expansions, 1);
        assert!(stats.exhausted);

        // One more allows exactly one more expansion.
        let mut tree = duel_tree(&g);
        let stats = grow(&mut tree, &Expander::new(&g, &coins), 17);
        assert_eq!(stats.expansions, 2);
        assert!(stats.nodes_created >= 17);
    }

    #[test]
    fn test_never_starts_expansion_past_budget() {
        let g = Geometry::new(10, 10, 2, 0);
        let coins = CoinMap::empty(g);
        for budget in 1..200 {
            let mut tree = duel_tree(&g);
            let stats = grow(&mut tree, &Expander::new(&g, &coins), budget);
            // Every expansion but the last began below the budget, and each
            // creates at most 16 nodes.
            assert!(stats.nodes_created < budget + 16, "budget {}", budget);
            assert_eq!(tree.len(), stats.nodes_created + 1);
        }
    }

    #[test]
    fn test_expansion_is_breadth_first() {
        let g = Geometry::new(10, 10, 2, 0);
        let coins = CoinMap::empty(g);
        let mut tree = duel_tree(&g);
        grow(&mut tree, &Expander::new(&g, &coins), 20);

        let root_children = match &tree.node(tree.root()).children {
            Children::Expanded(ids) => ids.clone(),
            other => panic!("root should be expanded, got {:?}", other),
        };
        // Only the oldest child has been expanded so far.
        assert!(matches!(tree.node(root_children[0]).children, Children::Expanded(_)));
        for id in &root_children[1..] {
            assert_eq!(tree.node(*id).children, Children::Unexpanded);
        }
    }

    #[test]
    fn test_small_board_runs_out_of_nodes() {
        // A single player on a 2x1 ring can step left or right onto the same
        // cell, and from there nowhere.
        let g = Geometry::new(2, 1, 1, 0);
        let coins = CoinMap::empty(g);
        let mut grid = Grid::new(2, 1);
        grid.block(Coord::new(0, 0));
        let mut tree = Tree::new(Node::root(grid, vec![Some(Coord::new(0, 0))]));
        let stats = grow(&mut tree, &Expander::new(&g, &coins), 1000);

        assert!(!stats.exhausted);
        assert_eq!(stats.nodes_created, 2);
        assert_eq!(stats.expansions, 3);
        assert_eq!(tree.depth(), 1);
    }
}
