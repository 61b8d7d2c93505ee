// Territory evaluation by simultaneous flood fill
//
// Every live player floods outward at unit speed from its head. A cell goes
// to whoever reaches it first; a cell touched on its flank by a
// higher-numbered owner is treated as reached at the same time and becomes
// a dead zone that nobody scores.

use std::collections::VecDeque;

use crate::config::{FloodFillConfig, ScoresConfig};
use crate::grid::{Geometry, Grid};
use crate::tree::Node;
use crate::types::Coord;

const BLOCKED: i32 = -1;
const EMPTY: i32 = 0;
const CONTESTED: i32 = -2;

/// Outcome of one flood fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Territory {
    /// Exclusively claimed cells per player, excluding the head
    pub scores: Vec<i64>,
    pub contested: usize,
    /// Frontier cells processed, at most the configured limit
    pub iterations: usize,
}

/// Floods the board from every live player's position
pub fn territory(
    grid: &Grid,
    positions: &[Option<Coord>],
    geometry: &Geometry,
    iteration_limit: usize,
) -> Territory {
    // Work cells hold BLOCKED, EMPTY, CONTESTED or an owner tag (player + 1).
    let mut work: Vec<i32> = Vec::with_capacity(geometry.cells());
    for y in 0..geometry.height {
        for x in 0..geometry.width {
            work.push(if grid.is_blocked(Coord { x, y }) { BLOCKED } else { EMPTY });
        }
    }

    let mut frontier = VecDeque::with_capacity(geometry.cells());
    for (p, pos) in positions.iter().enumerate() {
        if let Some(c) = pos {
            work[geometry.index(*c)] = p as i32 + 1;
            frontier.push_back(*c);
        }
    }

    let mut scores = vec![0i64; positions.len()];
    let mut contested = 0;
    let mut iterations = 0;

    while iterations < iteration_limit {
        let c = match frontier.pop_front() {
            Some(c) => c,
            None => break,
        };
        iterations += 1;

        let tag = work[geometry.index(c)];
        let right = (c.x + 1).rem_euclid(geometry.width);
        let left = (c.x - 1).rem_euclid(geometry.width);
        let down = (c.y + 1).rem_euclid(geometry.height);
        let up = (c.y - 1).rem_euclid(geometry.height);

        // Each target is checked against the two cells flanking it,
        // perpendicular to the direction of travel.
        let targets = [
            (Coord::new(right, c.y), Coord::new(right, down), Coord::new(right, up)),
            (Coord::new(left, c.y), Coord::new(left, down), Coord::new(left, up)),
            (Coord::new(c.x, down), Coord::new(right, down), Coord::new(left, down)),
            (Coord::new(c.x, up), Coord::new(right, up), Coord::new(left, up)),
        ];

        for &(target, flank_a, flank_b) in targets.iter() {
            let t = geometry.index(target);
            if work[t] != EMPTY {
                continue;
            }
            if work[geometry.index(flank_a)] > tag || work[geometry.index(flank_b)] > tag {
                work[t] = CONTESTED;
                contested += 1;
            } else {
                work[t] = tag;
                scores[(tag - 1) as usize] += 1;
                frontier.push_back(target);
            }
        }
    }

    Territory {
        scores,
        contested,
        iterations,
    }
}

/// Static score of a node from our agent's point of view
///
/// `own * (players + extra) - last_enemy - weight * best_enemy + coins * coin_weight`.
/// `last_enemy` is the territory of the highest-indexed opponent rather than
/// a sum over all opponents.
pub fn evaluate(
    node: &Node,
    geometry: &Geometry,
    scores: &ScoresConfig,
    flood: &FloodFillConfig,
) -> i64 {
    let t = territory(&node.grid, &node.positions, geometry, flood.iteration_limit);

    let own = t.scores[geometry.me];
    let mut last_enemy = 0;
    let mut best_enemy = 0;
    for (p, &score) in t.scores.iter().enumerate() {
        if p == geometry.me {
            continue;
        }
        last_enemy = score;
        best_enemy = best_enemy.max(score);
    }

    own * (geometry.num_players as i64 + scores.self_weight_extra)
        - last_enemy
        - best_enemy * scores.max_enemy_weight
        + node.coins as i64 * scores.coin_weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn positioned(geometry: &Geometry, players: &[Option<Coord>]) -> (Grid, Vec<Option<Coord>>) {
        let mut grid = Grid::new(geometry.width, geometry.height);
        for p in players.iter().flatten() {
            grid.block(*p);
        }
        (grid, players.to_vec())
    }

    #[test]
    fn test_single_player_owns_whole_empty_board() {
        let g = Geometry::new(10, 10, 1, 0);
        for y in 0..10 {
            for x in 0..10 {
                let (grid, pos) = positioned(&g, &[Some(Coord::new(x, y))]);
                let t = territory(&grid, &pos, &g, 2000);
                assert_eq!(t.scores[0], 99, "player at ({}, {})", x, y);
                assert_eq!(t.contested, 0);
            }
        }
    }

    #[test]
    fn test_unblocked_head_cell_is_still_the_seed() {
        let g = Geometry::new(6, 4, 1, 0);
        let grid = Grid::new(6, 4);
        let t = territory(&grid, &[Some(Coord::new(2, 1))], &g, 2000);
        assert_eq!(t.scores[0], 23);
    }

    #[test]
    fn test_walls_cut_off_territory() {
        // Vertical walls at x=2 and x=5 on a 6-wide torus split off a strip.
        let g = Geometry::new(6, 6, 1, 0);
        let (mut grid, pos) = positioned(&g, &[Some(Coord::new(0, 0))]);
        for y in 0..6 {
            grid.block(Coord::new(2, y));
            grid.block(Coord::new(5, y));
        }
        let t = territory(&grid, &pos, &g, 2000);
        // Columns 0 and 1 only, minus the head
        assert_eq!(t.scores[0], 11);
    }

    #[test]
    fn test_symmetric_players_partition_is_deterministic() {
        let g = Geometry::new(5, 5, 2, 0);
        let (grid, pos) = positioned(&g, &[Some(Coord::new(0, 0)), Some(Coord::new(2, 2))]);

        let first = territory(&grid, &pos, &g, 2000);
        for _ in 0..10 {
            assert_eq!(territory(&grid, &pos, &g, 2000), first);
        }

        let claimed: i64 = first.scores.iter().sum();
        assert!(claimed as usize + first.contested <= 25 - 2);
        assert!(first.scores.iter().all(|&s| s > 0));
    }

    #[test]
    fn test_contested_cells_appear_between_rivals() {
        let g = Geometry::new(9, 9, 2, 0);
        let (grid, pos) = positioned(&g, &[Some(Coord::new(2, 4)), Some(Coord::new(6, 4))]);
        let t = territory(&grid, &pos, &g, 2000);
        assert!(t.contested > 0);
        assert!(t.scores.iter().sum::<i64>() as usize + t.contested <= 81 - 2);
    }

    #[test]
    fn test_eliminated_players_do_not_flood() {
        let g = Geometry::new(4, 4, 2, 0);
        let (grid, pos) = positioned(&g, &[Some(Coord::new(0, 0)), None]);
        let t = territory(&grid, &pos, &g, 2000);
        assert_eq!(t.scores, vec![15, 0]);
    }

    #[test]
    fn test_iteration_limit_caps_work() {
        let g = Geometry::new(20, 20, 1, 0);
        let (grid, pos) = positioned(&g, &[Some(Coord::new(10, 10))]);
        let t = territory(&grid, &pos, &g, 5);
        assert_eq!(t.iterations, 5);
        assert!(t.scores[0] < 399);
    }

    #[test]
    fn test_evaluate_formula_uses_last_enemy_not_sum() {
        // Three players, each sealed into its own pocket so territory is exact.
        let g = Geometry::new(12, 3, 3, 0);
        let mut grid = Grid::new(12, 3);
        for y in 0..3 {
            grid.block(Coord::new(3, y));
            grid.block(Coord::new(7, y));
            grid.block(Coord::new(11, y));
        }
        let positions = vec![
            Some(Coord::new(0, 1)),
            Some(Coord::new(4, 1)),
            Some(Coord::new(8, 1)),
        ];
        for p in positions.iter().flatten() {
            grid.block(*p);
        }
        let mut node = Node::root(grid, positions);
        node.coins = 2;

        let config = Config::default_hardcoded();
        let t = territory(&node.grid, &node.positions, &g, 2000);
        // Pockets: 3x3 for player 0, 3x3 for player 1, 3x3 for player 2
        assert_eq!(t.scores, vec![8, 8, 8]);

        let score = evaluate(&node, &g, &config.scores, &config.flood_fill);
        // 8 * (3 + 2) - 8 (last enemy only) - 2 * 8 + 2 * 10
        assert_eq!(score, 40 - 8 - 16 + 20);
    }

    #[test]
    fn test_evaluate_dead_enemy_scores_zero() {
        let g = Geometry::new(5, 5, 2, 0);
        let (grid, pos) = positioned(&g, &[Some(Coord::new(2, 2)), None]);
        let node = Node::root(grid, pos);
        let config = Config::default_hardcoded();
        assert_eq!(evaluate(&node, &g, &config.scores, &config.flood_fill), 24 * 4);
    }
}
