// Per-game decision maker
//
// One `Agent` exists per game we play. Between turns it carries only the
// node budget, the previous turn's positions (to notice eliminated players)
// and the last direction it returned (fallback when nothing is playable).

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::backprop::Backprop;
use crate::config::Config;
use crate::expand::Expander;
use crate::grid::{CoinMap, Geometry, Grid};
use crate::search::{self, SearchStats};
use crate::tree::{Node, Positions, Tree};
use crate::types::Direction;
use crate::world::WorldView;

/// State carried from one turn to the next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub budget: usize,
    pub prev_positions: Option<Positions>,
    pub prev_direction: Direction,
}

/// Result of one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub direction: Direction,
    pub score: i64,
    pub by_direction: Option<[i64; 4]>,
    pub stats: SearchStats,
    /// Longest expanded line below the root, in plies
    pub depth: usize,
    /// Players still alive at the root
    pub survivors: usize,
    /// True when no continuation was playable and the previous direction
    /// was repeated
    pub fallback: bool,
    pub next_budget: usize,
}

pub struct Agent {
    geometry: Geometry,
    config: Config,
    state: AgentState,
}

impl Agent {
    /// Creates the agent for player `me` at the start of a game
    pub fn new<W: WorldView>(me: usize, world: &W, config: Config) -> Self {
        let geometry = Geometry::from_world(world, me);
        let budget = config.search.initial_budget(geometry.cells());
        info!(
            "Agent {} on {}x{} board with {} players, initial budget {}",
            me,
            geometry.width,
            geometry.height,
            geometry.num_players,
            budget
        );
        Agent {
            geometry,
            config,
            state: AgentState {
                budget,
                prev_positions: None,
                prev_direction: Direction::Up,
            },
        }
    }

    /// Restores an agent mid-game, e.g. when replaying a logged turn
    pub fn with_state(geometry: Geometry, config: Config, state: AgentState) -> Self {
        Agent {
            geometry,
            config,
            state,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn budget(&self) -> usize {
        self.state.budget
    }

    /// Picks this turn's direction and updates the carried state
    pub fn decide<W: WorldView>(&mut self, world: &W) -> Decision {
        let started = Instant::now();
        let (root, survivors) = self.root_node(world);
        let coins = CoinMap::from_world(world, self.geometry);

        let mut tree = Tree::new(root);
        let stats = search::grow(
            &mut tree,
            &Expander::new(&self.geometry, &coins),
            self.state.budget,
        );
        let scores = Backprop::new(&self.geometry, &self.config).score_root(&tree);

        let (direction, fallback) = match scores.best {
            Some(dir) => (dir, false),
            None => {
                warn!(
                    "Turn {}: no playable continuation, repeating {}",
                    world.turn(),
                    self.state.prev_direction
                );
                (self.state.prev_direction, true)
            }
        };

        if let Some(by_dir) = scores.by_direction {
            debug!(
                "Turn {}: up {} down {} left {} right {}",
                world.turn(),
                by_dir[Direction::Up.index()],
                by_dir[Direction::Down.index()],
                by_dir[Direction::Left.index()],
                by_dir[Direction::Right.index()]
            );
        }

        let depth = tree.depth();
        let remaining = world.remaining_time();
        let next_budget =
            search::adapt_budget(self.state.budget, stats.exhausted, remaining, &self.config.budget);

        info!(
            "Turn {}: {} (score: {}, nodes: {}/{}, depth: {}, survivors: {}, remaining: {}, next budget: {}, {}ms)",
            world.turn(),
            direction,
            scores.score,
            stats.nodes_created,
            stats.budget,
            depth,
            survivors,
            remaining,
            next_budget,
            started.elapsed().as_millis()
        );

        self.state.budget = next_budget;
        self.state.prev_direction = direction;

        Decision {
            direction,
            score: scores.score,
            by_direction: scores.by_direction,
            stats,
            depth,
            survivors,
            fallback,
            next_budget,
        }
    }

    /// Builds the root from the live world
    ///
    /// A player counts as eliminated if it was eliminated last turn or its
    /// position has not changed since then. Also records this turn's
    /// positions for the next call.
    fn root_node<W: WorldView>(&mut self, world: &W) -> (Node, usize) {
        let mut positions: Positions = Vec::with_capacity(self.geometry.num_players);
        for p in 0..self.geometry.num_players {
            let now = world.position_of(p);
            debug_assert!(self.geometry.contains(now));
            let eliminated = match &self.state.prev_positions {
                Some(prev) => match prev[p] {
                    Some(before) => before == now,
                    None => true,
                },
                None => false,
            };
            positions.push(if eliminated { None } else { Some(now) });
        }

        let survivors = positions.iter().filter(|p| p.is_some()).count();
        self.state.prev_positions = Some(positions.clone());
        (Node::root(Grid::from_world(world), positions), survivors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::types::Coord;

    #[test]
    fn test_initial_budget_from_board_size() {
        let arena = Arena::new(10, 10, &[Coord::new(1, 1), Coord::new(8, 8)]);
        let agent = Agent::new(0, &arena.view(100), Config::default_hardcoded());
        assert_eq!(agent.budget(), 101);
        assert_eq!(agent.state().prev_positions, None);
    }

    #[test]
    fn test_first_turn_treats_everyone_alive() {
        let arena = Arena::new(10, 10, &[Coord::new(1, 1), Coord::new(8, 8)]);
        let mut agent = Agent::new(0, &arena.view(100), Config::default_hardcoded());
        let decision = agent.decide(&arena.view(100));
        assert_eq!(decision.survivors, 2);
        assert!(!decision.fallback);
    }

    #[test]
    fn test_player_that_stopped_moving_is_eliminated() {
        let mut arena = Arena::new(10, 10, &[Coord::new(1, 1), Coord::new(8, 8)]);
        let mut agent = Agent::new(0, &arena.view(100), Config::default_hardcoded());
        agent.decide(&arena.view(100));

        // Player 1 crashes into a wall placed in front of it.
        arena.place_wall(Coord::new(8, 7));
        arena.step(&[Direction::Right, Direction::Up]);
        assert!(!arena.players()[1].alive);

        let decision = agent.decide(&arena.view(100));
        assert_eq!(decision.survivors, 1);
        assert_eq!(agent.state().prev_positions.as_ref().unwrap()[1], None);

        // Once eliminated, always eliminated.
        arena.step(&[Direction::Right, Direction::Up]);
        let decision = agent.decide(&arena.view(100));
        assert_eq!(decision.survivors, 1);
    }

    #[test]
    fn test_walled_in_agent_falls_back_to_previous_direction() {
        let mut arena = Arena::new(6, 6, &[Coord::new(2, 2), Coord::new(5, 5)]);
        for c in [
            Coord::new(2, 1),
            Coord::new(2, 3),
            Coord::new(1, 2),
            Coord::new(3, 2),
        ] {
            arena.place_wall(c);
        }
        let config = Config::default_hardcoded();
        let state = AgentState {
            budget: 50,
            prev_positions: None,
            prev_direction: Direction::Left,
        };
        let geometry = Geometry::from_world(&arena.view(100), 0);
        let mut agent = Agent::with_state(geometry, config.clone(), state);

        let decision = agent.decide(&arena.view(100));
        assert!(decision.fallback);
        assert_eq!(decision.direction, Direction::Left);
        assert_eq!(decision.score, config.scores.min_score);
        assert_eq!(decision.by_direction, None);
    }

    #[test]
    fn test_budget_carries_between_turns() {
        let arena = Arena::new(10, 10, &[Coord::new(1, 1), Coord::new(8, 8)]);
        let mut agent = Agent::new(0, &arena.view(100), Config::default_hardcoded());
        let decision = agent.decide(&arena.view(1000));
        assert_eq!(agent.budget(), decision.next_budget);
        assert_eq!(agent.state().prev_direction, decision.direction);
    }

    #[test]
    fn test_scarce_clock_shrinks_budget() {
        let arena = Arena::new(10, 10, &[Coord::new(1, 1), Coord::new(8, 8)]);
        let mut agent = Agent::new(0, &arena.view(100), Config::default_hardcoded());
        let before = agent.budget();
        agent.decide(&arena.view(0));
        assert_eq!(agent.budget(), before * 2 / 3 + 1);
    }
}
