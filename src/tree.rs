// Game-tree storage
//
// Nodes live in a flat arena indexed by `NodeId`. Parent to child links form
// a strict tree; the whole arena is dropped once the turn's decision is made.

use crate::grid::Grid;
use crate::types::{Coord, Direction};

/// Per-player positions; `None` marks an eliminated player
pub type Positions = Vec<Option<Coord>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Expansion status of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    /// Never popped from the search queue; scored statically
    Unexpanded,
    /// Expanded, but our agent had no surviving continuation
    Dead,
    Expanded(Vec<NodeId>),
}

/// One joint position of every player
#[derive(Debug, Clone)]
pub struct Node {
    pub grid: Grid,
    pub positions: Positions,
    /// Coins our agent collected on the path from the root
    pub coins: u32,
    /// Move our agent made to reach this node; `None` at the root
    pub agent_move: Option<Direction>,
    pub children: Children,
}

impl Node {
    pub fn root(grid: Grid, positions: Positions) -> Self {
        Node {
            grid,
            positions,
            coins: 0,
            agent_move: None,
            children: Children::Unexpanded,
        }
    }

    pub fn is_alive(&self, player: usize) -> bool {
        self.positions[player].is_some()
    }

    pub fn alive_count(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }
}

#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        Tree { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Records the outcome of expanding `parent` and returns the new ids
    ///
    /// An empty expansion marks the parent `Dead`.
    pub fn attach(&mut self, parent: NodeId, children: Vec<Node>) -> Vec<NodeId> {
        debug_assert_eq!(self.nodes[parent.0].children, Children::Unexpanded);

        let first = self.nodes.len();
        self.nodes.extend(children);
        let ids: Vec<NodeId> = (first..self.nodes.len()).map(NodeId).collect();

        self.nodes[parent.0].children = if ids.is_empty() {
            Children::Dead
        } else {
            Children::Expanded(ids.clone())
        };
        ids
    }

    /// Length of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        self.depth_of(self.root())
    }

    fn depth_of(&self, id: NodeId) -> usize {
        match &self.node(id).children {
            Children::Expanded(ids) => 1 + ids.iter().map(|&c| self.depth_of(c)).max().unwrap_or(0),
            _ => 0,
        }
    }
}
