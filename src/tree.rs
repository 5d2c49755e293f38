//! Search tree with arena allocation.
//!
//! Nodes live in one `Vec` and refer to each other through `NodeId`
//! indices, so parent links need no shared ownership. The root is always
//! `NodeId(0)`; `reroot` compacts the arena to the kept subtree.

use std::collections::VecDeque;

use crate::board::Color;
use crate::constants::WIN_SCORE;
use crate::rules::Move;
use crate::state::State;

/// Index of a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the search tree.
#[derive(Debug)]
pub struct Node {
    pub state: State,
    /// Move that led here from the parent. `None` for the root.
    pub mv: Option<Move>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Set once the children have been generated.
    pub expanded: bool,
}

impl Node {
    fn new(state: State, mv: Option<Move>, parent: Option<NodeId>) -> Self {
        Self {
            state,
            mv,
            parent,
            children: Vec::new(),
            expanded: false,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Summary numbers for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub max_depth: usize,
}

#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(root_state: State) -> Self {
        Self {
            nodes: vec![Node::new(root_state, None, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `state` as a child of `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, state: State, mv: Move) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(state, Some(mv), Some(parent)));
        self.get_mut(parent).children.push(id);
        id
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// Uniformly random child, or `None` for a leaf.
    pub fn random_child(&self, id: NodeId, rng: &mut fastrand::Rng) -> Option<NodeId> {
        let children = self.children(id);
        if children.is_empty() {
            None
        } else {
            Some(children[rng.usize(..children.len())])
        }
    }

    /// Most visited child. Ties go to the earliest child.
    pub fn robust_child(&self, id: NodeId) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for &child in self.children(id) {
            let visits = self.get(child).state.visit_count();
            if best.is_none_or(|(_, most)| visits > most) {
                best = Some((child, visits));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Walk from `leaf` to the root recording a finished or unfinished
    /// simulation.
    ///
    /// Every node on the path gains a visit. With a winner, nodes attributed
    /// to the winner gain `WIN_SCORE` and the others lose it.
    pub fn backpropagate(&mut self, leaf: NodeId, winner: Option<Color>) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.state.increment_visit();
            if let Some(winner) = winner {
                let delta = if node.state.player() == winner {
                    WIN_SCORE
                } else {
                    -WIN_SCORE
                };
                node.state.add_score(f64::from(delta));
            }
            current = node.parent;
        }
    }

    /// Drop the root's children so it can be expanded again.
    ///
    /// Only valid while the root is the sole expanded node.
    pub fn clear_root_children(&mut self) {
        self.nodes.truncate(1);
        let root = &mut self.nodes[0];
        root.children.clear();
        root.expanded = false;
    }

    /// Make `id` the new root, discarding everything outside its subtree.
    pub fn reroot(&mut self, id: NodeId) {
        if id == self.root() {
            return;
        }

        let mut old: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        let mut remap = vec![None; old.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([id]);

        // breadth first, so parents are renumbered before their children
        while let Some(current) = queue.pop_front() {
            remap[current.index()] = Some(NodeId(order.len() as u32));
            order.push(current);
            queue.extend(old[current.index()].iter().flat_map(|n| n.children.iter().copied()));
        }

        self.nodes.reserve(order.len());
        for current in order {
            let Some(mut node) = old[current.index()].take() else {
                continue;
            };
            node.parent = node.parent.and_then(|p| remap[p.index()]);
            node.children = node
                .children
                .iter()
                .filter_map(|c| remap[c.index()])
                .collect();
            self.nodes.push(node);
        }
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: self.get(self.root()).state.visit_count(),
            max_depth: self.max_depth(self.root()),
        }
    }

    fn max_depth(&self, id: NodeId) -> usize {
        self.children(id)
            .iter()
            .map(|&child| 1 + self.max_depth(child))
            .max()
            .unwrap_or(0)
    }
}
