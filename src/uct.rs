//! UCT selection.

use crate::constants::{UCT_C, UNVISITED_UCT};
use crate::tree::{NodeId, Tree};

/// UCT value with the default exploration constant.
pub fn uct_value(parent_visits: u32, node_score: f64, node_visits: u32) -> f64 {
    uct_value_with(UCT_C, parent_visits, node_score, node_visits)
}

/// Mean score plus `c * sqrt(ln(parent_visits) / node_visits)`.
///
/// Unvisited nodes get `UNVISITED_UCT` so every child is tried once before
/// any is revisited.
pub fn uct_value_with(c: f64, parent_visits: u32, node_score: f64, node_visits: u32) -> f64 {
    if node_visits == 0 {
        return UNVISITED_UCT;
    }
    let visits = f64::from(node_visits);
    // ln(0) would turn the bonus into NaN
    let parent = f64::from(parent_visits.max(1));
    node_score / visits + c * (parent.ln() / visits).sqrt()
}

/// Child of `id` with the highest UCT value, earliest child on ties.
pub fn best_child(tree: &Tree, id: NodeId, exploration: f64) -> Option<NodeId> {
    let parent_visits = tree.get(id).state.visit_count();
    let mut best: Option<(NodeId, f64)> = None;
    for &child in tree.children(id) {
        let state = &tree.get(child).state;
        let value = uct_value_with(
            exploration,
            parent_visits,
            state.win_score(),
            state.visit_count(),
        );
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((child, value));
        }
    }
    best.map(|(child, _)| child)
}

/// Descend from the root by best UCT until reaching a node with no
/// children.
pub fn select_promising_node(tree: &Tree, exploration: f64) -> NodeId {
    let mut node = tree.root();
    while let Some(child) = best_child(tree, node, exploration) {
        node = child;
    }
    node
}
