//! Search tree storage.
//!
//! Nodes live in one growing arena and refer to each other by index. The
//! children of a node are created together at expansion, so they sit next to
//! each other in the arena; they are still walked through `next` links, the
//! way a sibling chain is walked. Nothing is removed during a search; the
//! whole arena is cleared when a new search starts.

use crate::board::Point;
use crate::constants::NULL_MOVE;

/// Index of a node in the [`UctTree`] arena.
pub type NodeId = usize;

/// Incremental mean with a (possibly fractional) sample count.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MeanTracker {
    count: f32,
    mean: f32,
}

impl MeanTracker {
    /// Start from a prior: `count` pseudo-samples of `value`.
    pub fn with_prior(value: f32, count: f32) -> Self {
        MeanTracker { count, mean: value }
    }

    #[inline]
    pub fn is_defined(&self) -> bool {
        self.count != 0.0
    }

    #[inline]
    pub fn mean(&self) -> f32 {
        self.mean
    }

    #[inline]
    pub fn count(&self) -> f32 {
        self.count
    }

    pub fn clear(&mut self) {
        self.count = 0.0;
        self.mean = 0.0;
    }

    pub fn add(&mut self, value: f32) {
        debug_assert!(value > -1e-6 && value < 1.000_001, "value {value} out of range");
        self.count += 1.0;
        self.mean += (value - self.mean) / self.count;
    }

    pub fn add_weighted(&mut self, value: f32, weight: f32) {
        self.count += weight;
        self.mean += weight * (value - self.mean) / self.count;
    }

    /// Undo an `add` of the same value.
    pub fn remove(&mut self, value: f32) {
        self.remove_weighted(value, 1.0);
    }

    /// Undo an `add_weighted` of the same value and weight.
    pub fn remove_weighted(&mut self, value: f32, weight: f32) {
        if self.count > weight + 1e-6 {
            let count = self.count - weight;
            self.mean += weight * (self.mean - value) / count;
            self.count = count;
        } else {
            self.clear();
        }
    }
}

/// A candidate move with its heuristic prior, used to seed new nodes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MoveInfo {
    pub point: Point,
    pub value: f32,
    pub count: u32,
}

impl MoveInfo {
    pub fn new(point: Point) -> Self {
        MoveInfo {
            point,
            value: 0.0,
            count: 0,
        }
    }
}

/// One move edge of the search tree with its statistics.
#[derive(Clone, Debug)]
pub struct UctNode {
    mv: Point,
    first_child: Option<NodeId>,
    next: Option<NodeId>,
    num_children: usize,
    pos_count: u32,
    visits: u32,
    mean: MeanTracker,
    rave: MeanTracker,
}

impl UctNode {
    fn new(info: &MoveInfo) -> Self {
        UctNode {
            mv: info.point,
            first_child: None,
            next: None,
            num_children: 0,
            pos_count: 0,
            visits: 0,
            mean: MeanTracker::with_prior(info.value, info.count as f32),
            rave: MeanTracker::with_prior(info.value, info.count as f32),
        }
    }

    #[inline]
    pub fn mv(&self) -> Point {
        self.mv
    }

    #[inline]
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[inline]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    #[inline]
    pub fn num_children(&self) -> usize {
        self.num_children
    }

    /// Visits of the position after this move, seeded with the children's priors.
    #[inline]
    pub fn pos_count(&self) -> u32 {
        self.pos_count
    }

    /// Count of the mean tracker, priors included.
    #[inline]
    pub fn move_count(&self) -> u32 {
        (self.mean.count() + 0.5) as u32
    }

    /// Simulations that actually went through this node.
    #[inline]
    pub fn visits(&self) -> u32 {
        self.visits
    }

    #[inline]
    pub fn has_been_visited(&self) -> bool {
        self.visits > 0
    }

    #[inline]
    pub fn has_mean(&self) -> bool {
        self.mean.is_defined()
    }

    #[inline]
    pub fn mean(&self) -> f32 {
        self.mean.mean()
    }

    #[inline]
    pub fn has_rave_value(&self) -> bool {
        self.rave.is_defined()
    }

    #[inline]
    pub fn rave_count(&self) -> f32 {
        self.rave.count()
    }

    #[inline]
    pub fn rave_value(&self) -> f32 {
        self.rave.mean()
    }

    pub fn add_game_result(&mut self, eval: f32) {
        self.mean.add(eval);
        self.visits += 1;
    }

    pub fn add_rave_value(&mut self, eval: f32, weight: f32) {
        self.rave.add_weighted(eval, weight);
    }

    pub fn increment_pos_count(&mut self) {
        self.pos_count += 1;
    }
}

/// Arena of [`UctNode`]s with the root at index [`UctTree::ROOT`].
#[derive(Clone, Debug)]
pub struct UctTree {
    nodes: Vec<UctNode>,
}

impl Default for UctTree {
    fn default() -> Self {
        Self::new()
    }
}

impl UctTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        let mut tree = UctTree { nodes: Vec::new() };
        tree.clear();
        tree
    }

    /// Drop every node and start over with a fresh, unvisited root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(UctNode::new(&MoveInfo::new(NULL_MOVE)));
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &UctNode {
        &self.nodes[id]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut UctNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create one child per move, in order, and seed the parent's position
    /// count with the sum of the priors.
    pub fn expand(&mut self, parent: NodeId, moves: &[MoveInfo]) {
        debug_assert_eq!(self.nodes[parent].num_children, 0, "node expanded twice");
        let first = self.nodes.len();
        let mut pos_count = 0;
        for (i, info) in moves.iter().enumerate() {
            let mut node = UctNode::new(info);
            if i + 1 < moves.len() {
                node.next = Some(first + i + 1);
            }
            self.nodes.push(node);
            pos_count += info.count;
        }

        let node = &mut self.nodes[parent];
        node.pos_count = pos_count;
        node.num_children = moves.len();
        node.first_child = (!moves.is_empty()).then_some(first);
    }

    /// Children of `id` in sibling order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            current: self.nodes[id].first_child,
        }
    }
}

/// Iterator over a sibling chain.
pub struct Children<'a> {
    tree: &'a UctTree,
    current: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.nodes[id].next;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_tracker_add_remove() {
        let mut m = MeanTracker::default();
        assert!(!m.is_defined());
        m.add(1.0);
        m.add(0.0);
        m.add(0.5);
        assert!((m.mean() - 0.5).abs() < 1e-6);
        m.remove(0.5);
        assert!((m.mean() - 0.5).abs() < 1e-6);
        assert_eq!(m.count(), 2.0);
        m.remove(0.0);
        assert!((m.mean() - 1.0).abs() < 1e-6);
        m.remove(1.0);
        assert!(!m.is_defined());
    }

    #[test]
    fn test_mean_tracker_weighted() {
        let mut m = MeanTracker::with_prior(0.5, 2.0);
        m.add_weighted(1.0, 2.0);
        assert!((m.mean() - 0.75).abs() < 1e-6);
        assert_eq!(m.count(), 4.0);
        m.remove_weighted(1.0, 2.0);
        assert!((m.mean() - 0.5).abs() < 1e-6);
        assert_eq!(m.count(), 2.0);
    }

    #[test]
    fn test_expand_links_children() {
        let mut tree = UctTree::new();
        let moves: Vec<MoveInfo> = (1..=3)
            .map(|p| MoveInfo {
                point: p,
                value: 0.5,
                count: p as u32,
            })
            .collect();
        tree.expand(UctTree::ROOT, &moves);

        let root = tree.node(UctTree::ROOT);
        assert_eq!(root.num_children(), 3);
        assert_eq!(root.pos_count(), 6);
        let points: Vec<Point> = tree.children(UctTree::ROOT).map(|c| tree.node(c).mv()).collect();
        assert_eq!(points, vec![1, 2, 3]);

        let child = tree.children(UctTree::ROOT).nth(2).unwrap();
        assert_eq!(tree.node(child).move_count(), 3);
        assert!(!tree.node(child).has_been_visited());
        assert_eq!(tree.children(child).count(), 0);
    }
}
