//! A small arena-backed rooted forest.
//!
//! Nodes live in a single `Vec` and refer to each other by `NodeId`. A node owns its payload, knows
//! its parent (if any) and its children in insertion order. Nodes are never removed, so a
//! `NodeId` handed out by a `Forest` stays valid for the life of that `Forest`.
//!
//! Every `Forest` carries a tag, and each `NodeId` records the tag of the `Forest` that issued
//! it. Handles from a different `Forest` are treated as unknown. A clone keeps the tag, so
//! handles issued by the original are also valid in the clone.

use std::fmt;
use std::ops::Index;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_FOREST: AtomicUsize = AtomicUsize::new(0);


/// Handle to a node of a `Forest`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    forest: usize,
    index: usize
}

impl NodeId {

    /// Position of the node in the order nodes were added to its `Forest`
    pub fn index(&self) -> usize {
        self.index
    }

}

impl fmt::Display for NodeId {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.index)
    }

}


#[derive(Clone, Debug)]
struct Node<T> {
    data: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>
}


/// A collection of rooted trees
#[derive(Clone, Debug)]
pub struct Forest<T> {
    tag: usize,
    nodes: Vec<Node<T>>,
    roots: Vec<NodeId>
}

impl<T> Default for Forest<T> {

    fn default() -> Self {
        Forest::new()
    }

}

impl<T> Forest<T> {

    /// Construct an empty `Forest`
    pub fn new() -> Self {
        Forest { tag: NEXT_FOREST.fetch_add(1, Ordering::Relaxed), nodes: Vec::new(), roots: Vec::new() }
    }


    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        if id.forest == self.tag {
            self.nodes.get(id.index)
        } else {
            None
        }
    }


    fn push(&mut self, data: T, parent: Option<NodeId>) -> NodeId {
        let id = NodeId { forest: self.tag, index: self.nodes.len() };
        self.nodes.push(Node { data, parent, children: Vec::new() });
        id
    }


    /// Add a new tree to the `Forest` with `data` at its root
    pub fn add_root(&mut self, data: T) -> NodeId {
        let id = self.push(data, None);
        self.roots.push(id);
        id
    }


    /// Add `data` as the last child of `parent`. Returns `None` if `parent` is not in this `Forest`.
    pub fn add_child(&mut self, parent: NodeId, data: T) -> Option<NodeId> {
        if ! self.contains(parent) {
            return None;
        }

        let id = self.push(data, Some(parent));
        self.nodes[parent.index].children.push(id);
        Some(id)
    }


    /// Whether `id` was issued by this `Forest` (or the one it was cloned from)
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }


    /// The payload of node `id`
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|n| &n.data)
    }


    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }


    /// The children of node `id`, in insertion order. Empty if `id` is unknown.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }


    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }


    /// Total number of nodes over all trees
    pub fn len(&self) -> usize {
        self.nodes.len()
    }


    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }


    /// Number of edges between `id` and the root of its tree
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }


    /// Iterate over every node, each parent before its children. Trees are visited in the order
    /// of their roots, children in insertion order.
    pub fn pre_order(&self) -> PreOrder<'_, T> {
        let mut stack = self.roots.clone();
        stack.reverse();
        PreOrder { forest: self, stack }
    }


    /// Every node with all of its children before it
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order: Vec<NodeId> = self.pre_order().map(|(id, _)| id).collect();
        order.reverse();
        order
    }


    /// Structural equality: same number of trees, and recursively the same number of children
    /// with payloads equal under `eq`, position by position.
    pub fn equals_by<F>(&self, other: &Forest<T>, eq: F) -> bool
        where F: Fn(&T, &T) -> bool
    {
        if self.roots.len() != other.roots.len() || self.nodes.len() != other.nodes.len() {
            return false;
        }

        let mut pending: Vec<(NodeId, NodeId)> = self.roots.iter().cloned().zip(other.roots.iter().cloned()).collect();
        while let Some((a, b)) = pending.pop() {
            let (na, nb) = (&self.nodes[a.index], &other.nodes[b.index]);
            if na.children.len() != nb.children.len() || ! eq(&na.data, &nb.data) {
                return false;
            }
            pending.extend(na.children.iter().cloned().zip(nb.children.iter().cloned()));
        }

        true
    }


    /// Print every node on its own line, indented by depth, using `fmt_node` for the payload
    pub fn fmt_with<F>(&self, f: &mut fmt::Formatter, indent: &str, fmt_node: F) -> fmt::Result
        where F: Fn(&T, &mut fmt::Formatter) -> fmt::Result
    {
        for (id, data) in self.pre_order() {
            for _ in 0..self.depth(id) {
                write!(f, "{}", indent)?;
            }
            fmt_node(data, f)?;
            writeln!(f)?;
        }
        Ok(())
    }

}


impl<T> Index<NodeId> for Forest<T> {
    type Output = T;

    /// # Panics
    /// If `id` was not handed out by this `Forest`
    fn index(&self, id: NodeId) -> &T {
        assert_eq!(id.forest, self.tag, "node {} belongs to another forest", id);
        &self.nodes[id.index].data
    }
}


/// Pre-order iterator over a `Forest`. See `Forest::pre_order`.
pub struct PreOrder<'a, T> {
    forest: &'a Forest<T>,
    stack: Vec<NodeId>
}

impl<'a, T> Iterator for PreOrder<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.forest.nodes[id.index];
        self.stack.extend(node.children.iter().rev().cloned());
        Some((id, &node.data))
    }
}
