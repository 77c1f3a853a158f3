//! Node storage for [`PrefixTrie`](super::PrefixTrie).
//!
//! Nodes live in a single arena and refer to each other by index. A parent
//! owns its children through reachability; the `parent` index of a child is
//! a plain back-reference used for upward traversal and pruning. Released
//! slots are kept on a free list and reused by later allocations.

use std::ops::{Index, IndexMut};

use crate::prefix::Prefix;

/// Index of a node inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct NodeId(usize);

#[derive(Debug, Clone)]
pub(super) struct Node<V> {
    /// Normalized prefix stored at this node
    pub key: Prefix,
    pub value: V,
    /// Whether the application inserted `key` (branch nodes are not)
    pub assigned: bool,
    pub parent: Option<NodeId>,
    /// Subtree continuing with a 0 bit
    pub left: Option<NodeId>,
    /// Subtree continuing with a 1 bit
    pub right: Option<NodeId>,
}

impl<V: Default> Node<V> {
    pub fn new(key: &Prefix) -> Self {
        Self {
            key: key.normalized(),
            value: V::default(),
            assigned: false,
            parent: None,
            left: None,
            right: None,
        }
    }
}

impl<V> Node<V> {
    /// Number of bits consumed once a walk leaves this node.
    ///
    /// Every node stores the full prefix of its path, so this is always the
    /// stored prefix length.
    pub fn depth(&self) -> u8 {
        self.key.length()
    }

    pub fn child(&self, bit: bool) -> Option<NodeId> {
        if bit {
            self.right
        } else {
            self.left
        }
    }

    pub fn child_mut(&mut self, bit: bool) -> &mut Option<NodeId> {
        if bit {
            &mut self.right
        } else {
            &mut self.left
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Unassigned and childless: must be pruned.
    pub fn is_garbage(&self) -> bool {
        !self.assigned && self.is_leaf()
    }
}

#[derive(Debug, Clone)]
pub(super) struct Arena<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<NodeId>,
}

impl<V> Arena<V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn alloc(&mut self, node: Node<V>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                debug_assert!(self.slots[id.0].is_none(), "free slot still occupied");
                self.slots[id.0] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Remove a node, making its slot available for reuse.
    pub fn release(&mut self, id: NodeId) -> Node<V> {
        let node = self.slots[id.0]
            .take()
            .unwrap_or_else(|| panic!("PrefixTrie: released dangling node {:?}", id));
        self.free.push(id);
        node
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node<V>> {
        self.slots.iter_mut().flatten()
    }
}

impl<V> Index<NodeId> for Arena<V> {
    type Output = Node<V>;

    fn index(&self, id: NodeId) -> &Node<V> {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("PrefixTrie: dangling node {:?}", id),
        }
    }
}

impl<V> IndexMut<NodeId> for Arena<V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("PrefixTrie: dangling node {:?}", id),
        }
    }
}
