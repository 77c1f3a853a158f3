//! Binary prefix trie with longest-prefix-match lookup.
//!
//! IPv4 and IPv6 prefixes live in two separate subtrees that never interact.
//! Every node stores a normalized prefix; walking down from a subtree root
//! compares one address bit per level, turning left on 0 and right on 1.
//! Nodes are path-compressed: a node whose prefix is `/24` may hang directly
//! below a `/8`, as long as both agree on the first 8 bits.
//!
//! Three restructuring steps keep the shape valid under insertion:
//!
//! - **attach**: a new leaf goes into an empty child slot;
//! - **fork**: the new prefix diverges from a node inside that node's span,
//!   so an unassigned branch node holding the common supernet is put above
//!   both;
//! - **split**: the new prefix is a supernet of the node reached, so it is
//!   put directly above that node.
//!
//! Erasing unassigns a node and prunes it, together with every ancestor left
//! unassigned and childless.

mod iter;
mod node;

#[cfg(test)]
mod proptests;

pub use iter::Iter;

use std::fmt;

use self::node::{Arena, Node, NodeId};
use crate::endpoint::{Endpoint, Family};
use crate::prefix::Prefix;

/// Map from network prefixes to values with longest-prefix-match lookup.
///
/// Prefixes are normalized on insertion, so `10.1.2.3/8` and `10.0.0.0/8`
/// name the same entry. Iteration visits IPv4 entries before IPv6 entries,
/// each family in ascending order of its bit path.
///
/// The trie is not synchronized. Lookups only need `&self`; concurrent
/// readers are fine as long as writers are excluded (see
/// [`SharedPrefixSet`](crate::SharedPrefixSet) for a reload-friendly wrapper).
///
/// # Examples
/// ```
/// use nettrie::{Endpoint, Prefix, PrefixTrie};
///
/// let mut trie = PrefixTrie::new();
/// trie.insert_or_assign(&"10.0.0.0/8".parse().unwrap(), "A");
/// trie.insert_or_assign(&"10.1.0.0/16".parse().unwrap(), "B");
///
/// let addr: Endpoint = "10.1.2.3".parse().unwrap();
/// let (prefix, value) = trie.lookup(&addr).unwrap();
/// assert_eq!(prefix.to_string(), "10.1.0.0/16");
/// assert_eq!(*value, "B");
/// ```
#[derive(Clone)]
pub struct PrefixTrie<V> {
    nodes: Arena<V>,
    /// Subtree roots indexed by [`Family::index`]
    roots: [Option<NodeId>; 2],
    /// Leftmost assigned node, where iteration starts
    leftmost: Option<NodeId>,
    len: usize,
}

impl<V> PrefixTrie<V> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            roots: [None, None],
            leftmost: None,
            len: 0,
        }
    }

    /// Number of prefixes stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots = [None, None];
        self.leftmost = None;
        self.len = 0;
    }

    /// Exchange the contents of two tries without copying nodes.
    pub fn swap(&mut self, other: &mut PrefixTrie<V>) {
        std::mem::swap(self, other);
    }

    /// Longest-prefix match for `address`.
    pub fn lookup(&self, address: &Endpoint) -> Option<(&Prefix, &V)> {
        self.lookup_bits(address, address.bits())
    }

    /// Longest-prefix match for `address` considering at most `max_bits`
    /// leading bits. Values above the address width are clamped.
    pub fn lookup_bits(&self, address: &Endpoint, max_bits: u8) -> Option<(&Prefix, &V)> {
        self.best_match(address, max_bits).map(|id| {
            let node = &self.nodes[id];
            (&node.key, &node.value)
        })
    }

    /// Longest stored prefix that covers all of `prefix`.
    pub fn lookup_prefix(&self, prefix: &Prefix) -> Option<(&Prefix, &V)> {
        self.lookup_bits(prefix.network(), prefix.length())
    }

    /// Whether any stored prefix covers `address`.
    pub fn matches(&self, address: &Endpoint) -> bool {
        self.best_match(address, address.bits()).is_some()
    }

    /// Whether exactly `prefix` (after normalization) is stored.
    pub fn has(&self, prefix: &Prefix) -> bool {
        self.find_exact(prefix).is_some()
    }

    /// Value stored for exactly `prefix`.
    pub fn get(&self, prefix: &Prefix) -> Option<&V> {
        self.find_exact(prefix).map(|id| &self.nodes[id].value)
    }

    /// Mutable value stored for exactly `prefix`.
    pub fn get_mut(&mut self, prefix: &Prefix) -> Option<&mut V> {
        let id = self.find_exact(prefix)?;
        Some(&mut self.nodes[id].value)
    }

    /// First entry in iteration order.
    pub fn first(&self) -> Option<(&Prefix, &V)> {
        self.leftmost.map(|id| {
            let node = &self.nodes[id];
            (&node.key, &node.value)
        })
    }

    /// Iterate over `(prefix, value)` pairs in trie order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self, self.leftmost, self.len)
    }

    /// Mutable access to every stored value, in no particular order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.nodes
            .iter_mut()
            .filter(|node| node.assigned)
            .map(|node| &mut node.value)
    }

    fn best_match(&self, address: &Endpoint, max_bits: u8) -> Option<NodeId> {
        let max_bits = max_bits.min(address.bits());
        let mut id = self.roots[address.family().index()]?;
        let mut best = None;

        let mut bits = 0;
        while bits < max_bits {
            let bit = address.bit(-1 - i32::from(bits));
            let node = &self.nodes[id];

            if bits >= node.depth() {
                // leaving this node; remember it when assigned
                if node.assigned {
                    best = Some(id);
                }
                match node.child(bit) {
                    Some(child) => id = child,
                    None => break,
                }
            } else if node.key.branch_bit(bits) != bit {
                break;
            }
            bits += 1;
        }

        let node = &self.nodes[id];
        if node.assigned && bits == node.key.length() {
            best = Some(id);
        }
        best
    }

    fn find_exact(&self, prefix: &Prefix) -> Option<NodeId> {
        let key = prefix.normalized();
        self.best_match(key.network(), key.length())
            .filter(|&id| self.nodes[id].key == key)
    }

    /// Point whatever refers to `old` (its parent's child slot or a subtree
    /// root) at `new` instead.
    fn relink(&mut self, old: NodeId, new: Option<NodeId>) {
        let parent = self.nodes[old].parent;
        match parent {
            Some(p) => {
                let parent_node = &mut self.nodes[p];
                if parent_node.left == Some(old) {
                    parent_node.left = new;
                } else if parent_node.right == Some(old) {
                    parent_node.right = new;
                } else {
                    panic!("PrefixTrie: parent node reference is invalid");
                }
            }
            None => {
                let family = self.nodes[old].key.family();
                let root = &mut self.roots[family.index()];
                assert_eq!(*root, Some(old), "PrefixTrie: root node reference is invalid");
                *root = new;
            }
        }
        if let Some(new) = new {
            self.nodes[new].parent = parent;
        }
    }

    fn descend_left(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    /// In-order (left, node, right) successor, crossing from the IPv4
    /// subtree into the IPv6 subtree.
    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.nodes[id].right {
            return Some(self.descend_left(right));
        }

        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }

        match self.nodes[current].key.family() {
            Family::V4 => self.roots[Family::V6.index()].map(|root| self.descend_left(root)),
            Family::V6 => None,
        }
    }

    fn next_assigned(&self, id: NodeId) -> Option<NodeId> {
        let mut next = self.successor(id);
        while let Some(candidate) = next {
            if self.nodes[candidate].assigned {
                return Some(candidate);
            }
            next = self.successor(candidate);
        }
        None
    }

    fn first_assigned(&self) -> Option<NodeId> {
        let root = self.roots.iter().flatten().next().copied()?;
        let first = self.descend_left(root);
        if self.nodes[first].assigned {
            Some(first)
        } else {
            self.next_assigned(first)
        }
    }
}

impl<V: Default> PrefixTrie<V> {
    /// Get the value slot for `prefix`, creating it with `V::default()` if
    /// absent. An existing value is left untouched.
    pub fn insert(&mut self, prefix: &Prefix) -> &mut V {
        let key = prefix.normalized();
        let id = self.locate_or_create(&key);

        let node = &mut self.nodes[id];
        if !node.assigned {
            node.assigned = true;
            self.len += 1;
            self.leftmost = self.first_assigned();
        }
        &mut self.nodes[id].value
    }

    /// Store `value` for `prefix`, replacing any previous value.
    pub fn insert_or_assign(&mut self, prefix: &Prefix, value: V) {
        *self.insert(prefix) = value;
    }

    /// Remove exactly `prefix`, returning its value.
    ///
    /// Nodes left unassigned and childless are pruned up to the first
    /// ancestor that still has content.
    pub fn erase(&mut self, prefix: &Prefix) -> Option<V> {
        let id = self.find_exact(prefix)?;

        assert!(self.len > 0, "PrefixTrie: size of tree is zero before erase");
        self.len -= 1;

        let node = &mut self.nodes[id];
        node.assigned = false;
        let value = std::mem::take(&mut node.value);

        self.prune(id);
        if self.leftmost == Some(id) {
            self.leftmost = self.first_assigned();
        }
        Some(value)
    }

    /// Find the node for a normalized `key`, restructuring as needed.
    fn locate_or_create(&mut self, key: &Prefix) -> NodeId {
        let family = key.family();
        let mut id = match self.roots[family.index()] {
            Some(root) => root,
            None => {
                let root = self.nodes.alloc(Node::new(key));
                self.roots[family.index()] = Some(root);
                return root;
            }
        };

        let length = key.length();
        let mut bits = 0;
        while bits < length {
            let bit = key.branch_bit(bits);
            let node = &self.nodes[id];

            if bits >= node.depth() {
                // end of the current node; continue with the next
                match node.child(bit) {
                    Some(child) => id = child,
                    None => return self.attach(id, bit, key),
                }
            } else if node.key.branch_bit(bits) != bit {
                // matches up to here, yet continues in a different direction
                return self.fork(id, key, bits);
            }
            bits += 1;
        }

        if self.nodes[id].key.length() > length {
            // key is a supernet of the node reached
            id = self.split(id, key);
        }
        id
    }

    /// Add a leaf for `key` in the empty `bit` slot of `parent`.
    fn attach(&mut self, parent: NodeId, bit: bool, key: &Prefix) -> NodeId {
        let depth = self.nodes[parent].depth();
        debug_assert!(key.length() > depth);
        debug_assert_eq!(key.branch_bit(depth), bit);

        let mut leaf = Node::new(key);
        leaf.parent = Some(parent);
        let leaf = self.nodes.alloc(leaf);

        let slot = self.nodes[parent].child_mut(bit);
        debug_assert!(slot.is_none(), "attaching over an existing child");
        *slot = Some(leaf);
        leaf
    }

    /// Insert a node for the supernet `key` directly above `id`.
    fn split(&mut self, id: NodeId, key: &Prefix) -> NodeId {
        let length = key.length();
        debug_assert!(self.nodes[id].key.length() > length);

        let upper = self.nodes.alloc(Node::new(key));
        self.relink(id, Some(upper));

        let bit = self.nodes[id].key.branch_bit(length);
        *self.nodes[upper].child_mut(bit) = Some(id);
        self.nodes[id].parent = Some(upper);
        upper
    }

    /// Put a branch node for the first `bits` bits of `id` above it, and a
    /// new leaf for `key` next to it.
    fn fork(&mut self, id: NodeId, key: &Prefix, bits: u8) -> NodeId {
        debug_assert!(bits < self.nodes[id].key.length());
        debug_assert!(bits < key.length());

        let common = self.nodes[id].key.super_prefix(bits);
        let branch = self.nodes.alloc(Node::new(&common));
        self.relink(id, Some(branch));

        let mut leaf = Node::new(key);
        leaf.parent = Some(branch);
        let leaf = self.nodes.alloc(leaf);

        let old_bit = self.nodes[id].key.branch_bit(bits);
        self.nodes[id].parent = Some(branch);

        let branch_node = &mut self.nodes[branch];
        *branch_node.child_mut(old_bit) = Some(id);
        *branch_node.child_mut(!old_bit) = Some(leaf);
        leaf
    }

    /// Remove `id` and its ancestors while they are unassigned and childless.
    fn prune(&mut self, id: NodeId) {
        let mut current = id;
        while self.nodes[current].is_garbage() {
            let parent = self.nodes[current].parent;
            self.relink(current, None);
            self.nodes.release(current);
            match parent {
                Some(p) => current = p,
                None => break,
            }
        }
    }
}

impl<V> Default for PrefixTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for PrefixTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a PrefixTrie<V> {
    type Item = (&'a Prefix, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

impl<V: Default> Extend<(Prefix, V)> for PrefixTrie<V> {
    fn extend<I: IntoIterator<Item = (Prefix, V)>>(&mut self, iter: I) {
        for (prefix, value) in iter {
            self.insert_or_assign(&prefix, value);
        }
    }
}

impl<V: Default> FromIterator<(Prefix, V)> for PrefixTrie<V> {
    fn from_iter<I: IntoIterator<Item = (Prefix, V)>>(iter: I) -> Self {
        let mut trie = PrefixTrie::new();
        trie.extend(iter);
        trie
    }
}
