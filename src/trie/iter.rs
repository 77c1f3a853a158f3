//! Ordered iteration over assigned trie entries.

use std::iter::FusedIterator;

use super::node::NodeId;
use super::PrefixTrie;
use crate::prefix::Prefix;

/// Iterator over the entries of a [`PrefixTrie`].
///
/// Created by [`PrefixTrie::iter`]. Entries come out IPv4 first, then IPv6,
/// each family in-order over its subtree (0 branch, node, 1 branch).
pub struct Iter<'a, V> {
    trie: &'a PrefixTrie<V>,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(super) fn new(trie: &'a PrefixTrie<V>, start: Option<NodeId>, len: usize) -> Self {
        Self {
            trie,
            next: start,
            remaining: len,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let trie = self.trie;
        let id = self.next?;
        self.next = trie.next_assigned(id);
        self.remaining = self.remaining.saturating_sub(1);

        let node = &trie.nodes[id];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            trie: self.trie,
            next: self.next,
            remaining: self.remaining,
        }
    }
}
