//! Allow/deny sets of network prefixes.

mod config;

pub use config::PrefixSetConfig;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::prefix::Prefix;
use crate::trie::PrefixTrie;

/// Marker flagging a negated entry in text form.
const NEGATION: char = '!';

/// Characters separating entries in a list.
const LIST_SEPARATORS: [char; 3] = [',', ' ', '\t'];

/// A set of positive and negated prefixes answering "is this address
/// allowed".
///
/// The most specific matching entry decides: with `10.0.0.0/8` and
/// `!10.0.1.0/24` in the set, `10.0.2.5` matches and `10.0.1.5` does not.
/// Addresses covered by no entry do not match.
///
/// # Examples
/// ```
/// use nettrie::PrefixSet;
///
/// let set: PrefixSet = "10.0.0.0/8, !10.0.1.0/24".parse().unwrap();
/// assert!(set.matches(&"10.0.2.5".parse().unwrap()));
/// assert!(!set.matches(&"10.0.1.5".parse().unwrap()));
/// ```
#[derive(Clone, Default)]
pub struct PrefixSet {
    tree: PrefixTrie<bool>,
}

impl PrefixSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a positive entry.
    pub fn add(&mut self, prefix: &Prefix) {
        self.insert(prefix, true);
    }

    /// Add a negated entry.
    pub fn add_negated(&mut self, prefix: &Prefix) {
        self.insert(prefix, false);
    }

    /// Add `prefix` with the given polarity, replacing an existing entry
    /// for the same prefix.
    pub fn insert(&mut self, prefix: &Prefix, positive: bool) {
        self.tree.insert_or_assign(prefix, positive);
    }

    /// Add one entry in text form, e.g. `192.0.2.0/24` or `!2001:db8::/32`.
    pub fn add_pattern(&mut self, pattern: &str) -> Result<()> {
        let (prefix, positive) = parse_entry(pattern)?;
        self.insert(&prefix, positive);
        Ok(())
    }

    /// Add every entry of a list separated by commas, spaces or tabs.
    ///
    /// Entries are validated before any of them is added, so a malformed
    /// list leaves the set unchanged.
    pub fn add_list(&mut self, list: &str) -> Result<()> {
        let entries = split_list(list)
            .map(parse_entry)
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Adding {} prefix entries", entries.len());
        for (prefix, positive) in entries {
            self.insert(&prefix, positive);
        }
        Ok(())
    }

    /// Remove the entry for exactly `prefix`, returning its polarity.
    pub fn remove(&mut self, prefix: &Prefix) -> Option<bool> {
        self.tree.erase(prefix)
    }

    /// Remove an entry given in text form. Empty text removes nothing.
    ///
    /// A negation marker is accepted and ignored: the entry is removed
    /// whatever its polarity.
    pub fn remove_pattern(&mut self, pattern: &str) -> Result<Option<bool>> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Ok(None);
        }
        let (prefix, _) = parse_entry(pattern)?;
        Ok(self.remove(&prefix))
    }

    /// Whether the most specific entry covering `address` is positive.
    pub fn matches(&self, address: &Endpoint) -> bool {
        self.lookup(address).map_or(false, |(_, positive)| positive)
    }

    /// The most specific entry covering `address` and its polarity.
    pub fn lookup(&self, address: &Endpoint) -> Option<(&Prefix, bool)> {
        self.tree
            .lookup(address)
            .map(|(prefix, positive)| (prefix, *positive))
    }

    /// Whether exactly `prefix` is an entry, whatever its polarity.
    pub fn contains(&self, prefix: &Prefix) -> bool {
        self.tree.has(prefix)
    }

    /// Iterate over `(prefix, positive)` entries in trie order.
    pub fn iter(&self) -> impl Iterator<Item = (&Prefix, bool)> + '_ {
        self.tree.iter().map(|(prefix, positive)| (prefix, *positive))
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Canonical text of every entry, negated ones marked with `!`.
    pub fn to_string_vec(&self) -> Vec<String> {
        self.iter()
            .map(|(prefix, positive)| format_entry(prefix, positive))
            .collect()
    }

    /// The underlying trie.
    pub fn as_trie(&self) -> &PrefixTrie<bool> {
        &self.tree
    }
}

/// Parse one entry, honouring a leading negation marker.
fn parse_entry(pattern: &str) -> Result<(Prefix, bool)> {
    let pattern = pattern.trim();
    match pattern.strip_prefix(NEGATION) {
        Some(rest) => Ok((rest.trim_start().parse()?, false)),
        None => Ok((pattern.parse()?, true)),
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> + '_ {
    list.split(&LIST_SEPARATORS[..]).filter(|part| !part.is_empty())
}

fn format_entry(prefix: &Prefix, positive: bool) -> String {
    if positive {
        prefix.to_string()
    } else {
        format!("{}{}", NEGATION, prefix)
    }
}

impl fmt::Display for PrefixSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (prefix, positive)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if !positive {
                write!(f, "{}", NEGATION)?;
            }
            write!(f, "{}", prefix)?;
        }
        Ok(())
    }
}

impl fmt::Debug for PrefixSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_string_vec()).finish()
    }
}

impl FromStr for PrefixSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut set = PrefixSet::new();
        set.add_list(s)?;
        Ok(set)
    }
}

impl FromIterator<(Prefix, bool)> for PrefixSet {
    fn from_iter<I: IntoIterator<Item = (Prefix, bool)>>(iter: I) -> Self {
        Self {
            tree: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Prefix, bool)> for PrefixSet {
    fn extend<I: IntoIterator<Item = (Prefix, bool)>>(&mut self, iter: I) {
        self.tree.extend(iter);
    }
}

impl Serialize for PrefixSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (prefix, positive) in self.iter() {
            seq.serialize_element(&format_entry(prefix, positive))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for PrefixSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = PrefixSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of prefix entries")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<PrefixSet, A::Error> {
                let mut set = PrefixSet::new();
                while let Some(entry) = seq.next_element::<String>()? {
                    set.add_pattern(&entry).map_err(de::Error::custom)?;
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(EntriesVisitor)
    }
}
