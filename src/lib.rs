//! nettrie - Longest-prefix-match lookup for IPv4 and IPv6 network prefixes.
//!
//! This crate answers "which configured prefix, if any, covers this address,
//! and what is attached to it?" for ACLs, source-based routing decisions and
//! similar high query rate paths.
//!
//! # Features
//!
//! - **Endpoint**: IPv4/IPv6 address plus port, with bit-level access
//! - **Prefix**: CIDR block parsing, normalization and membership tests
//! - **PrefixTrie**: path-compressed binary trie keyed by prefix, with
//!   longest-prefix-match lookup and ordered iteration
//! - **PrefixSet**: allow/deny set with `!` negated entries, where the most
//!   specific entry wins
//! - **SharedPrefixSet**: lock-free readers with atomic hot reload
//! - **Configuration**: YAML or JSON prefix lists
//!
//! # Quick Start
//!
//! ```
//! use nettrie::{Endpoint, PrefixSet, PrefixTrie};
//!
//! let mut routes = PrefixTrie::new();
//! routes.insert_or_assign(&"0.0.0.0/0".parse().unwrap(), "upstream");
//! routes.insert_or_assign(&"192.168.0.0/16".parse().unwrap(), "lan");
//!
//! let addr: Endpoint = "192.168.1.20".parse().unwrap();
//! assert_eq!(routes.lookup(&addr).map(|(_, v)| *v), Some("lan"));
//!
//! let acl: PrefixSet = "10.0.0.0/8, !10.0.1.0/24".parse().unwrap();
//! assert!(acl.matches(&"10.0.2.1".parse().unwrap()));
//! assert!(!acl.matches(&"10.0.1.1".parse().unwrap()));
//! ```
//!
//! # Thread Safety
//!
//! [`PrefixTrie`] and [`PrefixSet`] have no internal locking: any number of
//! threads may query them while nobody mutates them. Use [`SharedPrefixSet`]
//! to replace a set while other threads keep querying.

mod endpoint;
mod error;
mod prefix;
mod shared;

pub mod set;
pub mod trie;

// Re-export core types
pub use endpoint::{Endpoint, Family};
pub use error::{Error, Result};
pub use prefix::Prefix;

// Re-export containers
pub use set::{PrefixSet, PrefixSetConfig};
pub use shared::SharedPrefixSet;
pub use trie::{Iter, PrefixTrie};
