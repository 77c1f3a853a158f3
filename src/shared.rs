//! Hot-reloadable prefix set shared between threads.
//!
//! Readers take a snapshot of the current set without locking; writers build
//! a complete replacement off to the side and swap it in atomically. Queries
//! already running keep the set they started with.

use arc_swap::{ArcSwap, Guard};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::set::{PrefixSet, PrefixSetConfig};

/// A [`PrefixSet`] that can be replaced while other threads query it.
///
/// # Example
///
/// ```
/// use nettrie::{PrefixSet, SharedPrefixSet};
///
/// let shared = SharedPrefixSet::new("10.0.0.0/8".parse().unwrap());
/// let addr = "10.1.2.3".parse().unwrap();
/// assert!(shared.matches(&addr));
///
/// shared.replace("!10.0.0.0/8".parse().unwrap());
/// assert!(!shared.matches(&addr));
/// assert_eq!(shared.generation(), 1);
/// ```
pub struct SharedPrefixSet {
    /// The current set, wrapped in ArcSwap for atomic replacement.
    inner: ArcSwap<PrefixSet>,
    /// Serializes writers so read-modify-write updates are not lost.
    writer: Mutex<()>,
    /// Number of swaps performed so far.
    generation: AtomicU64,
}

impl SharedPrefixSet {
    pub fn new(set: PrefixSet) -> Self {
        Self {
            inner: ArcSwap::from_pointee(set),
            writer: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Build the initial set from a configuration.
    pub fn from_config(config: &PrefixSetConfig) -> Result<Self> {
        Ok(Self::new(config.build()?))
    }

    /// Cheap temporary view of the current set, for a single query.
    pub fn load(&self) -> Guard<Arc<PrefixSet>> {
        self.inner.load()
    }

    /// The current set, to hold across several queries.
    pub fn snapshot(&self) -> Arc<PrefixSet> {
        self.inner.load_full()
    }

    /// Whether `address` matches the current set.
    pub fn matches(&self, address: &Endpoint) -> bool {
        self.inner.load().matches(address)
    }

    /// Swap in `set`, returning the one it replaces.
    pub fn replace(&self, set: PrefixSet) -> Arc<PrefixSet> {
        let _guard = self.writer.lock();
        self.swap_in(set)
    }

    /// Copy the current set, apply `f` to the copy and swap it in.
    ///
    /// When `f` fails the current set stays in place.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut PrefixSet) -> Result<()>,
    {
        let _guard = self.writer.lock();
        let mut next = PrefixSet::clone(&self.inner.load());
        f(&mut next)?;
        self.swap_in(next);
        Ok(())
    }

    /// Rebuild the set from `config`. A configuration that fails to build
    /// leaves the current set in place.
    pub fn reload(&self, config: &PrefixSetConfig) -> Result<()> {
        let set = config.build()?;
        self.replace(set);
        log::info!("Hot reloaded prefix set {:?}", config.name);
        Ok(())
    }

    /// Reload from a configuration file.
    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config = PrefixSetConfig::load(path)?;
        self.reload(&config)?;
        log::debug!("Reload source: {:?}", path);
        Ok(())
    }

    /// Number of swaps performed since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn swap_in(&self, set: PrefixSet) -> Arc<PrefixSet> {
        let previous = self.inner.swap(Arc::new(set));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!(
            "Prefix set replaced: {} -> {} entries (generation {})",
            previous.len(),
            self.inner.load().len(),
            generation
        );
        previous
    }
}

impl Default for SharedPrefixSet {
    fn default() -> Self {
        Self::new(PrefixSet::new())
    }
}

impl From<PrefixSet> for SharedPrefixSet {
    fn from(set: PrefixSet) -> Self {
        Self::new(set)
    }
}
