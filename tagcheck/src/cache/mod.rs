//! Build-wide symbol → tag cache
//!
//! Units are checked one at a time, but a unit may call members defined
//! in a unit checked earlier. Exported members are published here once
//! resolved. The cache lives for one build:
//!
//! - `begin_build` clears it,
//! - `check_unit` writes to it,
//! - `seal` makes it read-only once the build is finished.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ast::SymbolId;
use crate::resolve::ResolvedTag;

/// Cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub writes: usize,
    /// Writes dropped because the cache was sealed
    pub rejected_writes: usize,
}

/// Resolved tags of exported members, keyed by symbol
#[derive(Debug, Default)]
pub struct TagCache {
    entries: BTreeMap<SymbolId, ResolvedTag>,
    sealed: bool,
    stats: CacheStats,
}

impl TagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache shareable between checker instances.
    pub fn shared() -> SharedTagCache {
        SharedTagCache::new(Self::new())
    }

    /// Start a fresh build: drop every entry and accept writes again.
    pub fn begin_build(&mut self) {
        self.entries.clear();
        self.sealed = false;
        self.stats = CacheStats::default();
    }

    /// Finish the build; later writes are rejected.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn get(&self, symbol: &SymbolId) -> Option<ResolvedTag> {
        self.entries.get(symbol).copied()
    }

    /// Publish a resolved tag. Returns `false` if the cache is sealed.
    ///
    /// Re-publishing a symbol (a unit checked twice in one build)
    /// replaces the earlier entry.
    pub fn insert(&mut self, symbol: SymbolId, tag: ResolvedTag) -> bool {
        if self.sealed {
            self.stats.rejected_writes += 1;
            tracing::warn!(%symbol, "tag cache is sealed; dropping write");
            return false;
        }
        self.stats.writes += 1;
        self.entries.insert(symbol, tag);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// All entries in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&SymbolId, &ResolvedTag)> {
        self.entries.iter()
    }
}

/// A [`TagCache`] behind a single-writer lock, for hosts that check
/// several units in parallel. Readers block while a unit publishes.
#[derive(Debug, Clone, Default)]
pub struct SharedTagCache {
    inner: Arc<RwLock<TagCache>>,
}

impl SharedTagCache {
    pub fn new(cache: TagCache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    /// A poisoned lock only means another unit panicked mid-write; the
    /// map itself is still usable.
    pub fn read(&self) -> RwLockReadGuard<'_, TagCache> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TagCache> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
