//! Atomic allocation statistics for lock-free usage tracking.
//!
//! Lookups run under a shared lock, so every counter is an atomic that can be
//! bumped through `&self`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of arena usage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArenaStats {
    /// Successful puts.
    pub puts: u64,
    /// Lookups that found their key.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
    /// Entries removed or replaced.
    pub removes: u64,
    /// Compaction passes that actually ran.
    pub compactions: u64,
    /// Bytes copied while relocating live chunks.
    pub relocated_bytes: u64,
    /// Puts rejected for lack of space.
    pub exhausted: u64,
}

/// Atomic arena statistics for lock-free updates.
pub struct AtomicArenaStats {
    puts: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    removes: AtomicU64,
    compactions: AtomicU64,
    relocated_bytes: AtomicU64,
    exhausted: AtomicU64,
}

impl AtomicArenaStats {
    /// Create new zeroed stats.
    #[must_use]
    pub fn new() -> Self {
        Self {
            puts: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            removes: AtomicU64::new(0),
            compactions: AtomicU64::new(0),
            relocated_bytes: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of current stats.
    pub fn snapshot(&self) -> ArenaStats {
        ArenaStats {
            puts: self.puts.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
            relocated_bytes: self.relocated_bytes.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.puts.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.removes.store(0, Ordering::Relaxed);
        self.compactions.store(0, Ordering::Relaxed);
        self.relocated_bytes.store(0, Ordering::Relaxed);
        self.exhausted.store(0, Ordering::Relaxed);
    }

    /// Increment put counter.
    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment hit or miss counter.
    pub fn record_lookup(&self, found: bool) {
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Increment remove counter.
    pub fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one compaction pass that relocated `bytes` bytes.
    pub fn record_compaction(&self, bytes: u64) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
        self.relocated_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Increment exhaustion counter.
    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AtomicArenaStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AtomicArenaStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.snapshot().fmt(f)
    }
}
