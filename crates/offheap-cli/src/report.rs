//! What a workload run measured.

use std::time::Duration;

use offheap_core::{ArenaStats, Chunk, FreeSet};
use serde::Serialize;

/// Shape of the free space at one point of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreeSpace {
    /// Number of disjoint free chunks.
    pub chunks: usize,
    /// Total free bytes.
    pub total: usize,
    /// Size of the largest free chunk, zero when the arena is full.
    pub largest: usize,
}

impl FreeSpace {
    /// Summarize a free set.
    #[must_use]
    pub fn of(free: &FreeSet) -> Self {
        Self {
            chunks: free.len(),
            total: free.total_free(),
            largest: free.largest().as_ref().map_or(0, Chunk::size),
        }
    }
}

/// Wall-clock time spent in each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTimings {
    /// Initial puts.
    #[serde(with = "micros")]
    pub fill: Duration,
    /// Removal of every k-th key.
    #[serde(with = "micros")]
    pub fragment: Duration,
    /// Explicit compaction, zero when skipped.
    #[serde(with = "micros")]
    pub compact: Duration,
    /// Probe put, zero when skipped.
    #[serde(with = "micros")]
    pub probe: Duration,
    /// Read-back of every surviving key.
    #[serde(with = "micros")]
    pub verify: Duration,
}

impl PhaseTimings {
    /// Sum of all phases.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.fill + self.fragment + self.compact + self.probe + self.verify
    }
}

/// Outcome of one workload run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadReport {
    /// Arena size in bytes.
    pub capacity: usize,
    /// Puts attempted during the fill phase.
    pub attempted: usize,
    /// Entries alive at the end of the run.
    pub stored: usize,
    /// Fill puts refused because the arena was exhausted.
    pub rejected: usize,
    /// Entries removed while fragmenting.
    pub removed: usize,
    /// Size of the probe value, if one was put.
    pub probe_size: Option<usize>,
    /// Bytes held by live entries at the end of the run.
    pub used_bytes: usize,
    /// Free space right after fragmenting.
    pub free_before: FreeSpace,
    /// Free space at the end of the run.
    pub free_after: FreeSpace,
    /// Keys whose bytes did not read back as written.
    pub mismatches: usize,
    /// Arena counters at the end of the run.
    pub stats: ArenaStats,
    /// Per-phase durations, serialized in microseconds.
    pub timings: PhaseTimings,
}

mod micros {
    use std::time::Duration;

    use serde::Serializer;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
    }
}
