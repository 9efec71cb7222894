//! Application entry point and the fill / fragment / compact workload.

use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info};

use offheap_cli::presenter::CliReportPresenter;
use offheap_cli::report::{FreeSpace, PhaseTimings, WorkloadReport};
use offheap_core::{CacheError, CompactableMap, SharedArenaMap};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::version::full_version;

/// A validated workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// Arena size in bytes.
    pub capacity: usize,
    /// Keys put while filling.
    pub entries: usize,
    /// Bytes per filled value.
    pub value_size: usize,
    /// Remove every k-th key after filling; 0 keeps all.
    pub remove_every: usize,
    /// Compact explicitly after fragmenting.
    pub compact: bool,
    /// Size of the probe value put after fragmenting.
    pub probe_size: Option<usize>,
}

/// Deterministic bytes for `key`, so verification needs no copy of what was written.
#[must_use]
pub fn value_for(key: u64, len: usize) -> Vec<u8> {
    let seed = key.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    (0..len as u64)
        .map(|i| (seed.wrapping_add(i.wrapping_mul(31)) >> 24) as u8)
        .collect()
}

impl Workload {
    /// Run every phase against a fresh arena.
    ///
    /// Fill puts that do not fit are counted, not fatal. Nothing is freed
    /// while filling, so the first rejection stands for every remaining key. A probe that does
    /// not fit, even after compaction, fails the run. Verification mismatches
    /// are reported, leaving the caller to decide the exit status.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self) -> Result<WorkloadReport, AppError> {
        let map = SharedArenaMap::<u64>::new(self.capacity)?;
        let mut timings = PhaseTimings::default();
        let fits = self.capacity.checked_div(self.value_size).unwrap_or(0);
        let mut live: Vec<(u64, usize)> = Vec::with_capacity(self.entries.min(fits));

        let start = Instant::now();
        let mut rejected = 0;
        for key in 0..self.entries as u64 {
            match map.put(key, &value_for(key, self.value_size)) {
                Ok(_) => live.push((key, self.value_size)),
                Err(CacheError::CapacityExceeded { .. }) => {
                    rejected = self.entries - live.len();
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
        timings.fill = start.elapsed();
        debug!(stored = live.len(), rejected, "fill done");

        let start = Instant::now();
        let mut removed = 0;
        if self.remove_every > 0 {
            let every = self.remove_every as u64;
            let mut kept = Vec::with_capacity(live.len());
            for (key, len) in live {
                if key % every == 0 {
                    map.remove(&key)?;
                    removed += 1;
                } else {
                    kept.push((key, len));
                }
            }
            live = kept;
        }
        timings.fragment = start.elapsed();
        let free_before = FreeSpace::of(map.read().free_chunks());
        debug!(removed, free_chunks = free_before.chunks, "fragment done");

        if self.compact {
            let start = Instant::now();
            map.compact()?;
            timings.compact = start.elapsed();
        }

        if let Some(size) = self.probe_size {
            let start = Instant::now();
            let key = self.entries as u64;
            map.put(key, &value_for(key, size))
                .map_err(|source| match source {
                    CacheError::CapacityExceeded { .. } => AppError::Capacity {
                        requested: size,
                        source,
                    },
                    other => AppError::Cache(other),
                })?;
            live.push((key, size));
            timings.probe = start.elapsed();
        }

        let start = Instant::now();
        let mismatches = live
            .iter()
            .filter(|(key, len)| map.get(key) != Some(value_for(*key, *len)))
            .count();
        timings.verify = start.elapsed();

        let arena = map.read();
        Ok(WorkloadReport {
            capacity: self.capacity,
            attempted: self.entries,
            stored: arena.len(),
            rejected,
            removed,
            probe_size: self.probe_size,
            used_bytes: arena.used_bytes(),
            free_before,
            free_after: FreeSpace::of(arena.free_chunks()),
            mismatches,
            stats: arena.stats(),
            timings,
        })
    }
}

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        offheap_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    let workload = config.workload()?;
    info!(
        version = %full_version(),
        capacity = workload.capacity,
        entries = workload.entries,
        "starting workload"
    );

    let report = workload.execute()?;
    let presenter = CliReportPresenter::from_flags(config.json, config.quiet);
    presenter.present(&report, &mut std::io::stdout().lock())?;

    if report.mismatches > 0 {
        return Err(AppError::Mismatch(report.mismatches).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Workload {
        Workload {
            capacity: 1024,
            entries: 16,
            value_size: 32,
            remove_every: 2,
            compact: false,
            probe_size: None,
        }
    }

    #[test]
    fn value_for_is_deterministic_and_key_dependent() {
        assert_eq!(value_for(7, 16), value_for(7, 16));
        assert_ne!(value_for(7, 16), value_for(8, 16));
        assert_eq!(value_for(3, 5).len(), 5);
    }

    #[test]
    fn fill_and_fragment() {
        let report = workload().execute().unwrap();
        assert_eq!(report.rejected, 0);
        assert_eq!(report.removed, 8);
        assert_eq!(report.stored, 8);
        assert_eq!(report.used_bytes, 8 * 32);
        assert_eq!(report.free_before.chunks, 9);
        assert_eq!(report.mismatches, 0);
    }

    #[test]
    fn overfill_counts_rejections() {
        let report = Workload {
            entries: 40,
            remove_every: 0,
            ..workload()
        }
        .execute()
        .unwrap();
        assert_eq!(report.stored, 32);
        assert_eq!(report.rejected, 8);
        assert_eq!(report.stats.exhausted, 1);
        assert_eq!(report.free_after.chunks, 0);
    }

    #[test]
    fn huge_entry_count_stops_at_first_rejection() {
        let report = Workload {
            capacity: 16,
            entries: usize::MAX,
            value_size: 8,
            remove_every: 0,
            compact: false,
            probe_size: None,
        }
        .execute()
        .unwrap();
        assert_eq!(report.stored, 2);
        assert_eq!(report.rejected, usize::MAX - 2);
        assert_eq!(report.stats.exhausted, 1);
        assert_eq!(report.mismatches, 0);
    }

    #[test]
    fn explicit_compaction_leaves_one_free_chunk() {
        let report = Workload {
            compact: true,
            ..workload()
        }
        .execute()
        .unwrap();
        assert_eq!(report.free_after.chunks, 1);
        assert_eq!(report.stats.compactions, 1);
        assert_eq!(report.mismatches, 0);
    }

    #[test]
    fn probe_triggers_compaction() {
        // 16 x 32 fills half; removing evens leaves 8 holes of 32 below a 512-byte tail
        let report = Workload {
            probe_size: Some(700),
            ..workload()
        }
        .execute()
        .unwrap();
        assert_eq!(report.stats.compactions, 1);
        assert_eq!(report.stored, 9);
        assert_eq!(report.used_bytes, 8 * 32 + 700);
        assert_eq!(report.mismatches, 0);
    }

    #[test]
    fn probe_too_large_fails_with_capacity() {
        let err = Workload {
            probe_size: Some(1000),
            ..workload()
        }
        .execute()
        .unwrap_err();
        assert!(matches!(err, AppError::Capacity { requested: 1000, .. }));
        assert_eq!(err.exit_code(), offheap_core::exit_codes::ERROR_CAPACITY);
    }
}
