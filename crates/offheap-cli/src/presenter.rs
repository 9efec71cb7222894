//! Terminal and JSON presentation of a [`WorkloadReport`].

use std::fmt::Write as _;
use std::io;

use crate::output::{format_bytes, format_duration, format_number, percent};
use crate::report::{FreeSpace, WorkloadReport};

/// How a report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Multi-line human summary.
    Human,
    /// Single JSON document.
    Json,
    /// One `key=value` line.
    Quiet,
}

/// Failure while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    /// The report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    /// The output stream refused the write.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Prints workload reports to a writer.
#[derive(Debug, Clone, Copy)]
pub struct CliReportPresenter {
    mode: OutputMode,
}

impl CliReportPresenter {
    #[must_use]
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Pick the mode from the `--json` and `--quiet` flags; JSON wins.
    #[must_use]
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        let mode = match (json, quiet) {
            (true, _) => OutputMode::Json,
            (false, true) => OutputMode::Quiet,
            (false, false) => OutputMode::Human,
        };
        Self::new(mode)
    }

    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Render `report` as text in the configured mode.
    pub fn render(&self, report: &WorkloadReport) -> Result<String, PresentError> {
        Ok(match self.mode {
            OutputMode::Json => serde_json::to_string_pretty(report)?,
            OutputMode::Quiet => format!(
                "stored={} rejected={} mismatches={} free_chunks={}",
                report.stored, report.rejected, report.mismatches, report.free_after.chunks
            ),
            OutputMode::Human => render_human(report),
        })
    }

    /// Write `report` followed by a newline.
    pub fn present(
        &self,
        report: &WorkloadReport,
        out: &mut dyn io::Write,
    ) -> Result<(), PresentError> {
        let text = self.render(report)?;
        writeln!(out, "{text}")?;
        Ok(())
    }

    /// Report a fatal error on stderr.
    pub fn present_error(&self, error: &str) {
        if self.mode == OutputMode::Json {
            eprintln!("{}", serde_json::json!({ "error": error }));
        } else {
            eprintln!("Error: {error}");
        }
    }
}

fn free_line(label: &str, free: &FreeSpace) -> String {
    format!(
        "{label:<14}{} in {} chunk(s), largest {}",
        format_bytes(free.total),
        format_number(free.chunks as u64),
        format_bytes(free.largest)
    )
}

fn render_human(report: &WorkloadReport) -> String {
    let mut s = String::new();
    // writing into a String cannot fail
    let _ = writeln!(s, "Arena:        {}", format_bytes(report.capacity));
    let _ = writeln!(
        s,
        "Entries:      {} stored, {} rejected, {} removed (of {} attempted)",
        format_number(report.stored as u64),
        format_number(report.rejected as u64),
        format_number(report.removed as u64),
        format_number(report.attempted as u64),
    );
    let _ = writeln!(
        s,
        "Used:         {} ({:.1}%)",
        format_bytes(report.used_bytes),
        percent(report.used_bytes, report.capacity)
    );
    let _ = writeln!(s, "{}", free_line("Free before:", &report.free_before));
    let _ = writeln!(s, "{}", free_line("Free after:", &report.free_after));
    if let Some(size) = report.probe_size {
        let _ = writeln!(s, "Probe:        {} stored", format_bytes(size));
    }
    let stats = &report.stats;
    let _ = writeln!(
        s,
        "Compactions:  {} ({} relocated)",
        format_number(stats.compactions),
        format_bytes(usize::try_from(stats.relocated_bytes).unwrap_or(usize::MAX))
    );
    let _ = writeln!(
        s,
        "Lookups:      {} hits, {} misses",
        format_number(stats.hits),
        format_number(stats.misses)
    );
    let t = &report.timings;
    let _ = writeln!(
        s,
        "Timings:      total {} (fill {}, fragment {}, compact {}, probe {}, verify {})",
        format_duration(t.total()),
        format_duration(t.fill),
        format_duration(t.fragment),
        format_duration(t.compact),
        format_duration(t.probe),
        format_duration(t.verify)
    );
    let verdict = if report.mismatches == 0 {
        "OK".to_string()
    } else {
        format!("{} MISMATCH(ES)", report.mismatches)
    };
    let _ = write!(s, "Verify:       {verdict}");
    s
}
