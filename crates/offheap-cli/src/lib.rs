//! # offheap-cli
//!
//! Report types, terminal and JSON presentation, and shell completion for
//! the `offheap` workload binary.

pub mod completion;
pub mod output;
pub mod presenter;
pub mod report;

pub use presenter::{CliReportPresenter, OutputMode, PresentError};
pub use report::{FreeSpace, PhaseTimings, WorkloadReport};
