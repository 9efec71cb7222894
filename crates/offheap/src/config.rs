//! Application configuration from CLI flags and environment.

use clap::Parser;
use offheap_core::{exit_codes, parse_capacity, DEFAULT_CAPACITY};

use crate::app::Workload;
use crate::errors::AppError;

/// offheap: exercise a fixed-capacity arena cache with a fill, fragment and compact workload.
#[derive(Parser, Debug, Clone)]
#[command(name = "offheap", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Arena size, e.g. "64K", "16M", "4096".
    #[arg(long, default_value = DEFAULT_CAPACITY, env = "OFFHEAP_CAPACITY")]
    pub capacity: String,

    /// Number of keys to put while filling.
    #[arg(short, long, default_value = "256", env = "OFFHEAP_ENTRIES")]
    pub entries: usize,

    /// Size in bytes of every filled value.
    #[arg(long, default_value = "128", env = "OFFHEAP_VALUE_SIZE")]
    pub value_size: usize,

    /// Remove every k-th key after filling (0 keeps all).
    #[arg(long, default_value = "2")]
    pub remove_every: usize,

    /// Compact explicitly after fragmenting.
    #[arg(long)]
    pub compact: bool,

    /// Put one value of this many bytes after fragmenting (0 skips the probe).
    #[arg(long, default_value = "0")]
    pub probe_size: usize,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Print a single summary line.
    #[arg(short, long)]
    pub quiet: bool,

    /// Log allocation and compaction events at debug level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments, exiting with the configuration exit code on bad input.
    #[must_use]
    pub fn parse() -> Self {
        match <Self as Parser>::try_parse() {
            Ok(config) => config,
            Err(err) => {
                let code = if err.use_stderr() {
                    exit_codes::ERROR_CONFIG
                } else {
                    exit_codes::SUCCESS
                };
                // help and version go to stdout, usage errors to stderr
                let _ = err.print();
                std::process::exit(code);
            }
        }
    }

    /// Validate the flags into a runnable workload.
    pub fn workload(&self) -> Result<Workload, AppError> {
        let capacity = parse_capacity(&self.capacity)
            .map_err(|e| AppError::Config(format!("--capacity: {e}")))?;
        if self.value_size == 0 {
            return Err(AppError::Config(
                "--value-size must be at least 1".into(),
            ));
        }
        Ok(Workload {
            capacity,
            entries: self.entries,
            value_size: self.value_size,
            remove_every: self.remove_every,
            compact: self.compact,
            probe_size: (self.probe_size > 0).then_some(self.probe_size),
        })
    }
}
