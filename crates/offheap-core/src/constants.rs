//! Defaults and process exit codes.

/// Arena size used when none is configured.
pub const DEFAULT_CAPACITY: &str = "64K";

/// Exit codes of the `offheap` binary.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// A store could not fit in the arena, even after compaction.
    pub const ERROR_CAPACITY: i32 = 2;
    /// A value read back did not match what was stored.
    pub const ERROR_MISMATCH: i32 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
}
