//! offheap library: configuration and workload logic behind the `offheap` binary.

pub mod app;
pub mod config;
pub mod errors;
pub mod version;
