//! Version information.

/// Crate version.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Version with target platform, logged at startup.
#[must_use]
pub fn full_version() -> String {
    format!(
        "offheap {} ({}-{})",
        version(),
        std::env::consts::ARCH,
        std::env::consts::OS
    )
}
