//! Arena size parsing.

use crate::error::{CacheError, Result};

/// Parse an arena size such as `"64K"`, `"16M"`, `"1G"`, `"512B"` or `"4096"`.
///
/// Suffixes are binary (`K` = 1024) and case-insensitive. Zero is rejected
/// since an arena must hold at least one byte.
pub fn parse_capacity(s: &str) -> Result<usize> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CacheError::InvalidArgument("empty capacity".into()));
    }

    let upper = s.to_ascii_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix('G') {
        (n, 1usize << 30)
    } else if let Some(n) = upper.strip_suffix('M') {
        (n, 1 << 20)
    } else if let Some(n) = upper.strip_suffix('K') {
        (n, 1 << 10)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let value: usize = digits
        .trim()
        .parse()
        .map_err(|e| CacheError::InvalidArgument(format!("invalid capacity {s:?}: {e}")))?;
    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| CacheError::InvalidArgument(format!("capacity {s:?} overflows usize")))?;
    if bytes == 0 {
        return Err(CacheError::InvalidArgument(
            "capacity must be at least one byte".into(),
        ));
    }
    Ok(bytes)
}
