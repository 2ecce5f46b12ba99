//! Timestamp helpers shared across the import engine.

use time::OffsetDateTime;

/// Returns the current UTC time.
///
/// Centralized so that tests can eventually swap in a fixed clock without
/// touching call sites.
#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_utc_is_recent() {
        let t = now_utc();
        assert!(t.unix_timestamp() > 0);
    }
}
