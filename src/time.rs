/// Time utilities for message scheduling metadata.
///
/// `scheduled_time` values travel inside signed envelopes, so the format
/// must match what the counterpart node emits: RFC 3339 UTC with
/// millisecond precision and a literal `Z` suffix,
/// e.g. `2024-01-18T22:05:17.185Z`.

/// Returns the current UTC time formatted for `external_metadata.scheduled_time`.
pub fn now_scheduled_time() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_time_format() {
        let ts = now_scheduled_time();
        // 2024-01-18T22:05:17.185Z
        assert_eq!(ts.len(), 24, "unexpected timestamp shape: {}", ts);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn test_now_timestamp_is_reasonable() {
        let ts = now_timestamp();
        // Should be after 2024-01-01 (1704067200)
        assert!(ts > 1704067200, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 (4102444800)
        assert!(ts < 4102444800, "Timestamp {} is too far in future", ts);
    }
}
