use chrono::{DateTime, Local, TimeZone, Utc};

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a Unix timestamp (milliseconds) as `HH:MM:SS` in the local timezone.
///
/// Returns `None` when the value is out of chrono's representable range.
pub fn millis_to_local_clock(millis: i64) -> Option<String> {
    let utc: DateTime<Utc> = Utc.timestamp_millis_opt(millis).single()?;
    Some(utc.with_timezone(&Local).format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_monotonic_enough() {
        let first = now_millis();
        let second = now_millis();
        assert!(second >= first);
    }

    #[test]
    fn test_millis_out_of_range() {
        assert!(millis_to_local_clock(i64::MAX).is_none());
    }

    #[test]
    fn test_millis_to_local_clock_shape() {
        let clock = millis_to_local_clock(now_millis()).unwrap();
        assert_eq!(clock.len(), 8);
        assert_eq!(clock.matches(':').count(), 2);
    }
}
