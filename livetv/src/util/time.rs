use chrono::{DateTime, TimeZone, Utc};

/// Get the current time as a UTC datetime.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a millisecond epoch into a datetime. `0` and negative values mean "never".
pub fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms).single()
}

/// Convert an optional datetime into a millisecond epoch, `0` for "never".
pub fn to_epoch_millis(at: Option<DateTime<Utc>>) -> i64 {
    at.map(|dt| dt.timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_millis_round_trip() {
        let dt = from_epoch_millis(1770526800123).unwrap();
        assert_eq!(dt.timestamp(), 1770526800);
        assert_eq!(to_epoch_millis(Some(dt)), 1770526800123);
    }

    #[test]
    fn test_zero_means_never() {
        assert!(from_epoch_millis(0).is_none());
        assert!(from_epoch_millis(-5).is_none());
        assert_eq!(to_epoch_millis(None), 0);
    }
}
