use chrono::{DateTime, Utc};

use crate::config::TimestampUnit;

/// Converts a contract timestamp in `unit` to a UTC instant.
pub fn timestamp_to_datetime(raw: u64, unit: TimestampUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimestampUnit::Milliseconds => DateTime::<Utc>::from_timestamp_millis(i64::try_from(raw).ok()?),
        TimestampUnit::Nanoseconds => Some(DateTime::<Utc>::from_timestamp_nanos(i64::try_from(raw).ok()?)),
    }
}

/// Day-first rendering used for stake start times.
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_datetime() {
        let at = timestamp_to_datetime(1_650_000_000_000, TimestampUnit::Milliseconds).unwrap();
        assert_eq!(format_datetime(&at), "15/04/2022 05:20 UTC");
    }

    #[test]
    fn test_units_agree() {
        let millis = timestamp_to_datetime(1_650_000_000_000, TimestampUnit::Milliseconds).unwrap();
        let nanos =
            timestamp_to_datetime(1_650_000_000_000_000_000, TimestampUnit::Nanoseconds).unwrap();
        assert_eq!(millis, nanos);
        assert!(timestamp_to_datetime(u64::MAX, TimestampUnit::Milliseconds).is_none());
    }
}
