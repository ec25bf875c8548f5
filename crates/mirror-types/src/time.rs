//! Wall-clock helpers. Kept in one place so every crate agrees on what
//! "now" means and none of them panic on a clock-before-epoch platform.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in milliseconds. Never panics; returns 0 if the
/// system clock somehow reads before the epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Current Unix time in whole seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Floors a millisecond timestamp down to its containing hour-epoch,
/// used to key the block-counter's hourly buckets.
pub fn hour_bucket(ms: i64) -> i64 {
    ms.div_euclid(3_600_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_bucket_floors() {
        assert_eq!(hour_bucket(0), 0);
        assert_eq!(hour_bucket(3_599_999), 0);
        assert_eq!(hour_bucket(3_600_000), 1);
    }

    #[test]
    fn now_ms_is_positive_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
