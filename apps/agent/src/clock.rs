use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// IANA name reported to clients. All timestamps are produced in this zone.
pub const TIMEZONE_NAME: &str = "Asia/Shanghai";

const UTC_OFFSET_SECS: i32 = 8 * 3600;

/// The fixed UTC+8 offset used for every timestamp the agent creates.
pub fn shanghai() -> FixedOffset {
    FixedOffset::east_opt(UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Source of "now". Injected wherever a timestamp is stamped so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock converted to UTC+8 at the point of creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&shanghai())
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_clock_uses_plus_eight() {
        let now = SystemClock.now();
        assert_eq!(now.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_today_follows_shanghai_date() {
        // 2024-05-01 20:00 UTC is already 2024-05-02 in UTC+8.
        let utc = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();
        let clock = FixedClock(utc.with_timezone(&shanghai()));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }
}
