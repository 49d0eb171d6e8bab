use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

const UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Source of "now". Calendar dates are taken in UTC+8 to match the agent.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        match FixedOffset::east_opt(UTC_OFFSET_SECS) {
            Some(offset) => self.now().with_timezone(&offset).date_naive(),
            None => self.now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_today_rolls_over_at_utc_sixteen() {
        let before = FixedClock(Utc.with_ymd_and_hms(2024, 6, 9, 15, 59, 0).unwrap());
        let after = FixedClock(Utc.with_ymd_and_hms(2024, 6, 9, 16, 0, 0).unwrap());
        assert_eq!(before.today(), NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
        assert_eq!(after.today(), NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }
}
