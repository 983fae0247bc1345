use chrono::{DateTime, Datelike, TimeZone, Weekday};

/// A trait representing the weekend concept.
pub trait Weekend {
    /// Determines if a given date is a weekend.
    ///
    /// Returns `true` if the date is on a Saturday or Sunday, and `false` otherwise.
    fn is_weekend(&self) -> bool;
}

impl<Tz: TimeZone> Weekend for DateTime<Tz> {
    fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Asia::Kolkata;

    use super::*;

    #[test]
    fn test_is_weekend() {
        // 2026-08-08 是星期六
        let saturday = Kolkata.with_ymd_and_hms(2026, 8, 8, 10, 0, 0).unwrap();
        let thursday = Kolkata.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap();

        assert!(saturday.is_weekend());
        assert!(!thursday.is_weekend());
    }
}
