use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Arbitrary day every slot is projected onto
fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

/// Half-open `[start, end)` interval on the reference timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    /// Anchors a start/end pair `day_offset` days from the reference date
    ///
    /// An end time earlier than the start time rolls over to the next day.
    pub fn anchored(day_offset: i64, inicio: NaiveTime, fin: NaiveTime) -> Self {
        let day = reference_date() + Duration::days(day_offset);
        let start = day.and_time(inicio);
        let mut end = day.and_time(fin);
        if fin < inicio {
            end += Duration::days(1);
        }
        Interval { start, end }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &Interval) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_crossing_midnight_rolls_end() {
        let interval = Interval::anchored(0, t(22, 0), t(2, 0));
        assert_eq!(interval.end - interval.start, Duration::hours(4));
        assert_eq!(interval.end.date(), reference_date() + Duration::days(1));
    }

    #[test]
    fn test_previous_day_anchor() {
        let yesterday = Interval::anchored(-1, t(23, 0), t(1, 0));
        let today = Interval::anchored(0, t(0, 30), t(0, 45));
        assert!(yesterday.overlaps(&today));
        assert!(yesterday.contains(&today));
    }

    #[test]
    fn test_adjacent_intervals_do_not_overlap() {
        let a = Interval::anchored(0, t(9, 0), t(10, 0));
        let b = Interval::anchored(0, t(10, 0), t(11, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }
}
