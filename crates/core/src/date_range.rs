//! Calendar primitives shared by the store and the forecasting jobs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DemandError, DemandResult};

/// Inclusive calendar date range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range; `start` must not come after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DemandResult<Self> {
        if start > end {
            return Err(DemandError::validation(format!(
                "date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Single-day range.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of days covered (inclusive, so at least 1).
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterate the covered dates in ascending order.
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        self.start.iter_days().take(self.len_days() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange::new(d("2024-02-02"), d("2024-02-01")).unwrap_err();
        assert!(matches!(err, DemandError::Validation(_)));
    }

    #[test]
    fn single_day_contains_only_itself() {
        let r = DateRange::single(d("2024-03-01"));
        assert!(r.contains(d("2024-03-01")));
        assert!(!r.contains(d("2024-03-02")));
        assert_eq!(r.len_days(), 1);
    }

    #[test]
    fn iter_days_covers_both_endpoints() {
        let r = DateRange::new(d("2024-01-30"), d("2024-02-02")).unwrap();
        let days: Vec<_> = r.iter_days().collect();
        assert_eq!(
            days,
            vec![d("2024-01-30"), d("2024-01-31"), d("2024-02-01"), d("2024-02-02")]
        );
    }
}
