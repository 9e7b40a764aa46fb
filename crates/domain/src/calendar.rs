//! Booking calendar support.
//!
//! The backend reports occupied stays as half-open ranges: `startDate` is the
//! first booked night and `endDate` is the departure day, which stays free
//! for the next guest's check-in.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One occupied stay from `GET /properties/:id/booked-dates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookedRange {
    /// First occupied day
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    /// First day that is not occupied
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}

impl BookedRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Returns false for ranges with `end_date <= start_date`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.end_date > self.start_date
    }

    /// Iterates over the occupied days, `end_date` excluded.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |day| *day < self.end_date)
    }
}

/// Expands booked ranges into the set of calendar days to disable.
///
/// Malformed ranges (`end_date <= start_date`) contribute nothing. Overlaps
/// collapse into a single entry per day.
#[must_use]
pub fn expand_booked_dates(ranges: &[BookedRange]) -> BTreeSet<NaiveDate> {
    ranges
        .iter()
        .filter(|range| range.is_well_formed())
        .flat_map(BookedRange::days)
        .collect()
}

/// Whole nights between check-in and check-out; zero or negative when the
/// stay is empty or reversed.
#[must_use]
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

/// True if any night of the stay `[check_in, check_out)` is disabled.
#[must_use]
pub fn stay_conflicts(
    check_in: NaiveDate,
    check_out: NaiveDate,
    disabled: &BTreeSet<NaiveDate>,
) -> bool {
    check_out > check_in && disabled.range(check_in..check_out).next().is_some()
}

/// Price estimate shown before a booking request is sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StayEstimate {
    /// Nights in the stay
    pub nights: u32,
    /// `nights * price_per_night`
    pub total_price: f64,
}

/// Estimates a stay; `None` unless check-out is after check-in.
#[must_use]
pub fn estimate_stay(
    check_in: NaiveDate,
    check_out: NaiveDate,
    price_per_night: f64,
) -> Option<StayEstimate> {
    let nights = u32::try_from(nights_between(check_in, check_out)).ok()?;
    if nights == 0 {
        return None;
    }
    Some(StayEstimate {
        nights,
        total_price: f64::from(nights) * price_per_night,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(start: &str, end: &str) -> BookedRange {
        BookedRange::new(date(start), date(end))
    }

    #[test]
    fn test_end_date_is_excluded() {
        let days = expand_booked_dates(&[range("2024-01-10", "2024-01-13")]);
        let expected: BTreeSet<_> = [date("2024-01-10"), date("2024-01-11"), date("2024-01-12")]
            .into_iter()
            .collect();
        assert_eq!(days, expected);
    }

    #[test]
    fn test_malformed_ranges_contribute_nothing() {
        assert!(expand_booked_dates(&[range("2024-01-13", "2024-01-10")]).is_empty());
        assert!(expand_booked_dates(&[range("2024-01-10", "2024-01-10")]).is_empty());

        let days = expand_booked_dates(&[
            range("2024-01-13", "2024-01-10"),
            range("2024-02-01", "2024-02-02"),
        ]);
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn test_overlapping_ranges_are_deduplicated() {
        let days = expand_booked_dates(&[
            range("2024-01-10", "2024-01-13"),
            range("2024-01-12", "2024-01-15"),
        ]);
        assert_eq!(days.len(), 5);
        assert_eq!(days.first(), Some(&date("2024-01-10")));
        assert_eq!(days.last(), Some(&date("2024-01-14")));
    }

    #[test]
    fn test_range_crosses_month_boundary() {
        let days = expand_booked_dates(&[range("2024-02-28", "2024-03-02")]);
        assert_eq!(days.len(), 3); // 2024 is a leap year
        assert!(days.contains(&date("2024-02-29")));
    }

    #[test]
    fn test_booked_range_wire_format() {
        let ranges: Vec<BookedRange> =
            serde_json::from_str(r#"[{"startDate": "2024-01-10", "endDate": "2024-01-13"}]"#)
                .unwrap();
        assert_eq!(ranges, vec![range("2024-01-10", "2024-01-13")]);
    }

    #[test]
    fn test_stay_conflicts() {
        let disabled = expand_booked_dates(&[range("2024-01-10", "2024-01-13")]);
        // Checking in on the previous guest's departure day is fine.
        assert!(!stay_conflicts(date("2024-01-13"), date("2024-01-15"), &disabled));
        // Checking out on the next guest's arrival day is fine.
        assert!(!stay_conflicts(date("2024-01-08"), date("2024-01-10"), &disabled));
        assert!(stay_conflicts(date("2024-01-08"), date("2024-01-11"), &disabled));
    }

    #[test]
    fn test_estimate_stay() {
        let estimate = estimate_stay(date("2024-01-10"), date("2024-01-13"), 45000.0).unwrap();
        assert_eq!(estimate.nights, 3);
        assert!((estimate.total_price - 135_000.0).abs() < f64::EPSILON);
        assert!(estimate_stay(date("2024-01-10"), date("2024-01-10"), 45000.0).is_none());
        assert!(estimate_stay(date("2024-01-13"), date("2024-01-10"), 45000.0).is_none());
    }
}
