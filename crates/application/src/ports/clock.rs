//! Clock port for time-related operations

use chrono::{DateTime, NaiveDate, Utc};

/// Port for getting the current time.
///
/// Booking validation rejects check-in dates in the past; this abstraction
/// lets tests pin "today".
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
