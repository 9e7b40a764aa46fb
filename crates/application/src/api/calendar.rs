//! Availability calendar.
//!
//! Booked ranges come back from the backend as inclusive date pairs and are
//! expanded into the set of nights a date picker must disable.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use shortlet_domain::{
    ApiRequest, BookedRange, StayEstimate, estimate_stay, expand_booked_dates, stay_conflicts,
};
use tracing::debug;

use super::ShortletApi;
use crate::error::ClientResult;
use crate::ports::HttpTransport;

impl<T: HttpTransport> ShortletApi<T> {
    /// `GET /properties/:id/booked-dates`: raw `{startDate, endDate}` ranges.
    ///
    /// # Errors
    ///
    /// Any client error.
    pub async fn booked_dates(&self, property_id: u64) -> ClientResult<Vec<BookedRange>> {
        self.client
            .send_json(ApiRequest::get(format!(
                "/properties/{property_id}/booked-dates"
            )))
            .await
    }

    /// Every calendar day a date picker must disable for the listing.
    ///
    /// # Errors
    ///
    /// Any client error from [`ShortletApi::booked_dates`].
    pub async fn disabled_dates(&self, property_id: u64) -> ClientResult<BTreeSet<NaiveDate>> {
        let ranges = self.booked_dates(property_id).await?;
        let days = expand_booked_dates(&ranges);
        debug!(property_id, ranges = ranges.len(), days = days.len(), "expanded booked dates");
        Ok(days)
    }

    /// Whether every night of `[check_in, check_out)` is still free.
    ///
    /// # Errors
    ///
    /// Any client error from [`ShortletApi::booked_dates`].
    pub async fn is_available(
        &self,
        property_id: u64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> ClientResult<bool> {
        let disabled = self.disabled_dates(property_id).await?;
        Ok(!stay_conflicts(check_in, check_out, &disabled))
    }

    /// Nights and total price for a prospective stay.
    #[must_use]
    pub fn estimate_stay(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
        price_per_night: f64,
    ) -> Option<StayEstimate> {
        estimate_stay(check_in, check_out, price_per_night)
    }
}
