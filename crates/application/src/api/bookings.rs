//! Booking requests, host confirmation, cancellation and payment.

use shortlet_domain::{
    ApiRequest, Booking, BookingEnvelope, BookingRequest, PaymentInitiation, Property, RequestBody,
};
use tracing::info;

use super::ShortletApi;
use crate::error::ClientResult;
use crate::ports::HttpTransport;

impl<T: HttpTransport> ShortletApi<T> {
    /// `POST /properties/:id/bookings`.
    ///
    /// Check-in may not be before today and check-out must follow check-in.
    ///
    /// # Errors
    ///
    /// Validation failures are raised before sending; a date clash is reported
    /// by the backend as [`crate::ClientError::Remote`].
    pub async fn create_booking(
        &self,
        property_id: u64,
        request: BookingRequest,
    ) -> ClientResult<Booking> {
        request.validate(self.clock.today(), None)?;
        self.submit_booking(property_id, request).await
    }

    /// Like [`ShortletApi::create_booking`], also checking the guest count
    /// against the listing's capacity.
    ///
    /// # Errors
    ///
    /// As [`ShortletApi::create_booking`].
    pub async fn request_booking(
        &self,
        property: &Property,
        request: BookingRequest,
    ) -> ClientResult<Booking> {
        request.validate(self.clock.today(), Some(property.max_guests))?;
        self.submit_booking(property.id, request).await
    }

    async fn submit_booking(&self, property_id: u64, request: BookingRequest) -> ClientResult<Booking> {
        let http = ApiRequest::post(format!("/properties/{property_id}/bookings"))
            .with_body(RequestBody::json(&request)?);
        let BookingEnvelope { booking, .. } = self.client.send_json(http).await?;
        info!(
            booking_id = booking.id,
            property_id,
            nights = booking.nights(),
            "booking requested"
        );
        Ok(booking)
    }

    /// `GET /my-bookings`: the guest's own bookings.
    ///
    /// # Errors
    ///
    /// Any client error.
    pub async fn my_bookings(&self) -> ClientResult<Vec<Booking>> {
        self.client.send_json(ApiRequest::get("/my-bookings")).await
    }

    /// `GET /host/bookings`: bookings on the host's listings.
    ///
    /// # Errors
    ///
    /// Any client error.
    pub async fn host_bookings(&self) -> ClientResult<Vec<Booking>> {
        self.client.send_json(ApiRequest::get("/host/bookings")).await
    }

    /// `PATCH /host/bookings/:id/confirm`.
    ///
    /// # Errors
    ///
    /// The backend answers 409 when the booking is not pending.
    pub async fn confirm_booking(&self, booking_id: u64) -> ClientResult<Booking> {
        self.host_action(booking_id, "confirm").await
    }

    /// `PATCH /host/bookings/:id/cancel`.
    ///
    /// # Errors
    ///
    /// The backend answers 409 when the booking can no longer be cancelled.
    pub async fn cancel_booking(&self, booking_id: u64) -> ClientResult<Booking> {
        self.host_action(booking_id, "cancel").await
    }

    async fn host_action(&self, booking_id: u64, action: &str) -> ClientResult<Booking> {
        let request = ApiRequest::patch(format!("/host/bookings/{booking_id}/{action}"));
        let BookingEnvelope { booking, .. } = self.client.send_json(request).await?;
        info!(booking_id, action, status = ?booking.status, "host action applied");
        Ok(booking)
    }

    /// `POST /bookings/:id/pay`: starts a checkout with the payment gateway.
    ///
    /// # Errors
    ///
    /// The backend answers 409 when the booking cannot be paid for.
    pub async fn initiate_payment(&self, booking_id: u64) -> ClientResult<PaymentInitiation> {
        let payment: PaymentInitiation = self
            .client
            .send_json(ApiRequest::post(format!("/bookings/{booking_id}/pay")))
            .await?;
        info!(booking_id, reference = %payment.reference, "payment initiated");
        Ok(payment)
    }
}
