//! Bookings, booking requests and payment initiation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::nights_between;
use crate::error::{DomainError, DomainResult};

/// Booking lifecycle status, owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Awaiting host confirmation
    #[default]
    Pending,
    /// Accepted by the host
    Confirmed,
    /// Cancelled by the host
    Cancelled,
    /// Stay finished
    Completed,
}

/// Payment status, owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Not paid yet
    #[default]
    Unpaid,
    /// Paid
    Paid,
    /// Refunded
    Refunded,
}

/// Short property summary embedded in a guest's booking list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingProperty {
    /// Listing id
    pub id: u64,
    /// Listing title
    pub title: String,
    /// City
    pub city: String,
    /// State
    pub state: String,
}

/// Short guest summary embedded in a host's booking list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingGuest {
    /// Guest id
    pub id: u64,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

/// A booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking id
    pub id: u64,
    /// Guest who booked
    pub guest_id: u64,
    /// Booked listing
    pub property_id: u64,
    /// First night
    pub check_in_date: NaiveDate,
    /// Departure day, not a booked night
    pub check_out_date: NaiveDate,
    /// Guest count
    pub num_guests: u32,
    /// Total price computed by the backend
    pub total_price: f64,
    /// Lifecycle status
    #[serde(default)]
    pub status: BookingStatus,
    /// Payment status
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Creation timestamp, as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Listing summary, present in guest listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<BookingProperty>,
    /// Guest summary, present in host listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<BookingGuest>,
}

impl Booking {
    /// Number of nights booked.
    #[must_use]
    pub fn nights(&self) -> i64 {
        nights_between(self.check_in_date, self.check_out_date)
    }

    /// Whether a host action (confirm/cancel) still applies.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, BookingStatus::Pending)
    }
}

/// Envelope returned by booking create, confirm and cancel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookingEnvelope {
    /// Backend message
    #[serde(default)]
    pub message: Option<String>,
    /// Stored booking
    pub booking: Booking,
}

/// Body of `POST /properties/:id/bookings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookingRequest {
    /// First night
    pub check_in_date: NaiveDate,
    /// Departure day
    pub check_out_date: NaiveDate,
    /// Guest count
    pub num_guests: u32,
}

impl BookingRequest {
    /// Creates a booking request.
    #[must_use]
    pub const fn new(check_in_date: NaiveDate, check_out_date: NaiveDate, num_guests: u32) -> Self {
        Self {
            check_in_date,
            check_out_date,
            num_guests,
        }
    }

    /// Number of nights requested.
    #[must_use]
    pub fn nights(&self) -> i64 {
        nights_between(self.check_in_date, self.check_out_date)
    }

    /// Validates the request against `today` and, when known, the listing's
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self, today: NaiveDate, capacity: Option<u32>) -> DomainResult<()> {
        if self.check_out_date <= self.check_in_date {
            return Err(DomainError::InvalidStayRange {
                check_in: self.check_in_date,
                check_out: self.check_out_date,
            });
        }
        if self.check_in_date < today {
            return Err(DomainError::CheckInInPast(self.check_in_date));
        }
        if self.num_guests == 0 {
            return Err(DomainError::NoGuests);
        }
        if let Some(capacity) = capacity
            && self.num_guests > capacity
        {
            return Err(DomainError::TooManyGuests {
                requested: self.num_guests,
                capacity,
            });
        }
        Ok(())
    }
}

/// Response of `POST /bookings/:id/pay`, handed to the external payment popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    /// Hosted checkout URL
    pub authorization_url: String,
    /// Gateway access code
    pub access_code: String,
    /// Transaction reference
    pub reference: String,
}
