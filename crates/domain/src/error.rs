//! Domain error types

use chrono::NaiveDate;
use thiserror::Error;

/// Domain-level errors raised by client-side validation.
///
/// These are detected before any network call is made and are meant to be
/// surfaced inline next to the offending form field.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A required field was left empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The email address is not well formed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The password is shorter than the minimum length.
    #[error("password must be at least {min} characters long")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },

    /// Check-out is on or before check-in.
    #[error("check-out date {check_out} must be after check-in date {check_in}")]
    InvalidStayRange {
        /// Requested check-in date.
        check_in: NaiveDate,
        /// Requested check-out date.
        check_out: NaiveDate,
    },

    /// Check-in lies before today.
    #[error("check-in date {0} cannot be in the past")]
    CheckInInPast(NaiveDate),

    /// The guest count is zero.
    #[error("number of guests must be at least 1")]
    NoGuests,

    /// The guest count exceeds what the listing accepts.
    #[error("number of guests ({requested}) exceeds property capacity ({capacity})")]
    TooManyGuests {
        /// Requested number of guests.
        requested: u32,
        /// Listing capacity.
        capacity: u32,
    },

    /// A review rating outside 1..=5.
    #[error("invalid rating {0}: must be an integer between 1 and 5")]
    InvalidRating(u8),

    /// A price that is negative or not a number.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// A price filter whose minimum exceeds its maximum.
    #[error("minimum price {min} exceeds maximum price {max}")]
    InvalidPriceRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// An update that carries no fields.
    #[error("no fields provided for update")]
    EmptyUpdate,
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
