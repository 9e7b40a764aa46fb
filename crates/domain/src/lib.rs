//! Shortlet Domain - Core booking types
//!
//! This crate defines the domain model for the Shortlet booking client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod booking;
pub mod calendar;
pub mod error;
pub mod property;
pub mod request;
pub mod response;
pub mod review;

pub use auth::{
    AuthTokens, LoginRequest, NewAccount, ProfileUpdate, ProfileUpdateResponse, RefreshResponse,
    SessionCredentials, SessionKey, SignupResponse, UserProfile, UserRole, token_preview,
};
pub use booking::{
    Booking, BookingEnvelope, BookingRequest, BookingStatus, PaymentInitiation, PaymentStatus,
};
pub use calendar::{BookedRange, StayEstimate, estimate_stay, expand_booked_dates, stay_conflicts};
pub use error::{DomainError, DomainResult};
pub use property::{
    ListingPhoto, ListingUpdate, NewListing, Property, PropertyEnvelope, PropertyFilter,
};
pub use request::{ApiRequest, FormPart, FormValue, HttpMethod, RequestBody};
pub use response::ApiResponse;
pub use review::{NewReview, Review, ReviewEnvelope, average_rating};
