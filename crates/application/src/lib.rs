//! Shortlet Application - Session-aware API client
//!
//! This crate holds everything between the domain types and the network:
//! the ports adapters implement, the authenticated client with its token
//! refresh protocol, the session holder, and the typed API facade.

pub mod api;
pub mod auth;
pub mod error;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use api::ShortletApi;
pub use auth::{
    AuthenticatedClient, EventNotifier, InMemoryTokenStore, RefreshPolicy, SessionEvent,
    SessionEvents, SessionHolder,
};
pub use error::{ClientError, ClientResult, RefreshError};
