//! Typed operations over the booking backend's REST endpoints.
//!
//! Every call goes through the [`AuthenticatedClient`], so expired tokens are
//! recovered transparently. Inputs are validated before anything is sent.

mod bookings;
mod calendar;
mod listings;
mod reviews;

use std::sync::Arc;

use crate::auth::AuthenticatedClient;
use crate::ports::{Clock, HttpTransport};

/// Entry point for listing, calendar, booking, payment and review calls.
pub struct ShortletApi<T> {
    client: Arc<AuthenticatedClient<T>>,
    clock: Arc<dyn Clock>,
}

impl<T: HttpTransport> ShortletApi<T> {
    /// Creates the facade. `clock` decides what "today" is for booking
    /// validation.
    pub fn new(client: Arc<AuthenticatedClient<T>>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    /// The underlying client.
    pub const fn client(&self) -> &Arc<AuthenticatedClient<T>> {
        &self.client
    }
}

impl<T> std::fmt::Debug for ShortletApi<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortletApi")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
