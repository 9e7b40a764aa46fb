//! Authentication: the token-refreshing client, the session holder and the
//! event notifier that connects them.

mod client;
pub mod events;
mod session;
mod token_store;

pub use client::{
    AuthenticatedClient, DEFAULT_QUEUE_TIMEOUT, DEFAULT_REFRESH_TIMEOUT, REFRESH_PATH,
    RefreshPolicy,
};
pub use events::{
    EventNotifier, SESSION_EXPIRED, SessionEvent, SessionEvents, Subscription, SubscriptionId,
    TOKEN_REFRESHED,
};
pub use session::SessionHolder;
pub use token_store::InMemoryTokenStore;
