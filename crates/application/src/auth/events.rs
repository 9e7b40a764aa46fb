//! Named-topic publish/subscribe.
//!
//! The authenticated client announces session changes here so that
//! observers (the session holder, a UI) react without a direct dependency
//! on the client. One notifier per session scope; there is no global bus.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Topic of [`SessionEvent::TokenRefreshed`].
pub const TOKEN_REFRESHED: &str = "token_refreshed";

/// Topic of [`SessionEvent::SessionExpired`].
pub const SESSION_EXPIRED: &str = "session_expired";

/// Events published by the authenticated client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh cycle produced a new access token.
    TokenRefreshed {
        /// The new access token
        token: String,
    },
    /// The session was cleared because it could not be recovered; observers
    /// should return to a logged-out view.
    SessionExpired {
        /// What ended the session
        reason: String,
    },
}

impl SessionEvent {
    /// Topic this event is published on.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::TokenRefreshed { .. } => TOKEN_REFRESHED,
            Self::SessionExpired { .. } => SESSION_EXPIRED,
        }
    }
}

/// Notifier carrying [`SessionEvent`]s.
pub type SessionEvents = EventNotifier<SessionEvent>;

/// A registered callback.
pub type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Identifies one registration. Subscribing the same handler twice yields
/// two ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration<P> {
    id: SubscriptionId,
    handler: Handler<P>,
}

struct Registry<P> {
    topics: Mutex<HashMap<String, Vec<Registration<P>>>>,
    next_id: AtomicU64,
}

impl<P> Registry<P> {
    fn remove(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(registrations) = topics.get_mut(topic) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            topics.remove(topic);
        }
        removed
    }
}

/// Named-topic publish/subscribe registry.
///
/// Handlers run synchronously on the dispatching thread, in registration
/// order. A dispatch works on a snapshot taken when it starts: handlers
/// registered meanwhile are not invoked for it.
pub struct EventNotifier<P> {
    registry: Arc<Registry<P>>,
}

impl<P> EventNotifier<P> {
    /// Creates a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                topics: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers `handler` for `topic`.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Subscription<P>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.subscribe_handler(topic, Arc::new(handler))
    }

    /// Registers an already shared handler for `topic`.
    pub fn subscribe_handler(&self, topic: &str, handler: Handler<P>) -> Subscription<P> {
        let id = SubscriptionId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic.to_string())
            .or_default()
            .push(Registration { id, handler });

        Subscription {
            topic: topic.to_string(),
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Removes one registration. Returns false if it was not registered.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        self.registry.remove(topic, id)
    }

    /// Invokes every handler registered for `topic` and returns how many ran.
    pub fn dispatch(&self, topic: &str, payload: &P) -> usize {
        let handlers: Vec<Handler<P>> = {
            let topics = self
                .registry
                .topics
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            topics
                .get(topic)
                .map(|registrations| registrations.iter().map(|r| Arc::clone(&r.handler)).collect())
                .unwrap_or_default()
        };

        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    /// Number of registrations for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, Vec::len)
    }
}

impl EventNotifier<SessionEvent> {
    /// Dispatches a session event on its own topic.
    pub fn publish(&self, event: &SessionEvent) -> usize {
        self.dispatch(event.topic(), event)
    }
}

impl<P> Default for EventNotifier<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for EventNotifier<P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<P> fmt::Debug for EventNotifier<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self
            .registry
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> =
            topics.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventNotifier").field("topics", &counts).finish()
    }
}

/// Handle returned by [`EventNotifier::subscribe`].
///
/// Dropping the handle keeps the registration; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription<P> {
    topic: String,
    id: SubscriptionId,
    registry: Weak<Registry<P>>,
}

impl<P> Subscription<P> {
    /// Registration id.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Topic this subscription listens on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Removes the registration. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(&self.topic, self.id))
    }
}

impl<P> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}
