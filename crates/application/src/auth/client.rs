//! Authenticated API client.
//!
//! Every request carries the current access token. A 401 triggers at most one
//! refresh cycle at a time: the first failing request leads the refresh, any
//! request failing while it is in flight queues behind it, and all of them are
//! retried once with the new token. When the refresh fails the persisted
//! session is cleared and every queued request is rejected with the same cause.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use shortlet_domain::{
    ApiRequest, ApiResponse, RefreshResponse, RequestBody, SessionKey, token_preview,
};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::events::{SessionEvent, SessionEvents};
use crate::error::{ClientError, ClientResult, RefreshError};
use crate::ports::{HttpTransport, TokenStore};

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Default bound on the refresh call itself.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on how long a queued request waits for a refresh.
pub const DEFAULT_QUEUE_TIMEOUT: Duration = Duration::from_secs(60);

/// Time limits for the refresh protocol. `None` waits indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Limit on the `POST /auth/refresh` exchange.
    pub refresh_timeout: Option<Duration>,
    /// Limit on a queued request's wait for the refresh outcome.
    pub queue_timeout: Option<Duration>,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            refresh_timeout: Some(DEFAULT_REFRESH_TIMEOUT),
            queue_timeout: Some(DEFAULT_QUEUE_TIMEOUT),
        }
    }
}

type RefreshOutcome = Result<String, RefreshError>;

#[derive(Debug, Default)]
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// What a request that got a 401 does next.
enum Recovery {
    /// Wait for the in-flight refresh.
    Wait(oneshot::Receiver<RefreshOutcome>),
    /// The credential changed since the request was sent; resend with it.
    Resend(String),
    /// Run the refresh.
    Lead,
}

/// Held by the request running a refresh.
///
/// If the leader goes away without settling, the flag is cleared and the
/// queue is dropped so that waiters observe [`ClientError::Cancelled`].
struct RefreshGuard<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl<'a> RefreshGuard<'a> {
    const fn new(state: &'a Mutex<RefreshState>) -> Self {
        Self { state, armed: true }
    }

    /// Clears the refreshing flag and hands `outcome` to every waiter in
    /// arrival order.
    fn settle(mut self, outcome: &RefreshOutcome) {
        self.armed = false;
        let waiters = {
            let mut state = lock(self.state);
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        debug!(waiters = waiters.len(), "releasing queued requests");
        for waiter in waiters {
            if waiter.send(outcome.clone()).is_err() {
                debug!("queued request went away before the refresh settled");
            }
        }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = lock(self.state);
            state.refreshing = false;
            if !state.waiters.is_empty() {
                warn!(
                    waiters = state.waiters.len(),
                    "refresh abandoned, cancelling queued requests"
                );
            }
            state.waiters.clear();
        }
    }
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// HTTP client that attaches the session token and recovers from expiry.
pub struct AuthenticatedClient<T> {
    transport: T,
    store: Arc<dyn TokenStore>,
    events: SessionEvents,
    policy: RefreshPolicy,
    credential: RwLock<Option<String>>,
    refresh: Mutex<RefreshState>,
}

impl<T: HttpTransport> AuthenticatedClient<T> {
    /// Creates a client with no credential loaded.
    pub fn new(transport: T, store: Arc<dyn TokenStore>, events: SessionEvents) -> Self {
        Self {
            transport,
            store,
            events,
            policy: RefreshPolicy::default(),
            credential: RwLock::new(None),
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    /// Replaces the refresh time limits.
    #[must_use]
    pub const fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Notifier this client publishes session events on.
    pub const fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Persistent session storage.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// The access token attached to outgoing requests.
    pub fn credential(&self) -> Option<String> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the in-memory access token. Does not touch the store.
    pub fn set_credential(&self, token: Option<String>) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Number of requests waiting on the in-flight refresh.
    pub fn pending_requests(&self) -> usize {
        lock(&self.refresh).waiters.len()
    }

    /// True while a refresh cycle is running.
    pub fn is_refreshing(&self) -> bool {
        lock(&self.refresh).refreshing
    }

    /// Sends `request` with the current credential, refreshing on 401.
    ///
    /// # Errors
    ///
    /// [`ClientError::Remote`] for non-2xx answers, the unauthenticated family
    /// when the session cannot be recovered, and transport failures as-is.
    pub async fn send(&self, mut request: ApiRequest) -> ClientResult<ApiResponse> {
        let sent_with = self.credential();
        if let Some(token) = &sent_with {
            request.bearer = Some(token.clone());
        }

        let response = self.dispatch(&request).await?;
        if !response.is_unauthorized() {
            return check_status(response);
        }

        debug!(path = %request.path, "request unauthorized");
        self.recover(request, sent_with).await
    }

    /// Sends and decodes a JSON response.
    ///
    /// # Errors
    ///
    /// As [`AuthenticatedClient::send`], plus [`ClientError::Decode`].
    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<R> {
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    /// Sends without a credential and without 401 recovery. Used for login
    /// and signup, where a 401 means bad input rather than an expired token.
    ///
    /// # Errors
    ///
    /// [`ClientError::Remote`] for every non-2xx answer.
    pub async fn send_unauthenticated(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let response = self.dispatch(&request).await?;
        check_status(response)
    }

    /// Sends with the current credential but never starts a refresh; a 401
    /// comes back as [`ClientError::Remote`].
    ///
    /// # Errors
    ///
    /// [`ClientError::Remote`] for every non-2xx answer.
    pub async fn send_without_refresh(&self, mut request: ApiRequest) -> ClientResult<ApiResponse> {
        if let Some(token) = self.credential() {
            request.bearer = Some(token);
        }
        let response = self.dispatch(&request).await?;
        check_status(response)
    }

    async fn dispatch(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        debug!(method = %request.method, path = %request.path, "dispatching request");
        let response = self.transport.send(request).await?;
        debug!(
            status = response.status,
            duration_ms = response.duration.as_millis(),
            "response received"
        );
        Ok(response)
    }

    async fn recover(
        &self,
        request: ApiRequest,
        sent_with: Option<String>,
    ) -> ClientResult<ApiResponse> {
        let recovery = {
            let mut state = lock(&self.refresh);
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Recovery::Wait(rx)
            } else {
                match self.credential() {
                    Some(current) if sent_with.as_deref() != Some(current.as_str()) => {
                        Recovery::Resend(current)
                    }
                    _ => {
                        state.refreshing = true;
                        Recovery::Lead
                    }
                }
            }
        };

        match recovery {
            Recovery::Wait(rx) => {
                debug!(path = %request.path, "queued behind in-flight refresh");
                let token = self.await_refresh(rx).await?;
                self.retry(request, token).await
            }
            Recovery::Resend(token) => {
                debug!(path = %request.path, "credential changed since send, retrying");
                self.retry(request, token).await
            }
            Recovery::Lead => self.lead_refresh(request).await,
        }
    }

    async fn await_refresh(&self, rx: oneshot::Receiver<RefreshOutcome>) -> ClientResult<String> {
        let outcome = match self.policy.queue_timeout {
            Some(limit) => tokio::time::timeout(limit, rx)
                .await
                .map_err(|_| ClientError::Timeout)?,
            None => rx.await,
        };

        match outcome {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(cause)) => Err(ClientError::RefreshFailed(cause)),
            Err(_) => Err(ClientError::Cancelled),
        }
    }

    async fn lead_refresh(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let guard = RefreshGuard::new(&self.refresh);
        info!("access token rejected, refreshing session");

        match self.renew().await {
            Ok(token) => {
                guard.settle(&Ok(token.clone()));
                self.retry(request, token).await
            }
            Err(cause) => Err(self.expire(guard, cause).await),
        }
    }

    /// Exchanges the refresh token, persists the result and announces it.
    async fn renew(&self) -> Result<String, RefreshError> {
        let refresh_token = self
            .store
            .get(SessionKey::RefreshToken)
            .await
            .map_err(|e| RefreshError::Storage(e.to_string()))?
            .filter(|token| !token.is_empty())
            .ok_or(RefreshError::MissingRefreshToken)?;

        let token = self.exchange(&refresh_token).await?;

        self.store
            .set(SessionKey::AccessToken, &token)
            .await
            .map_err(|e| RefreshError::Storage(e.to_string()))?;
        self.set_credential(Some(token.clone()));
        info!(token = %token_preview(&token), "session refreshed");
        self.events.publish(&SessionEvent::TokenRefreshed {
            token: token.clone(),
        });

        Ok(token)
    }

    async fn exchange(&self, refresh_token: &str) -> Result<String, RefreshError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .with_body(RequestBody::Json(serde_json::Value::Object(
                serde_json::Map::new(),
            )))
            .with_bearer(refresh_token);

        let response = match self.policy.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(&request))
                .await
                .map_err(|_| RefreshError::Timeout)??,
            None => self.transport.send(&request).await?,
        };

        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status,
                message: response.error_message(),
            });
        }

        let body: RefreshResponse = response
            .json()
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;
        if body.access_token.is_empty() {
            return Err(RefreshError::Malformed("empty access_token".to_string()));
        }
        Ok(body.access_token)
    }

    /// Ends the session after a failed refresh.
    async fn expire(&self, guard: RefreshGuard<'_>, cause: RefreshError) -> ClientError {
        warn!(error = %cause, "session refresh failed, clearing session");
        self.set_credential(None);
        if let Err(e) = self.store.clear_session().await {
            warn!(error = %e, "failed to clear persisted session");
        }

        let reason = cause.to_string();
        guard.settle(&Err(cause));
        self.events.publish(&SessionEvent::SessionExpired {
            reason: reason.clone(),
        });

        ClientError::Unauthenticated { reason }
    }

    /// Resends once. A second 401 is terminal.
    async fn retry(&self, mut request: ApiRequest, token: String) -> ClientResult<ApiResponse> {
        request.bearer = Some(token);
        let response = self.dispatch(&request).await?;
        if response.is_unauthorized() {
            warn!(path = %request.path, "request rejected again after refresh");
            return Err(ClientError::TokenRejected);
        }
        check_status(response)
    }
}

impl<T> std::fmt::Debug for AuthenticatedClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("policy", &self.policy)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

fn check_status(response: ApiResponse) -> ClientResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Remote {
            status: response.status,
            message: response.error_message(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::InMemoryTokenStore;
    use crate::auth::events::{SESSION_EXPIRED, TOKEN_REFRESHED};
    use crate::ports::{TokenStoreError, TransportError};
    use crate::test_support::{FakeBackend, RefreshBehavior, wait_until};
    use pretty_assertions::assert_eq;
    use shortlet_domain::HttpMethod;
    use tokio::task::JoinSet;

    type Client = AuthenticatedClient<Arc<FakeBackend>>;

    const CONCURRENT: usize = 5;

    fn client_with(
        backend: &Arc<FakeBackend>,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> (Arc<Client>, InMemoryTokenStore) {
        let mut seed = Vec::new();
        if let Some(token) = access {
            seed.push((SessionKey::AccessToken, token.to_string()));
        }
        if let Some(token) = refresh {
            seed.push((SessionKey::RefreshToken, token.to_string()));
        }
        let store = InMemoryTokenStore::with_values(seed);
        let client = AuthenticatedClient::new(
            Arc::clone(backend),
            Arc::new(store.clone()),
            SessionEvents::new(),
        );
        client.set_credential(access.map(str::to_string));
        (Arc::new(client), store)
    }

    fn record(client: &Client, topic: &str) -> Arc<Mutex<Vec<SessionEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = client
            .events()
            .subscribe(topic, move |event| sink.lock().unwrap().push(event.clone()));
        seen
    }

    fn spawn_requests(client: &Arc<Client>, count: usize) -> JoinSet<ClientResult<ApiResponse>> {
        let mut tasks = JoinSet::new();
        for _ in 0..count {
            let client = Arc::clone(client);
            tasks.spawn(async move { client.send(ApiRequest::get("/my-bookings")).await });
        }
        tasks
    }

    #[tokio::test]
    async fn test_attaches_current_credential() {
        let backend = Arc::new(FakeBackend::new("tok-1", "tok-2").route(
            HttpMethod::Get,
            "/my-bookings",
            200,
            "[]",
        ));
        let (client, _store) = client_with(&backend, Some("tok-1"), Some("ref-1"));

        let response = client.send(ApiRequest::get("/my-bookings")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(backend.requests_matching("/my-bookings", Some("tok-1")), 1);
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let backend = Arc::new(FakeBackend::gated("fresh", "fresh"));
        let (client, store) = client_with(&backend, Some("stale"), Some("ref-1"));
        let refreshed = record(&client, TOKEN_REFRESHED);

        let mut tasks = spawn_requests(&client, CONCURRENT);
        wait_until(|| backend.refresh_calls() == 1 && client.pending_requests() == CONCURRENT - 1)
            .await;
        assert!(client.is_refreshing());

        backend.open_refresh_gate();
        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().status, 200);
        }

        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(
            backend.requests_matching("/my-bookings", Some("fresh")),
            CONCURRENT
        );
        assert_eq!(
            store.get(SessionKey::AccessToken).await.unwrap().as_deref(),
            Some("fresh")
        );
        assert_eq!(client.credential().as_deref(), Some("fresh"));
        assert_eq!(
            *refreshed.lock().unwrap(),
            vec![SessionEvent::TokenRefreshed {
                token: "fresh".to_string()
            }]
        );
        assert!(!client.is_refreshing());
        assert_eq!(client.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_rejects_every_waiter_and_clears_session() {
        let backend =
            Arc::new(FakeBackend::gated("fresh", "fresh").with_refresh(RefreshBehavior::Reject(401)));
        let (client, store) = client_with(&backend, Some("stale"), Some("ref-1"));
        let expired = record(&client, SESSION_EXPIRED);

        let mut tasks = spawn_requests(&client, CONCURRENT);
        wait_until(|| backend.refresh_calls() == 1 && client.pending_requests() == CONCURRENT - 1)
            .await;
        backend.open_refresh_gate();

        let mut unauthenticated = 0;
        let mut refresh_failed = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Err(ClientError::Unauthenticated { .. }) => unauthenticated += 1,
                Err(ClientError::RefreshFailed(RefreshError::Rejected { status, .. })) => {
                    assert_eq!(status, 401);
                    refresh_failed += 1;
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(unauthenticated, 1);
        assert_eq!(refresh_failed, CONCURRENT - 1);
        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(store.count().await, 0);
        assert_eq!(client.credential(), None);
        assert_eq!(expired.lock().unwrap().len(), 1);
        assert!(!client.is_refreshing());
    }

    /// Holds no refresh token and never finishes a removal.
    struct StallingStore;

    #[async_trait::async_trait]
    impl TokenStore for StallingStore {
        async fn get(&self, _key: SessionKey) -> Result<Option<String>, TokenStoreError> {
            Ok(None)
        }

        async fn set(&self, _key: SessionKey, _value: &str) -> Result<(), TokenStoreError> {
            Ok(())
        }

        async fn remove(&self, _key: SessionKey) -> Result<(), TokenStoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_expiry_drops_credential_before_clearing_store() {
        let backend = Arc::new(FakeBackend::new("fresh", "fresh"));
        let client = Arc::new(AuthenticatedClient::new(
            Arc::clone(&backend),
            Arc::new(StallingStore),
            SessionEvents::new(),
        ));
        client.set_credential(Some("stale".to_string()));

        let sender = Arc::clone(&client);
        let task =
            tokio::spawn(async move { sender.send(ApiRequest::get("/my-bookings")).await });

        wait_until(|| client.credential().is_none()).await;
        assert!(client.is_refreshing());

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!client.is_refreshing());
        assert_eq!(client.credential(), None);
    }

    #[tokio::test]
    async fn test_send_without_refresh_reports_401() {
        let backend = Arc::new(FakeBackend::new("fresh", "fresh"));
        let (client, store) = client_with(&backend, Some("stale"), Some("ref-1"));

        let err = client
            .send_without_refresh(ApiRequest::get("/my-bookings"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(backend.refresh_calls(), 0);
        assert_eq!(backend.requests_matching("/my-bookings", Some("stale")), 1);
        assert_eq!(client.credential().as_deref(), Some("stale"));
        assert_eq!(
            store.get(SessionKey::RefreshToken).await.unwrap().as_deref(),
            Some("ref-1")
        );
    }

    #[tokio::test]
    async fn test_second_401_is_terminal() {
        let backend = Arc::new(FakeBackend::new("tok-1", "tok-2").rejecting_everything());
        let (client, _store) = client_with(&backend, Some("tok-1"), Some("ref-1"));

        let err = client
            .send(ApiRequest::get("/my-bookings"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::TokenRejected));
        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(backend.requests_matching("/my-bookings", Some("tok-2")), 1);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_expires_session() {
        let backend = Arc::new(FakeBackend::new("other", "tok-2"));
        let (client, store) = client_with(&backend, Some("tok-1"), None);
        let expired = record(&client, SESSION_EXPIRED);

        let err = client
            .send(ApiRequest::get("/my-bookings"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Unauthenticated { .. }));
        assert_eq!(backend.refresh_calls(), 0);
        assert_eq!(store.count().await, 0);
        assert_eq!(expired.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_expires_session() {
        let backend =
            Arc::new(FakeBackend::new("other", "tok-2").with_refresh(RefreshBehavior::Fail));
        let (client, store) = client_with(&backend, Some("tok-1"), Some("ref-1"));

        let err = client
            .send(ApiRequest::get("/my-bookings"))
            .await
            .unwrap_err();

        assert!(err.is_unauthenticated());
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_non_401_errors_pass_through() {
        let backend = Arc::new(FakeBackend::new("tok-1", "tok-2").route(
            HttpMethod::Get,
            "/properties/99",
            404,
            r#"{"message": "Property not found"}"#,
        ));
        let (client, store) = client_with(&backend, Some("tok-1"), Some("ref-1"));

        let err = client
            .send(ApiRequest::get("/properties/99"))
            .await
            .unwrap_err();

        match err {
            ClientError::Remote { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Property not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.refresh_calls(), 0);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_stale_401_resends_without_refresh() {
        let backend = Arc::new(FakeBackend::new("fresh", "unused"));
        let (client, _store) = client_with(&backend, Some("fresh"), Some("ref-1"));

        let response = client
            .recover(ApiRequest::get("/my-bookings"), Some("old".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(backend.refresh_calls(), 0);
        assert_eq!(backend.requests_matching("/my-bookings", Some("fresh")), 1);
    }

    #[tokio::test]
    async fn test_refresh_timeout_expires_session() {
        let backend = Arc::new(FakeBackend::gated("fresh", "fresh"));
        let (client, store) = client_with(&backend, Some("stale"), Some("ref-1"));
        let client = Arc::new(
            Arc::try_unwrap(client)
                .unwrap()
                .with_policy(RefreshPolicy {
                    refresh_timeout: Some(Duration::from_millis(50)),
                    queue_timeout: None,
                }),
        );

        let err = client
            .send(ApiRequest::get("/my-bookings"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, ClientError::Unauthenticated { ref reason } if reason == "refresh timed out")
        );
        assert_eq!(store.count().await, 0);
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_abandoned_refresh_cancels_waiters() {
        let backend = Arc::new(FakeBackend::gated("fresh", "fresh"));
        let (client, _store) = client_with(&backend, Some("stale"), Some("ref-1"));

        let leader = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.send(ApiRequest::get("/my-bookings")).await })
        };
        wait_until(|| backend.refresh_calls() == 1).await;

        let follower = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.send(ApiRequest::get("/my-bookings")).await })
        };
        wait_until(|| client.pending_requests() == 1).await;

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        let outcome = follower.await.unwrap();
        assert!(matches!(outcome, Err(ClientError::Cancelled)));
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_login_style_requests_skip_recovery() {
        let backend = Arc::new(FakeBackend::new("tok-1", "tok-2").route(
            HttpMethod::Post,
            "/auth/login",
            401,
            r#"{"message": "Invalid credentials"}"#,
        ));
        let (client, _store) = client_with(&backend, None, Some("ref-1"));

        let err = client
            .send_unauthenticated(ApiRequest::post("/auth/login"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_errors_surface_unchanged() {
        struct Down;

        impl HttpTransport for Down {
            async fn send(&self, _request: &ApiRequest) -> Result<ApiResponse, TransportError> {
                Err(TransportError::ConnectionFailed("refused".to_string()))
            }
        }

        let client = AuthenticatedClient::new(
            Down,
            Arc::new(InMemoryTokenStore::new()),
            SessionEvents::new(),
        );
        let err = client
            .send(ApiRequest::get("/properties"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Transport(TransportError::ConnectionFailed(_))
        ));
    }
}
