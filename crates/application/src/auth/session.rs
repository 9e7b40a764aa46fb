//! Session holder.
//!
//! Owns the in-memory view of the current session and keeps it aligned with
//! the token store and the authenticated client's credential. Listens on the
//! client's notifier so that refreshes and expiries performed deep inside a
//! request are reflected here.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use shortlet_domain::{
    ApiRequest, AuthTokens, DomainError, LoginRequest, NewAccount, ProfileUpdate,
    ProfileUpdateResponse, RequestBody, SessionCredentials, SessionKey, SignupResponse,
    UserProfile,
};
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::client::AuthenticatedClient;
use super::events::{SESSION_EXPIRED, SessionEvent, Subscription, TOKEN_REFRESHED};
use crate::error::ClientResult;
use crate::ports::HttpTransport;

const LOGIN_PATH: &str = "/auth/login";
const SIGNUP_PATH: &str = "/auth/signup";
const PROFILE_PATH: &str = "/auth/profile";

struct SessionInner<T> {
    client: Arc<AuthenticatedClient<T>>,
    state: RwLock<SessionCredentials>,
    reloads: Mutex<JoinSet<()>>,
}

impl<T: HttpTransport> SessionInner<T> {
    fn read(&self) -> RwLockReadGuard<'_, SessionCredentials> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionCredentials> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn cache_profile(&self, profile: &UserProfile) -> ClientResult<()> {
        let serialized = serde_json::to_string(profile)?;
        self.client
            .store()
            .set(SessionKey::CachedProfile, &serialized)
            .await?;
        self.write().profile = Some(profile.clone());
        Ok(())
    }

    async fn reload_profile(&self) -> ClientResult<UserProfile> {
        let profile: UserProfile = self.client.send_json(ApiRequest::get(PROFILE_PATH)).await?;
        self.cache_profile(&profile).await?;
        debug!(user_id = profile.id, "profile reloaded");
        Ok(profile)
    }

    /// Profile reload run after a refresh. The token is brand new, so a 401
    /// here must not start another refresh cycle.
    async fn reload_after_refresh(&self) -> ClientResult<UserProfile> {
        let profile: UserProfile = self
            .client
            .send_without_refresh(ApiRequest::get(PROFILE_PATH))
            .await?
            .json()?;
        self.cache_profile(&profile).await?;
        debug!(user_id = profile.id, "profile reloaded after refresh");
        Ok(profile)
    }
}

/// Current authentication state plus the operations that change it.
pub struct SessionHolder<T> {
    inner: Arc<SessionInner<T>>,
    subscriptions: Vec<Subscription<SessionEvent>>,
}

impl<T: HttpTransport + 'static> SessionHolder<T> {
    /// Creates an empty holder bound to `client` and subscribes to its
    /// session events. Call [`SessionHolder::restore`] to load a persisted
    /// session.
    pub fn new(client: Arc<AuthenticatedClient<T>>) -> Self {
        let inner = Arc::new(SessionInner {
            client,
            state: RwLock::new(SessionCredentials::default()),
            reloads: Mutex::new(JoinSet::new()),
        });

        let events = inner.client.events().clone();
        let subscriptions = vec![
            events.subscribe(TOKEN_REFRESHED, on_token_refreshed(Arc::downgrade(&inner))),
            events.subscribe(SESSION_EXPIRED, on_session_expired(Arc::downgrade(&inner))),
        ];

        Self {
            inner,
            subscriptions,
        }
    }

    /// The client this holder manages.
    pub fn client(&self) -> &Arc<AuthenticatedClient<T>> {
        &self.inner.client
    }

    /// Loads the persisted session and installs its access token.
    ///
    /// A session holding only one of the two tokens is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Storage`] if the store cannot be read.
    pub async fn restore(&self) -> ClientResult<SessionCredentials> {
        let store = self.inner.client.store();
        let mut session = store.load_session().await?;

        if session.access_token.is_some() != session.refresh_token.is_some() {
            warn!("persisted session is incomplete, discarding it");
            store.clear_session().await?;
            session = SessionCredentials::default();
        }

        self.inner.client.set_credential(session.access_token.clone());
        *self.inner.write() = session.clone();
        info!(
            authenticated = session.is_authenticated(),
            "session restored"
        );
        Ok(session)
    }

    /// Logs in and persists the new session.
    ///
    /// # Errors
    ///
    /// Validation errors are raised before anything is sent; bad credentials
    /// surface as [`crate::ClientError::Remote`] with status 401.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        let credentials = LoginRequest::new(email.trim(), password);
        credentials.validate()?;
        self.login_with(&credentials).await
    }

    async fn login_with(&self, credentials: &LoginRequest) -> ClientResult<UserProfile> {
        let request = ApiRequest::post(LOGIN_PATH).with_body(RequestBody::json(credentials)?);
        let tokens: AuthTokens = self.inner.client.send_unauthenticated(request).await?.json()?;
        self.establish(tokens).await
    }

    /// Creates an account and logs it in.
    ///
    /// # Errors
    ///
    /// Validation errors are raised before anything is sent.
    pub async fn signup(&self, account: &NewAccount) -> ClientResult<UserProfile> {
        account.validate()?;

        let request = ApiRequest::post(SIGNUP_PATH).with_body(RequestBody::json(account)?);
        let created: SignupResponse = self.inner.client.send_unauthenticated(request).await?.json()?;

        match created.into_tokens() {
            Some(tokens) => self.establish(tokens).await,
            None => {
                debug!("signup returned no tokens, logging in");
                self.login_with(&account.login_request()).await
            }
        }
    }

    async fn establish(&self, tokens: AuthTokens) -> ClientResult<UserProfile> {
        let AuthTokens {
            access_token,
            refresh_token,
            user,
        } = tokens;

        self.inner
            .client
            .store()
            .save_session(&access_token, &refresh_token, &user)
            .await?;
        self.inner.client.set_credential(Some(access_token.clone()));
        *self.inner.write() = SessionCredentials {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            profile: Some(user.clone()),
        };

        info!(user_id = user.id, role = ?user.role, "logged in");
        Ok(user)
    }

    /// Clears the session everywhere.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Storage`] if the store cannot be cleared;
    /// the in-memory state is cleared regardless.
    pub async fn logout(&self) -> ClientResult<()> {
        self.inner.client.set_credential(None);
        *self.inner.write() = SessionCredentials::default();
        self.inner.client.store().clear_session().await?;
        info!("logged out");
        Ok(())
    }

    /// Fetches the profile and replaces the cached copy.
    ///
    /// # Errors
    ///
    /// Any client error from `GET /auth/profile`.
    pub async fn refresh_profile(&self) -> ClientResult<UserProfile> {
        self.inner.reload_profile().await
    }

    /// Sends a partial profile update and caches the returned user.
    ///
    /// # Errors
    ///
    /// [`DomainError::EmptyUpdate`] when no field is set.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<UserProfile> {
        if update.is_empty() {
            return Err(DomainError::EmptyUpdate.into());
        }

        let request = ApiRequest::patch(PROFILE_PATH).with_body(RequestBody::json(update)?);
        let ProfileUpdateResponse { user } = self.inner.client.send_json(request).await?;

        self.inner.cache_profile(&user).await?;
        Ok(user)
    }

    /// True while an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_authenticated()
    }

    /// Cached profile of the logged-in user.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.inner.read().profile.clone()
    }

    /// Current access token.
    pub fn access_token(&self) -> Option<String> {
        self.inner.read().access_token.clone()
    }

    /// Copy of the whole session view.
    pub fn snapshot(&self) -> SessionCredentials {
        self.inner.read().clone()
    }

    /// Waits for profile reloads scheduled by token refreshes to finish.
    ///
    /// Short-lived callers use this before exiting so the refreshed profile
    /// reaches the token store.
    pub async fn wait_for_reloads(&self) {
        let mut pending = std::mem::take(
            &mut *self
                .inner
                .reloads
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "profile reload task failed");
            }
        }
    }
}

fn on_token_refreshed<T: HttpTransport + 'static>(
    inner: Weak<SessionInner<T>>,
) -> impl Fn(&SessionEvent) + Send + Sync + 'static {
    move |event| {
        let (SessionEvent::TokenRefreshed { token }, Some(inner)) = (event, inner.upgrade()) else {
            return;
        };
        inner.write().access_token = Some(token.clone());

        let Ok(runtime) = Handle::try_current() else {
            debug!("no runtime available, skipping profile reload");
            return;
        };
        let task = Arc::clone(&inner);
        let mut reloads = inner.reloads.lock().unwrap_or_else(PoisonError::into_inner);
        // Reap finished reloads so a long-lived holder does not accumulate them.
        while reloads.try_join_next().is_some() {}
        reloads.spawn_on(
            async move {
                if let Err(e) = task.reload_after_refresh().await {
                    warn!(error = %e, "failed to reload profile after token refresh");
                }
            },
            &runtime,
        );
    }
}

fn on_session_expired<T: HttpTransport + 'static>(
    inner: Weak<SessionInner<T>>,
) -> impl Fn(&SessionEvent) + Send + Sync + 'static {
    move |event| {
        if let (SessionEvent::SessionExpired { reason }, Some(inner)) = (event, inner.upgrade()) {
            info!(%reason, "session expired");
            *inner.write() = SessionCredentials::default();
        }
    }
}

impl<T> Drop for SessionHolder<T> {
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl<T> std::fmt::Debug for SessionHolder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHolder")
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}
