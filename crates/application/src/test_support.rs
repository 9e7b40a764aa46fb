//! Scripted in-process backend for driving the client in tests.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use shortlet_domain::{ApiRequest, ApiResponse, HttpMethod};
use tokio::sync::Semaphore;

use crate::auth::REFRESH_PATH;
use crate::ports::{HttpTransport, TransportError};

const OPEN: usize = Semaphore::MAX_PERMITS / 2;

/// How the fake answers `POST /auth/refresh`.
#[derive(Debug, Clone)]
pub enum RefreshBehavior {
    /// Mint the next token.
    Succeed,
    /// Answer with an error status.
    Reject(u16),
    /// Fail below HTTP.
    Fail,
}

#[derive(Debug)]
struct FakeState {
    valid_token: String,
    next_token: String,
    refresh: RefreshBehavior,
    reject_everything: bool,
    refresh_calls: usize,
    requests: Vec<ApiRequest>,
    routes: HashMap<(HttpMethod, String), (u16, String)>,
}

/// A backend that accepts exactly one bearer on protected routes.
#[derive(Debug)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    gate: Semaphore,
}

impl FakeBackend {
    /// Accepts `valid_token`; a refresh mints `next_token`.
    pub fn new(valid_token: &str, next_token: &str) -> Self {
        Self::build(valid_token, next_token, OPEN)
    }

    /// Like [`FakeBackend::new`], but refresh calls block until
    /// [`FakeBackend::open_refresh_gate`].
    pub fn gated(valid_token: &str, next_token: &str) -> Self {
        Self::build(valid_token, next_token, 0)
    }

    fn build(valid_token: &str, next_token: &str, permits: usize) -> Self {
        Self {
            state: Mutex::new(FakeState {
                valid_token: valid_token.to_string(),
                next_token: next_token.to_string(),
                refresh: RefreshBehavior::Succeed,
                reject_everything: false,
                refresh_calls: 0,
                requests: Vec::new(),
                routes: HashMap::new(),
            }),
            gate: Semaphore::new(permits),
        }
    }

    pub fn with_refresh(self, behavior: RefreshBehavior) -> Self {
        self.state.lock().unwrap().refresh = behavior;
        self
    }

    /// Protected routes answer 401 whatever the bearer.
    pub fn rejecting_everything(self) -> Self {
        self.state.lock().unwrap().reject_everything = true;
        self
    }

    /// Canned response for a route. Routes under `/auth/login` and
    /// `/auth/signup` are public; everything else requires the valid bearer.
    pub fn route(self, method: HttpMethod, path: &str, status: u16, body: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert((method, path.to_string()), (status, body.to_string()));
        self
    }

    pub fn open_refresh_gate(&self) {
        self.gate.add_permits(OPEN);
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.lock().unwrap().refresh_calls
    }

    pub fn requests_matching(&self, path: &str, bearer: Option<&str>) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.path == path && r.bearer.as_deref() == bearer)
            .count()
    }

    pub fn last_request(&self, path: &str) -> Option<ApiRequest> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .rev()
            .find(|r| r.path == path)
            .cloned()
    }

    async fn refresh(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.state.lock().unwrap().refresh_calls += 1;
        let _permit = self.gate.acquire().await.unwrap();

        let mut state = self.state.lock().unwrap();
        assert!(request.bearer.is_some(), "refresh must carry the refresh token");
        match state.refresh.clone() {
            RefreshBehavior::Succeed => {
                state.valid_token = state.next_token.clone();
                Ok(ApiResponse::new(
                    200,
                    format!(r#"{{"access_token": "{}"}}"#, state.next_token),
                ))
            }
            RefreshBehavior::Reject(status) => Ok(ApiResponse::new(
                status,
                r#"{"msg": "Token has expired"}"#,
            )),
            RefreshBehavior::Fail => Err(TransportError::ConnectionFailed(
                "connection refused".to_string(),
            )),
        }
    }

    fn answer(&self, request: &ApiRequest) -> ApiResponse {
        let state = self.state.lock().unwrap();
        let public = request.path.starts_with("/auth/login") || request.path.starts_with("/auth/signup");
        let authorized =
            !state.reject_everything && request.bearer.as_deref() == Some(state.valid_token.as_str());

        if !public && !authorized {
            return ApiResponse::new(401, r#"{"msg": "Token has expired"}"#);
        }
        state
            .routes
            .get(&(request.method, request.path.clone()))
            .map_or_else(
                || ApiResponse::new(200, "{}"),
                |(status, body)| ApiResponse::new(*status, body.clone()),
            )
    }
}

impl HttpTransport for FakeBackend {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
        let request = request.clone();
        async move {
            self.state.lock().unwrap().requests.push(request.clone());
            if request.path == REFRESH_PATH {
                self.refresh(&request).await
            } else {
                tokio::task::yield_now().await;
                Ok(self.answer(&request))
            }
        }
    }
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn profile_json(id: u64, first_name: &str) -> String {
    format!(
        r#"{{"id": {id}, "email": "{first}@example.com", "first_name": "{first_name}",
            "last_name": "Obi", "user_type": "guest"}}"#,
        first = first_name.to_lowercase()
    )
}

