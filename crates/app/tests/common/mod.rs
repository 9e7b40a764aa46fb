//! In-process backend used by the integration tests.
//!
//! Serves the subset of the booking API the tests drive, on an ephemeral
//! port under `/api`. Access tokens rotate on every refresh and any token
//! can be invalidated on demand.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use shortlet_infrastructure::ClientConfig;
use tokio::net::TcpListener;

pub const PASSWORD: &str = "correct horse";
pub const REFRESH_TOKEN: &str = "refresh-1";

/// How long the refresh endpoint takes, so concurrent 401s overlap it.
const REFRESH_LATENCY: Duration = Duration::from_millis(150);

#[derive(Debug)]
struct BackendState {
    valid_token: String,
    rotations: u32,
    refresh_calls: u32,
    profile_calls: u32,
    reject_refresh: bool,
    uploaded_photos: Vec<String>,
}

/// Handle on a running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
    base_url: String,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(BackendState {
            valid_token: "access-0".to_string(),
            rotations: 0,
            refresh_calls: 0,
            profile_calls: 0,
            reject_refresh: false,
            uploaded_photos: Vec::new(),
        }));

        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/profile", get(profile))
            .route("/my-bookings", get(my_bookings))
            .route("/properties", post(create_property))
            .route("/properties/{id}/booked-dates", get(booked_dates))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest("/api", api);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{addr}/api"),
        }
    }

    /// Client configuration pointing at this backend.
    pub fn config(&self, session_file: Option<&Path>) -> ClientConfig {
        ClientConfig {
            session_file: session_file.map(Path::to_path_buf),
            ..ClientConfig::default()
        }
        .with_base_url(&self.base_url)
        .unwrap()
    }

    /// Makes every access token issued so far invalid.
    pub fn expire_access_token(&self) {
        self.state.lock().unwrap().valid_token = "revoked".to_string();
    }

    pub fn reject_refresh(&self) {
        self.state.lock().unwrap().reject_refresh = true;
    }

    pub fn refresh_calls(&self) -> u32 {
        self.state.lock().unwrap().refresh_calls
    }

    pub fn profile_calls(&self) -> u32 {
        self.state.lock().unwrap().profile_calls
    }

    pub fn valid_token(&self) -> String {
        self.state.lock().unwrap().valid_token.clone()
    }

    pub fn uploaded_photos(&self) -> Vec<String> {
        self.state.lock().unwrap().uploaded_photos.clone()
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn expired() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "msg": "Token has expired" })),
    )
        .into_response()
}

fn authorized(state: &Shared, headers: &HeaderMap) -> bool {
    bearer(headers) == Some(state.lock().unwrap().valid_token.as_str())
}

fn user() -> Value {
    json!({
        "id": 7,
        "email": "ada@example.com",
        "first_name": "Ada",
        "last_name": "Obi",
        "user_type": "host"
    })
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response();
    }

    let access_token = state.lock().unwrap().valid_token.clone();
    Json(json!({
        "access_token": access_token,
        "refresh_token": REFRESH_TOKEN,
        "user": user(),
    }))
    .into_response()
}

async fn refresh(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.lock().unwrap().refresh_calls += 1;
    tokio::time::sleep(REFRESH_LATENCY).await;

    let mut state = state.lock().unwrap();
    if state.reject_refresh || bearer(&headers) != Some(REFRESH_TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "Token has been revoked" })),
        )
            .into_response();
    }

    state.rotations += 1;
    state.valid_token = format!("access-{}", state.rotations);
    Json(json!({ "access_token": state.valid_token })).into_response()
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.lock().unwrap().profile_calls += 1;
    if !authorized(&state, &headers) {
        return expired();
    }
    Json(user()).into_response()
}

async fn my_bookings(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return expired();
    }
    Json(json!([{
        "id": 11,
        "guest_id": 7,
        "property_id": 4,
        "check_in_date": "2024-06-10",
        "check_out_date": "2024-06-13",
        "num_guests": 2,
        "total_price": 135000.0,
        "status": "pending",
        "payment_status": "unpaid"
    }]))
    .into_response()
}

async fn booked_dates(UrlPath(id): UrlPath<u64>) -> Response {
    if id != 4 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Property not found" })),
        )
            .into_response();
    }
    Json(json!([
        { "startDate": "2024-06-10", "endDate": "2024-06-13" },
        { "startDate": "2024-06-12", "endDate": "2024-06-14" }
    ]))
    .into_response()
}

async fn create_property(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !authorized(&state, &headers) {
        return expired();
    }

    let mut title = String::new();
    let mut photos = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = field.text().await.unwrap(),
            "listing_photos" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                field.bytes().await.unwrap();
                photos.push(file_name);
            }
            _ => {
                field.bytes().await.unwrap();
            }
        }
    }

    let urls: Vec<String> = photos
        .iter()
        .map(|name| format!("/uploads/{name}"))
        .collect();
    state.lock().unwrap().uploaded_photos.extend(photos);

    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Property created",
            "property": {
                "id": 21,
                "host_id": 7,
                "title": title,
                "address": "1 Admiralty Way",
                "city": "Lagos",
                "state": "Lagos",
                "price_per_night": 45000.0,
                "max_guests": 4,
                "num_bedrooms": 2,
                "num_bathrooms": 1.5,
                "amenities": ["wifi"],
                "listing_photos": urls
            }
        })),
    )
        .into_response()
}
