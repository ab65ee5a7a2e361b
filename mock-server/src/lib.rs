//! Stand-in for the user API proxy, used by integration tests and demos.
//!
//! Serves the twelve reqres.in sample users under `GET /user/{id}` and lets
//! tests queue failures per id with `MockState::fail_next`.

pub mod config;

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    body::Body,
    extract::{MatchedPath, Path, State},
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info_span, Span};

pub use config::MockConfig;

const REQUEST_ID: &str = "x-request-id";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub data: User,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub external_api_status: String,
    pub environment: String,
}

/// A scripted misbehaviour served instead of the real answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Error status with a structured `{detail, status_code}` body.
    Detail(u16, String),
    /// Error status with a body that is not an error document.
    Plain(u16),
    /// `200 OK` whose body is missing the user fields.
    MalformedUser,
}

impl Fault {
    pub fn unavailable() -> Self {
        Fault::Detail(
            503,
            "External API is temporarily unavailable. Please try again later.".to_string(),
        )
    }
}

#[derive(Clone, Debug)]
pub struct MockState {
    users: Arc<HashMap<u64, User>>,
    faults: Arc<Mutex<HashMap<u64, VecDeque<Fault>>>>,
    hits: Arc<Mutex<HashMap<u64, usize>>>,
    environment: String,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            users: Arc::new(sample_users().into_iter().map(|u| (u.id, u)).collect()),
            faults: Arc::default(),
            hits: Arc::default(),
            environment: MockConfig::default().environment,
        }
    }
}

impl MockState {
    /// Serve `faults` in order for `id` before answering normally again.
    pub fn fail_next(&self, id: u64, faults: impl IntoIterator<Item = Fault>) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .extend(faults);
    }

    /// How many times `GET /user/{id}` was requested.
    pub fn hits(&self, id: u64) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    fn record_hit(&self, id: u64) -> Option<Fault> {
        *self
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default() += 1;
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&id)
            .and_then(VecDeque::pop_front)
    }
}

/// The twelve users reqres.in ships as demo data.
pub fn sample_users() -> Vec<User> {
    [
        "George Bluth",
        "Janet Weaver",
        "Emma Wong",
        "Eve Holt",
        "Charles Morris",
        "Tracey Ramos",
        "Michael Lawson",
        "Lindsay Ferguson",
        "Tobias Funke",
        "Byron Fields",
        "George Edwards",
        "Rachel Howell",
    ]
    .into_iter()
    .zip(1u64..)
    .map(|(name, id)| {
        let (first, last) = name.split_once(' ').unwrap_or((name, ""));
        User {
            id,
            email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
        }
    })
    .collect()
}

pub fn app() -> Router {
    router(MockState::default(), &MockConfig::default())
}

/// `*` anywhere in the list allows every origin.
fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|origin| origin == "*") {
        return AllowOrigin::any();
    }
    AllowOrigin::list(
        origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok()),
    )
}

pub fn router(state: MockState, config: &MockConfig) -> Router {
    let state = MockState {
        environment: config.environment.clone(),
        ..state
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(&config.cors_origins))
        .allow_methods([Method::GET])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/user/{id}", get(get_user))
        .with_state(state)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID)))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(SetRequestHeaderLayer::if_not_present(
            HeaderName::from_static(REQUEST_ID),
            |_req: &Request<Body>| HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).ok(),
        ))
        .layer(cors)
}

pub async fn run(
    listener: TcpListener,
    state: MockState,
    config: &MockConfig,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state, config)).await
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "User API Service is running" }))
}

async fn health(State(state): State<MockState>) -> Json<Health> {
    Json(Health {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        external_api_status: "healthy".to_string(),
        environment: state.environment.clone(),
    })
}

async fn get_user(State(state): State<MockState>, Path(raw): Path<String>) -> Response {
    let id = match raw.parse::<u64>() {
        Ok(id) if id > 0 => id,
        _ => {
            return error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "User ID must be a positive integer",
            )
        }
    };

    if let Some(fault) = state.record_hit(id) {
        tracing::info!(user_id = id, ?fault, "serving injected fault");
        return match fault {
            Fault::Detail(status, detail) => error(status_code(status), &detail),
            Fault::Plain(status) => (status_code(status), "upstream exploded").into_response(),
            Fault::MalformedUser => Json(serde_json::json!({ "data": { "id": id } })).into_response(),
        };
    }

    match state.users.get(&id) {
        Some(user) => Json(UserResponse { data: user.clone() }).into_response(),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error(status: StatusCode, detail: &str) -> Response {
    let body = ErrorBody {
        detail: detail.to_string(),
        status_code: Some(status.as_u16()),
    };
    (status, Json(body)).into_response()
}
