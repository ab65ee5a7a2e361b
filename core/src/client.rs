//! Stateless HTTP request builder and response parser for the user API.
//!
//! # Design
//! `UserClient` holds only a `base_url` and carries no mutable state between
//! calls. A lookup is split into `build_get_user`, which produces an
//! `HttpRequest`, and `parse_get_user`, which consumes an `HttpResponse`.
//! `fetch_user` glues the two around a single `Transport` call for callers
//! that have one; FFI hosts run the round-trip themselves.

use tracing::{debug, warn};

use crate::error::{ApiError, MSG_FETCH_FAILED, MSG_NOT_FOUND, MSG_UNAVAILABLE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::schema;
use crate::types::User;
use crate::user_id::UserId;

/// Synchronous, stateless client for the user API.
#[derive(Debug, Clone)]
pub struct UserClient {
    base_url: String,
}

impl UserClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_get_user(&self, id: UserId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/user/{id}", self.base_url),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_status(&response)?;
        schema::parse_user_response(&response.body)
            .map(|envelope| envelope.data)
            .map_err(|e| {
                warn!(error = %e, "user payload failed validation");
                ApiError::InvalidResponse(e)
            })
    }

    /// Fetch one user: exactly one transport call, no retries.
    pub async fn fetch_user<T: Transport>(&self, transport: &T, id: UserId) -> Result<User, ApiError> {
        let request = self.build_get_user(id);
        debug!(url = %request.path, "fetching user");
        let response = transport.execute(request).await.map_err(|e| {
            warn!(user_id = %id, error = %e, "user request produced no response");
            ApiError::Transport { cause: e.0 }
        })?;
        self.parse_get_user(response)
    }
}

/// Map a non-2xx response to `ApiError::Http`, preferring the server's own
/// `detail` when the body is a well-formed error document.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let error = match schema::parse_error_body(&response.body) {
        Ok(body) => ApiError::Http {
            status: body.http_status().unwrap_or(response.status),
            message: body.detail,
        },
        Err(_) => ApiError::Http {
            status: response.status,
            message: fallback_message(response.status).to_string(),
        },
    };
    debug!(status = response.status, message = %error, "user request failed");
    Err(error)
}

fn fallback_message(status: u16) -> &'static str {
    match status {
        404 => MSG_NOT_FOUND,
        503 => MSG_UNAVAILABLE,
        _ => MSG_FETCH_FAILED,
    }
}
