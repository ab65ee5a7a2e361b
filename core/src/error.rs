//! Error types for the user lookup client.
//!
//! # Design
//! Every way a lookup can fail collapses into `ApiError`, whose `Display`
//! output is the message shown to the user. The variants keep the origin
//! (no response, HTTP status, bad payload) so callers such as the retry
//! policy can branch on it without parsing strings.

use thiserror::Error;

pub(crate) const MSG_NOT_FOUND: &str = "User not found";
pub(crate) const MSG_UNAVAILABLE: &str = "Service temporarily unavailable. Please try again later.";
pub(crate) const MSG_FETCH_FAILED: &str = "Failed to fetch user data";
pub(crate) const MSG_INVALID_RESPONSE: &str = "Invalid response format from server";
pub(crate) const MSG_TRANSPORT: &str =
    "Unable to connect to the server. Please check your connection and try again.";
pub(crate) const MSG_LOAD_FAILED: &str = "Failed to load user";

/// Errors returned by `UserClient::parse_get_user` and `fetch_user`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response arrived: the transport itself failed.
    #[error("{}", MSG_TRANSPORT)]
    Transport { cause: String },

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx response whose body does not match the `{ data: User }` shape.
    #[error("{}", MSG_INVALID_RESPONSE)]
    InvalidResponse(ValidationError),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport { .. } | ApiError::InvalidResponse(_) => None,
        }
    }

    /// User-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Structural mismatch between a JSON document and the expected schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("body is not valid JSON: {0}")]
    NotJson(String),

    #[error("unexpected shape: {0}")]
    Shape(String),

    #[error("`{field}` is not a valid email address")]
    InvalidEmail { field: &'static str },

    #[error("`{field}` is not a valid URL")]
    InvalidUrl { field: &'static str },
}

/// Why a route parameter is not a usable user id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUserId {
    #[error("user id is empty")]
    Empty,

    #[error("user id is not a base-10 integer")]
    NotANumber,

    #[error("user id must be greater than zero")]
    NotPositive,
}

/// Failure of one lookup attempt as seen by the view state controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Anything outside the API contract, e.g. the fetch task panicked.
    #[error("{}", MSG_LOAD_FAILED)]
    Unexpected(String),
}

impl LookupError {
    pub fn status(&self) -> Option<u16> {
        match self {
            LookupError::Api(err) => err.status(),
            LookupError::Unexpected(_) => None,
        }
    }
}
