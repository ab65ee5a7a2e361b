//! Domain DTOs for the user lookup API.
//!
//! # Design
//! These types mirror the backend proxy's schema but are defined
//! independently of the mock-server crate; integration tests catch drift.
//! Deserializing into them only proves the JSON has the right field types.
//! The remaining shape rules (email, avatar URL) live in `schema`.

use serde::{Deserialize, Serialize};

/// A single user record as served by `GET /user/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Success envelope: the user is always wrapped in `data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub data: User,
}

/// Structured error body returned on non-2xx statuses.
///
/// `status_code` is any integer the server chose to send; only values that
/// fit an HTTP status are used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
}

impl ErrorBody {
    /// `status_code` as an HTTP status, if it is in range.
    pub fn http_status(&self) -> Option<u16> {
        self.status_code.and_then(|code| u16::try_from(code).ok())
    }
}
