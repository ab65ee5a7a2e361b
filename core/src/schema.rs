//! Structural validation of API payloads.
//!
//! Serde proves field presence and types; the checks here add the string
//! formats (email shape, absolute avatar URL). Unknown fields are ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::ValidationError;
use crate::types::{ErrorBody, User, UserResponse};

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(email))
}

pub fn is_valid_url(candidate: &str) -> bool {
    Url::parse(candidate).is_ok()
}

/// Validate a bare user object.
pub fn validate_user(value: &Value) -> Result<User, ValidationError> {
    let user: User = from_value(value)?;
    check_user(&user)?;
    Ok(user)
}

/// Validate the `{ "data": User }` success envelope.
pub fn validate_user_response(value: &Value) -> Result<UserResponse, ValidationError> {
    let response: UserResponse = from_value(value)?;
    check_user(&response.data)?;
    Ok(response)
}

/// Validate the `{ "detail": string, "status_code"?: int }` error body.
pub fn validate_error_body(value: &Value) -> Result<ErrorBody, ValidationError> {
    from_value(value)
}

/// Parse raw text and validate it as a success envelope.
pub fn parse_user_response(body: &str) -> Result<UserResponse, ValidationError> {
    let value = parse_json(body)?;
    validate_user_response(&value)
}

/// Parse raw text and validate it as an error body.
pub fn parse_error_body(body: &str) -> Result<ErrorBody, ValidationError> {
    let value = parse_json(body)?;
    validate_error_body(&value)
}

fn parse_json(body: &str) -> Result<Value, ValidationError> {
    serde_json::from_str(body).map_err(|e| ValidationError::NotJson(e.to_string()))
}

fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, ValidationError> {
    T::deserialize(value).map_err(|e| ValidationError::Shape(e.to_string()))
}

fn check_user(user: &User) -> Result<(), ValidationError> {
    if !is_valid_email(&user.email) {
        return Err(ValidationError::InvalidEmail { field: "email" });
    }
    if !is_valid_url(&user.avatar) {
        return Err(ValidationError::InvalidUrl { field: "avatar" });
    }
    Ok(())
}
