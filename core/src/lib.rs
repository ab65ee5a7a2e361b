//! API client core for the user lookup service.
//!
//! # Overview
//! Turns a route parameter into a validated `User` lookup with loading,
//! error, and success states. The HTTP layer follows the host-does-IO
//! pattern: `UserClient` builds `HttpRequest` values and parses
//! `HttpResponse` values, and a `Transport` (or an FFI host) performs the
//! round-trip.
//!
//! # Design
//! - `UserClient` is stateless and holds only `base_url`.
//! - `ViewStateController` is a pure state machine. It emits fetch commands
//!   and accepts ticketed completions, discarding any that belong to an id
//!   that is no longer active.
//! - `LookupSession` drives the controller on tokio and publishes the visible
//!   state through a `watch` channel.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod retry;
pub mod route;
pub mod schema;
pub mod session;
pub mod types;
pub mod user_id;
pub mod view;

pub use client::UserClient;
pub use config::Config;
pub use controller::{FetchCommand, FetchOutcome, LookupFailure, Ticket, ViewState, ViewStateController};
pub use error::{ApiError, InvalidUserId, LookupError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use retry::RetryPolicy;
pub use route::Route;
pub use session::{LookupSession, SessionClosed};
pub use types::{ErrorBody, User, UserResponse};
pub use user_id::UserId;
