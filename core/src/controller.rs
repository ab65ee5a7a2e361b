//! View state controller: route parameter in, visible lookup state out.
//!
//! # Design
//! The controller is a synchronous state machine with no I/O. Feeding it a
//! route parameter or a completed request returns at most one
//! `FetchCommand`; the caller performs that fetch and later reports the
//! result with the command's `Ticket`. Only the ticket of the active lookup
//! can change visible state, so responses for an id that is no longer active
//! are dropped no matter when they arrive.
//!
//! At most one request per id is in flight. Returning to an id whose earlier
//! request is still outstanding adopts that request instead of issuing
//! another.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::LookupError;
use crate::retry::RetryPolicy;
use crate::types::User;
use crate::user_id::UserId;

pub const INVALID_ID_MESSAGE: &str = "Invalid user ID";

/// Identity of one physical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub user_id: UserId,
    pub serial: u64,
    /// 1-based attempt number within the lookup.
    pub attempt: u32,
}

/// Instruction to fetch `ticket.user_id`, after waiting `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCommand {
    pub ticket: Ticket,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub message: String,
    pub status: Option<u16>,
}

/// State of the active lookup. Stays `Loading` through retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loading,
    Success(User),
    Failure(LookupFailure),
}

/// Everything the presentation layer needs to draw the lookup view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    /// No id in the route: show instructions.
    #[default]
    Idle,
    /// The route carries something that is not a positive integer.
    InvalidId { input: String },
    Active { id: UserId, outcome: FetchOutcome },
}

impl ViewState {
    pub fn active_id(&self) -> Option<UserId> {
        match self {
            ViewState::Active { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ViewState::Active {
                outcome: FetchOutcome::Loading,
                ..
            }
        )
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            ViewState::Active {
                outcome: FetchOutcome::Success(user),
                ..
            } => Some(user),
            _ => None,
        }
    }

    /// Message for the error panel, if one should be shown.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::InvalidId { .. } => Some(INVALID_ID_MESSAGE),
            ViewState::Active {
                outcome: FetchOutcome::Failure(failure),
                ..
            } => Some(&failure.message),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Lookup {
    id: UserId,
    ticket: Ticket,
    outcome: FetchOutcome,
}

#[derive(Debug, Default)]
pub struct ViewStateController {
    policy: RetryPolicy,
    next_serial: u64,
    input: Option<String>,
    active: Option<Lookup>,
    in_flight: HashMap<UserId, Ticket>,
}

impl ViewStateController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Current visible state.
    pub fn state(&self) -> ViewState {
        match (&self.active, &self.input) {
            (Some(lookup), _) => ViewState::Active {
                id: lookup.id,
                outcome: lookup.outcome.clone(),
            },
            (None, Some(input)) => ViewState::InvalidId {
                input: input.clone(),
            },
            (None, None) => ViewState::Idle,
        }
    }

    /// Number of requests issued and not yet completed, across all ids.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Apply the route's `:id` parameter (`None` when the route has none).
    pub fn set_route_param(&mut self, param: Option<&str>) -> Option<FetchCommand> {
        let Some(raw) = param else {
            self.active = None;
            self.input = None;
            return None;
        };

        let id = match raw.parse::<UserId>() {
            Ok(id) => id,
            Err(e) => {
                debug!(input = raw, reason = %e, "ignoring invalid user id");
                self.active = None;
                self.input = Some(raw.to_string());
                return None;
            }
        };

        self.input = Some(raw.to_string());
        if self.active.as_ref().is_some_and(|lookup| lookup.id == id) {
            return None;
        }

        if let Some(ticket) = self.in_flight.get(&id).copied() {
            debug!(user_id = %id, serial = ticket.serial, "adopting in-flight request");
            self.active = Some(Lookup {
                id,
                ticket,
                outcome: FetchOutcome::Loading,
            });
            return None;
        }

        let ticket = self.issue(id, 1);
        self.active = Some(Lookup {
            id,
            ticket,
            outcome: FetchOutcome::Loading,
        });
        Some(FetchCommand {
            ticket,
            delay: Duration::ZERO,
        })
    }

    /// Report the result of the request identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<User, LookupError>,
    ) -> Option<FetchCommand> {
        if self.in_flight.get(&ticket.user_id) == Some(&ticket) {
            self.in_flight.remove(&ticket.user_id);
        }

        let policy = self.policy;
        let lookup = match self.active.as_mut() {
            Some(lookup) if lookup.ticket == ticket => lookup,
            _ => {
                debug!(user_id = %ticket.user_id, serial = ticket.serial, "discarding stale response");
                return None;
            }
        };

        match result {
            Ok(user) => {
                lookup.outcome = FetchOutcome::Success(user);
                None
            }
            Err(err) if policy.should_retry(ticket.attempt, &err) => {
                warn!(
                    user_id = %ticket.user_id,
                    attempt = ticket.attempt,
                    error = %err,
                    "user lookup failed, retrying"
                );
                let delay = policy.delay(ticket.attempt);
                let next = self.issue(ticket.user_id, ticket.attempt + 1);
                if let Some(lookup) = self.active.as_mut() {
                    lookup.ticket = next;
                }
                Some(FetchCommand {
                    ticket: next,
                    delay,
                })
            }
            Err(err) => {
                warn!(user_id = %ticket.user_id, attempt = ticket.attempt, error = %err, "user lookup failed");
                lookup.outcome = FetchOutcome::Failure(LookupFailure {
                    message: err.to_string(),
                    status: err.status(),
                });
                None
            }
        }
    }

    fn issue(&mut self, user_id: UserId, attempt: u32) -> Ticket {
        self.next_serial += 1;
        let ticket = Ticket {
            user_id,
            serial: self.next_serial,
            attempt,
        };
        self.in_flight.insert(user_id, ticket);
        ticket
    }
}
