//! Client-side route table.
//!
//! `/` is the landing page, `/user` and `/user/:id` are the lookup view, and
//! every other path redirects to `/`.

use crate::user_id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home { redirected: bool },
    UserLookup { id: Option<String> },
}

impl Route {
    pub fn resolve(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Home { redirected: false },
            ["user"] => Route::UserLookup { id: None },
            ["user", id] => Route::UserLookup {
                id: Some((*id).to_string()),
            },
            _ => Route::Home { redirected: true },
        }
    }

    /// The raw `:id` segment, if this route has one.
    pub fn user_param(&self) -> Option<&str> {
        match self {
            Route::UserLookup { id } => id.as_deref(),
            Route::Home { .. } => None,
        }
    }

    /// Canonical path for the address bar.
    pub fn path(&self) -> String {
        match self {
            Route::Home { .. } => "/".to_string(),
            Route::UserLookup { id: None } => "/user".to_string(),
            Route::UserLookup { id: Some(id) } => format!("/user/{id}"),
        }
    }
}

/// Path to navigate to when the user types `input` into the id field.
/// Returns `None` for anything that is not a valid id, leaving the current
/// route untouched.
pub fn user_path(input: &str) -> Option<String> {
    input
        .parse::<UserId>()
        .ok()
        .map(|id| format!("/user/{id}"))
}
