//! Plain-text rendering of the lookup view and landing page.

use std::fmt::Write;

use crate::controller::{FetchOutcome, ViewState, INVALID_ID_MESSAGE};

pub const SAMPLE_USERS: std::ops::RangeInclusive<u64> = 1..=12;

const INSTRUCTIONS: &str =
    "Enter a user ID above to view user details, or visit /user/1 to /user/12 for sample users.";

pub fn render(state: &ViewState) -> String {
    match state {
        ViewState::Idle => format!("[instructions]\n{INSTRUCTIONS}\n"),
        ViewState::InvalidId { .. } => format!("[error]\nError: {INVALID_ID_MESSAGE}\n"),
        ViewState::Active { id, outcome } => match outcome {
            FetchOutcome::Loading => format!("[loading]\nLoading user {id}...\n"),
            FetchOutcome::Failure(failure) => format!("[error]\nError: {}\n", failure.message),
            FetchOutcome::Success(user) => format!(
                "[user]\n{}\nID: {}\nEmail: {}\nAvatar: {}\n",
                user.full_name(),
                user.id,
                user.email,
                user.avatar
            ),
        },
    }
}

pub fn render_home() -> String {
    let mut out = String::from(
        "User Data Application\n\n\
         How to use:\n  \
         - pick a sample user below\n  \
         - or navigate to /user/<id>\n\n\
         Sample users:\n",
    );
    for id in SAMPLE_USERS {
        let _ = writeln!(out, "  /user/{id}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::LookupFailure;
    use crate::types::User;
    use crate::user_id::UserId;

    fn id(raw: u64) -> UserId {
        UserId::new(raw).unwrap()
    }

    #[test]
    fn idle_shows_instructions() {
        assert!(render(&ViewState::Idle).contains("/user/1 to /user/12"));
    }

    #[test]
    fn failure_shows_resolved_message() {
        let state = ViewState::Active {
            id: id(999999),
            outcome: FetchOutcome::Failure(LookupFailure {
                message: "User not found".to_string(),
                status: Some(404),
            }),
        };
        assert_eq!(render(&state), "[error]\nError: User not found\n");
    }

    #[test]
    fn success_shows_card() {
        let state = ViewState::Active {
            id: id(1),
            outcome: FetchOutcome::Success(User {
                id: 1,
                email: "george.bluth@reqres.in".to_string(),
                first_name: "George".to_string(),
                last_name: "Bluth".to_string(),
                avatar: "https://reqres.in/img/faces/1-image.jpg".to_string(),
            }),
        };
        let card = render(&state);
        assert!(card.starts_with("[user]\nGeorge Bluth\nID: 1\n"));
        assert!(card.contains("Email: george.bluth@reqres.in"));
    }

    #[test]
    fn loading_and_invalid_panels() {
        let loading = ViewState::Active {
            id: id(4),
            outcome: FetchOutcome::Loading,
        };
        assert!(render(&loading).starts_with("[loading]"));
        let invalid = ViewState::InvalidId {
            input: "abc".to_string(),
        };
        assert!(render(&invalid).contains("Invalid user ID"));
    }

    #[test]
    fn home_lists_all_sample_users() {
        let home = render_home();
        assert!(home.contains("/user/1\n"));
        assert!(home.contains("/user/12\n"));
        assert!(!home.contains("/user/13"));
    }
}
