//! Interactive terminal front end for the user lookup.
//!
//! Each input line is a path (`/`, `/user`, `/user/3`) or a bare id. The
//! view is printed once the lookup for that route has settled.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use user_core::controller::{FetchOutcome, ViewState};
use user_core::route::{self, Route};
use user_core::{view, Config, LookupSession, UreqTransport, UserClient, UserId};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(api_base_url = %config.api_base_url, "starting user lookup");

    let session = LookupSession::spawn(
        UserClient::new(&config.api_base_url),
        UreqTransport::new(),
        config.retry,
    );
    let mut states = session.subscribe();

    println!("{}", view::render_home());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let path = if input.starts_with('/') {
            input.to_string()
        } else {
            match route::user_path(input) {
                Some(path) => path,
                None => {
                    println!("Enter a positive user ID or a path such as /user/1");
                    continue;
                }
            }
        };

        let route = session.navigate(&path)?;
        match &route {
            Route::Home { redirected } => {
                if *redirected {
                    println!("{path} not found, redirected to /");
                }
                println!("{}", view::render_home());
            }
            Route::UserLookup { .. } => {
                let state = states.wait_for(|state| is_settled(&route, state)).await?.clone();
                println!("{}", view::render(&state));
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

/// Whether `state` is the final state for `route`.
fn is_settled(route: &Route, state: &ViewState) -> bool {
    match route.user_param() {
        None => *state == ViewState::Idle,
        Some(raw) => match raw.parse::<UserId>() {
            Ok(id) => matches!(
                state,
                ViewState::Active { id: active, outcome } if *active == id && *outcome != FetchOutcome::Loading
            ),
            Err(_) => matches!(state, ViewState::InvalidId { input } if input == raw),
        },
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
