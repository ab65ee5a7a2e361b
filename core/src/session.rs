//! Async driver for `ViewStateController`.
//!
//! # Design
//! One reducer task owns the controller and is the only writer of the
//! `watch` cell holding the visible `ViewState`. Route changes arrive over an
//! mpsc channel. Each `FetchCommand` runs as its own task and reports back
//! over a second channel, so slow requests never block navigation. Whether a
//! late result still matters is decided by the controller's ticket check,
//! never by arrival order.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::client::UserClient;
use crate::controller::{FetchCommand, Ticket, ViewState, ViewStateController};
use crate::error::LookupError;
use crate::http::Transport;
use crate::retry::RetryPolicy;
use crate::route::Route;
use crate::types::User;

/// The reducer task has stopped; no further input is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("lookup session has shut down")]
pub struct SessionClosed;

struct Completion {
    ticket: Ticket,
    result: Result<User, LookupError>,
}

/// Handle to a running lookup. Dropping it stops the reducer.
#[derive(Debug)]
pub struct LookupSession {
    params: mpsc::UnboundedSender<Option<String>>,
    state: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

impl LookupSession {
    /// Start the reducer on the current tokio runtime.
    pub fn spawn<T: Transport>(client: UserClient, transport: T, policy: RetryPolicy) -> Self {
        let (params_tx, params_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ViewState::Idle);
        let reducer = Reducer {
            controller: ViewStateController::new(policy),
            client,
            transport: Arc::new(transport),
            state: state_tx,
        };
        let task = tokio::spawn(reducer.run(params_rx));
        Self {
            params: params_tx,
            state: state_rx,
            task,
        }
    }

    /// Feed the route's `:id` parameter.
    pub fn set_param(&self, param: Option<&str>) -> Result<(), SessionClosed> {
        self.params
            .send(param.map(str::to_string))
            .map_err(|_| SessionClosed)
    }

    /// Resolve `path` and feed its parameter. Non-lookup routes clear the
    /// lookup. Returns the resolved route.
    pub fn navigate(&self, path: &str) -> Result<Route, SessionClosed> {
        let route = Route::resolve(path);
        self.set_param(route.user_param())?;
        Ok(route)
    }

    /// Latest published state.
    pub fn current(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every published state change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }

    /// Stop accepting input and wait for the reducer to exit.
    pub async fn shutdown(self) {
        let Self { params, task, .. } = self;
        drop(params);
        if let Err(e) = task.await {
            error!(error = %e, "lookup reducer ended abnormally");
        }
    }
}

struct Reducer<T> {
    controller: ViewStateController,
    client: UserClient,
    transport: Arc<T>,
    state: watch::Sender<ViewState>,
}

impl<T: Transport> Reducer<T> {
    async fn run(mut self, mut params: mpsc::UnboundedReceiver<Option<String>>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        loop {
            let command = tokio::select! {
                param = params.recv() => match param {
                    Some(param) => self.controller.set_route_param(param.as_deref()),
                    None => break,
                },
                Some(done) = done_rx.recv() => self.controller.complete(done.ticket, done.result),
            };
            self.publish();
            if let Some(command) = command {
                self.dispatch(command, done_tx.clone());
            }
        }
        debug!("lookup session closed");
    }

    fn publish(&self) {
        let next = self.controller.state();
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn dispatch(&self, command: FetchCommand, done: mpsc::UnboundedSender<Completion>) {
        let FetchCommand { ticket, delay } = command;
        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let fetch = tokio::spawn(async move {
                client
                    .fetch_user(transport.as_ref(), ticket.user_id)
                    .await
                    .map_err(LookupError::from)
            });
            let result = fetch.await.unwrap_or_else(|e| {
                error!(user_id = %ticket.user_id, error = %e, "fetch task failed");
                Err(LookupError::Unexpected(e.to_string()))
            });
            // The reducer may already be gone; nothing left to update then.
            let _ = done.send(Completion { ticket, result });
        });
    }
}
