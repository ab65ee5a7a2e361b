//! `LookupSession` behaviour against a scripted in-memory transport.
//!
//! Each path can be given a queue of steps (reply, fail, panic, or a reply
//! held until the test opens its gate). Unscripted paths answer with a valid
//! user whose id matches the path.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use user_core::{
    FetchOutcome, HttpRequest, HttpResponse, LookupSession, RetryPolicy, Transport, TransportError,
    UserClient, UserId, ViewState,
};

const BASE_URL: &str = "http://api.test";

enum Step {
    Reply(HttpResponse),
    Gated(Arc<Notify>, HttpResponse),
    Fail,
    Panic,
}

#[derive(Default)]
struct Script {
    steps: HashMap<String, VecDeque<Step>>,
    calls: Vec<String>,
    called_at: Vec<Instant>,
    finished: Vec<String>,
}

#[derive(Clone, Default)]
struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    fn push(&self, user_id: u64, step: Step) {
        self.script
            .lock()
            .unwrap()
            .steps
            .entry(format!("{BASE_URL}/user/{user_id}"))
            .or_default()
            .push_back(step);
    }

    /// Queue a reply for `user_id` that is held until the returned gate opens.
    fn gate(&self, user_id: u64, response: HttpResponse) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(user_id, Step::Gated(gate.clone(), response));
        gate
    }

    fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Time between consecutive calls.
    fn gaps(&self) -> Vec<Duration> {
        let script = self.script.lock().unwrap();
        script
            .called_at
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }

    fn finished(&self) -> Vec<String> {
        self.script.lock().unwrap().finished.clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let step = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(request.path.clone());
            script.called_at.push(Instant::now());
            script
                .steps
                .get_mut(&request.path)
                .and_then(VecDeque::pop_front)
        };
        let script = Arc::clone(&self.script);
        let path = request.path;
        async move {
            let result = match step {
                None => Ok(user_response(&path)),
                Some(Step::Reply(response)) => Ok(response),
                Some(Step::Gated(gate, response)) => {
                    gate.notified().await;
                    Ok(response)
                }
                Some(Step::Fail) => Err(TransportError("connection reset".to_string())),
                Some(Step::Panic) => panic!("transport exploded"),
            };
            script.lock().unwrap().finished.push(path);
            result
        }
    }
}

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

fn user_json(id: u64) -> String {
    serde_json::json!({
        "data": {
            "id": id,
            "email": format!("user{id}@reqres.in"),
            "first_name": "User",
            "last_name": format!("Number{id}"),
            "avatar": format!("https://reqres.in/img/faces/{id}-image.jpg"),
        }
    })
    .to_string()
}

fn user_response(path: &str) -> HttpResponse {
    let id: u64 = path.rsplit('/').next().unwrap().parse().unwrap();
    response(200, &user_json(id))
}

fn spawn(transport: &ScriptedTransport) -> LookupSession {
    LookupSession::spawn(
        UserClient::new(BASE_URL),
        transport.clone(),
        RetryPolicy::immediate(),
    )
}

/// Record every state the session publishes.
fn record(session: &LookupSession) -> Arc<Mutex<Vec<ViewState>>> {
    let mut rx = session.subscribe();
    let log = Arc::new(Mutex::new(vec![rx.borrow_and_update().clone()]));
    let sink = Arc::clone(&log);
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            sink.lock().unwrap().push(state);
        }
    });
    log
}

async fn settle(session: &LookupSession, done: impl FnMut(&ViewState) -> bool) -> ViewState {
    let mut rx = session.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(done))
        .await
        .expect("session did not settle")
        .unwrap()
        .clone();
    state
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}

fn user_id_of(state: &ViewState) -> Option<i64> {
    state.user().map(|user| user.id)
}

#[tokio::test]
async fn fetch_user_returns_requested_id() {
    let transport = ScriptedTransport::default();
    let client = UserClient::new(BASE_URL);
    for raw in [1, 7, 42, 999_999, u32::MAX as u64] {
        let user = client
            .fetch_user(&transport, UserId::new(raw).unwrap())
            .await
            .unwrap();
        assert_eq!(user.id, raw as i64);
    }
    assert_eq!(transport.calls().len(), 5);
}

#[tokio::test]
async fn malformed_ids_issue_no_fetch() {
    let transport = ScriptedTransport::default();
    let session = spawn(&transport);

    for input in ["", "abc", "0", "-5", "1.5", "1e3"] {
        session.set_param(Some(input)).unwrap();
        let state = settle(&session, |s| {
            matches!(s, ViewState::InvalidId { input: seen } if seen == input)
        })
        .await;
        assert_eq!(state.error_message(), Some("Invalid user ID"));
    }
    session.navigate("/user").unwrap();
    settle(&session, |s| *s == ViewState::Idle).await;

    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn not_found_is_fetched_once() {
    let transport = ScriptedTransport::default();
    transport.push(999_999, Step::Reply(response(404, r#"{"detail":"User not found"}"#)));
    let session = spawn(&transport);

    session.navigate("/user/999999").unwrap();
    let state = settle(&session, |s| s.error_message().is_some()).await;
    assert_eq!(state.error_message(), Some("User not found"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn not_found_without_body_uses_fallback_message() {
    let transport = ScriptedTransport::default();
    transport.push(13, Step::Reply(response(404, "")));
    let session = spawn(&transport);

    session.navigate("/user/13").unwrap();
    let state = settle(&session, |s| s.error_message().is_some()).await;
    assert_eq!(state.error_message(), Some("User not found"));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn recovers_after_two_unavailable_responses() {
    let transport = ScriptedTransport::default();
    transport.push(3, Step::Reply(response(503, "")));
    transport.push(3, Step::Reply(response(503, "")));
    let session = spawn(&transport);
    let history = record(&session);

    session.navigate("/user/3").unwrap();
    let state = settle(&session, |s| s.user().is_some()).await;
    assert_eq!(user_id_of(&state), Some(3));
    assert_eq!(transport.calls().len(), 3);

    // Retries are invisible: no failure was ever published.
    assert!(history
        .lock()
        .unwrap()
        .iter()
        .all(|s| s.error_message().is_none()));
}

#[tokio::test(start_paused = true)]
async fn retries_back_off_exponentially() {
    let transport = ScriptedTransport::default();
    transport.push(6, Step::Reply(response(503, "")));
    transport.push(6, Step::Fail);
    let session = LookupSession::spawn(
        UserClient::new(BASE_URL),
        transport.clone(),
        RetryPolicy::default(),
    );

    session.navigate("/user/6").unwrap();
    let state = settle(&session, |s| s.user().is_some()).await;
    assert_eq!(user_id_of(&state), Some(6));

    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 2);
    assert!(gaps[0] >= Duration::from_secs(1) && gaps[0] < Duration::from_secs(2), "{gaps:?}");
    assert!(gaps[1] >= Duration::from_secs(2) && gaps[1] < Duration::from_secs(4), "{gaps:?}");
}

#[tokio::test]
async fn gives_up_after_three_attempts() {
    let transport = ScriptedTransport::default();
    for _ in 0..3 {
        transport.push(8, Step::Reply(response(503, "")));
    }
    let session = spawn(&transport);

    session.navigate("/user/8").unwrap();
    let state = settle(&session, |s| s.error_message().is_some()).await;
    assert_eq!(
        state.error_message(),
        Some("Service temporarily unavailable. Please try again later.")
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.calls().len(), 3);
}

#[tokio::test]
async fn transport_failures_are_retried_then_reported() {
    let transport = ScriptedTransport::default();
    for _ in 0..3 {
        transport.push(2, Step::Fail);
    }
    let session = spawn(&transport);

    session.navigate("/user/2").unwrap();
    let state = settle(&session, |s| s.error_message().is_some()).await;
    match state {
        ViewState::Active {
            outcome: FetchOutcome::Failure(failure),
            ..
        } => assert_eq!(failure.status, None),
        other => panic!("unexpected state: {other:?}"),
    }
    assert_eq!(transport.calls().len(), 3);
}

#[tokio::test]
async fn panicking_fetch_shows_generic_failure() {
    let transport = ScriptedTransport::default();
    for _ in 0..3 {
        transport.push(6, Step::Panic);
    }
    let session = spawn(&transport);

    session.navigate("/user/6").unwrap();
    let state = settle(&session, |s| s.error_message().is_some()).await;
    assert_eq!(state.error_message(), Some("Failed to load user"));
}

#[tokio::test]
async fn invalid_success_payload_is_a_failure() {
    let transport = ScriptedTransport::default();
    for _ in 0..3 {
        transport.push(4, Step::Reply(response(200, r#"{"data":{"id":4}}"#)));
    }
    let session = spawn(&transport);

    session.navigate("/user/4").unwrap();
    let state = settle(&session, |s| s.error_message().is_some()).await;
    assert_eq!(state.error_message(), Some("Invalid response format from server"));
}

#[tokio::test]
async fn repeated_navigation_to_same_id_is_coalesced() {
    let transport = ScriptedTransport::default();
    let gate = transport.gate(5, user_response(&format!("{BASE_URL}/user/5")));
    let session = spawn(&transport);

    session.navigate("/user/5").unwrap();
    session.navigate("/user/5").unwrap();
    session.navigate("/user/05").unwrap();
    settle(&session, ViewState::is_loading).await;
    wait_until(|| !transport.calls().is_empty()).await;

    gate.notify_one();
    let state = settle(&session, |s| s.user().is_some()).await;
    assert_eq!(user_id_of(&state), Some(5));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn stale_response_never_overwrites_current_id() {
    let transport = ScriptedTransport::default();
    let gate_a = transport.gate(1, user_response(&format!("{BASE_URL}/user/1")));
    let gate_b = transport.gate(2, user_response(&format!("{BASE_URL}/user/2")));
    let session = spawn(&transport);
    let history = record(&session);

    session.navigate("/user/1").unwrap();
    wait_until(|| transport.calls().len() == 1).await;
    session.navigate("/user/2").unwrap();
    wait_until(|| transport.calls().len() == 2).await;

    // A arrives while B is still outstanding.
    gate_a.notify_one();
    wait_until(|| transport.finished().len() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let state = session.current();
    assert!(state.is_loading());
    assert_eq!(state.active_id().map(UserId::get), Some(2));

    gate_b.notify_one();
    let state = settle(&session, |s| s.user().is_some()).await;
    assert_eq!(user_id_of(&state), Some(2));

    assert!(history
        .lock()
        .unwrap()
        .iter()
        .all(|s| user_id_of(s) != Some(1)));
}

#[tokio::test]
async fn stale_failure_does_not_retry() {
    let transport = ScriptedTransport::default();
    let gate_a = transport.gate(1, response(503, ""));
    let session = spawn(&transport);

    session.navigate("/user/1").unwrap();
    wait_until(|| transport.calls().len() == 1).await;
    session.navigate("/user/2").unwrap();
    settle(&session, |s| user_id_of(s) == Some(2)).await;

    gate_a.notify_one();
    wait_until(|| transport.finished().len() == 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(transport.calls().len(), 2);
    assert_eq!(user_id_of(&session.current()), Some(2));
}

#[tokio::test]
async fn leaving_the_lookup_route_goes_idle() {
    let transport = ScriptedTransport::default();
    let session = spawn(&transport);

    session.navigate("/user/9").unwrap();
    settle(&session, |s| s.user().is_some()).await;

    let route = session.navigate("/nowhere").unwrap();
    assert_eq!(route.path(), "/");
    settle(&session, |s| *s == ViewState::Idle).await;
}

#[tokio::test]
async fn shutdown_closes_state_channel() {
    let transport = ScriptedTransport::default();
    let session = spawn(&transport);
    let probe = session.subscribe();

    session.shutdown().await;
    assert!(probe.has_changed().is_err());
}
