//! Lookups against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the client over
//! real HTTP: once synchronously through `UreqTransport::execute_blocking`,
//! and once end-to-end through a `LookupSession`.

use std::net::SocketAddr;

use mock_server::{Fault, MockConfig, MockState};
use user_core::{
    ApiError, FetchOutcome, LookupSession, RetryPolicy, UreqTransport, UserClient, UserId, ViewState,
};

fn id(raw: u64) -> UserId {
    UserId::new(raw).unwrap()
}

/// Serve `state` from a dedicated thread and return its address.
fn start_server(state: MockState) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, state, &MockConfig::default()).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn lookup_lifecycle() {
    let state = MockState::default();
    state.fail_next(5, [Fault::MalformedUser]);
    let addr = start_server(state.clone());
    let client = UserClient::new(&format!("http://{addr}"));
    let transport = UreqTransport::new();

    // Step 1: a sample user parses and validates.
    let req = client.build_get_user(id(1));
    let user = client
        .parse_get_user(transport.execute_blocking(&req).unwrap())
        .unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.full_name(), "George Bluth");

    // Step 2: every sample id round-trips to the same id.
    for raw in 1..=12 {
        let req = client.build_get_user(id(raw));
        let user = client
            .parse_get_user(transport.execute_blocking(&req).unwrap())
            .unwrap();
        assert_eq!(user.id, raw as i64);
    }

    // Step 3: unknown id surfaces the server's detail.
    let req = client.build_get_user(id(999999));
    let err = client
        .parse_get_user(transport.execute_blocking(&req).unwrap())
        .unwrap_err();
    assert_eq!(err.message(), "User not found");
    assert_eq!(err.status(), Some(404));

    // Step 4: a 200 with a broken payload is a data error.
    let req = client.build_get_user(id(5));
    let err = client
        .parse_get_user(transport.execute_blocking(&req).unwrap())
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
    assert_eq!(state.hits(5), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_user_reports_transport_failure() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = UserClient::new(&format!("http://{addr}"));

    let err = client.fetch_user(&UreqTransport::new(), id(1)).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(err.status(), None);
}

#[test]
fn truncated_body_is_a_transport_failure() {
    use std::io::{Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf);
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 500\r\nConnection: close\r\n\r\n{\"data\":")
            .unwrap();
    });

    let client = UserClient::new(&format!("http://{addr}"));
    let req = client.build_get_user(id(1));
    assert!(UreqTransport::new().execute_blocking(&req).is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn session_retries_through_unavailable() {
    let state = MockState::default();
    state.fail_next(3, [Fault::unavailable(), Fault::unavailable()]);
    let addr = start_server(state.clone());

    let session = LookupSession::spawn(
        UserClient::new(&format!("http://{addr}")),
        UreqTransport::new(),
        RetryPolicy::immediate(),
    );
    session.navigate("/user/3").unwrap();

    let state_after = session
        .subscribe()
        .wait_for(|s| s.user().is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(state_after.user().unwrap().first_name, "Emma");
    assert_eq!(state.hits(3), 3);

    session.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn session_does_not_retry_not_found() {
    let state = MockState::default();
    let addr = start_server(state.clone());

    let session = LookupSession::spawn(
        UserClient::new(&format!("http://{addr}")),
        UreqTransport::new(),
        RetryPolicy::immediate(),
    );
    session.navigate("/user/999999").unwrap();

    let settled = session
        .subscribe()
        .wait_for(|s| s.error_message().is_some())
        .await
        .unwrap()
        .clone();
    match settled {
        ViewState::Active {
            outcome: FetchOutcome::Failure(failure),
            ..
        } => {
            assert_eq!(failure.message, "User not found");
            assert_eq!(failure.status, Some(404));
        }
        other => panic!("unexpected state: {other:?}"),
    }
    assert_eq!(state.hits(999999), 1);

    session.shutdown().await;
}
