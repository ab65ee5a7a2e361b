//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `UserClient` builds an
//! `HttpRequest` and parses an `HttpResponse`; whoever holds a `Transport`
//! (the async session, the FFI host, a test) performs the round-trip.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross the FFI
//! boundary and task boundaries without lifetime concerns.

use std::future::Future;

/// HTTP method for a request. The lookup API is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`. Non-2xx
/// statuses are data here, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response at all (DNS, refused connection, reset).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);

/// Executes one `HttpRequest` and yields its `HttpResponse`.
///
/// Implementations must return HTTP error statuses as `Ok(HttpResponse)`;
/// `Err` is reserved for requests that produced no response.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// `Transport` backed by a blocking `ureq` agent run on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Execute a request on the current thread.
    pub fn execute_blocking(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.agent.get(&request.path),
        };
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let mut response = builder
            .call()
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let transport = self.clone();
        async move {
            tokio::task::spawn_blocking(move || transport.execute_blocking(&request))
                .await
                .map_err(|e| TransportError(e.to_string()))?
        }
    }
}
