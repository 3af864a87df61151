//! HTTP transport implementation.
//!
//! The transport speaks the JSON protocol of `/api/note/{slug}`. The actual
//! HTTP client is abstracted via a trait so the engine can run over
//! reqwest or be routed straight into an in-process server.

use crate::error::{SyncError, SyncResult};
use crate::transport::NoteTransport;
use notepad_protocol::{ErrorResponse, NoteResponse, SaveRequest, SaveResponse, Slug};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// HTTP methods used by the note protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read a note.
    Get,
    /// Debounced save.
    Put,
    /// Teardown beacon.
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
        })
    }
}

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for a `2xx` status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// `Err` means no response was received at all. Any status the server
/// answered with, including `4xx`/`5xx`, is an `Ok` response.
pub trait HttpClient: Send + Sync {
    /// Sends a request. `body` is empty for `GET`.
    fn request(&self, method: HttpMethod, url: &str, body: Vec<u8>) -> Result<HttpResponse, String>;
}

/// Builds the note endpoint URL under `base_url`.
pub(crate) fn note_url(base_url: &str, slug: &Slug) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), slug.api_path())
}

/// HTTP-based note transport.
pub struct HttpTransport<C: HttpClient> {
    /// Base URL of the note server (e.g. `http://127.0.0.1:3000`).
    base_url: String,
    client: C,
    /// Whether the last request got a response.
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns false if the last request could not reach the server.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns the error from the last request, or `None` if it succeeded.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn exchange<Res: DeserializeOwned>(
        &self,
        method: HttpMethod,
        slug: &Slug,
        body: Vec<u8>,
    ) -> SyncResult<Res> {
        let url = note_url(&self.base_url, slug);

        let response = match self.client.request(method, &url, body) {
            Ok(response) => {
                self.connected.store(true, Ordering::SeqCst);
                response
            }
            Err(e) => {
                tracing::debug!(%method, %url, error = %e, "request failed");
                self.connected.store(false, Ordering::SeqCst);
                *self.last_error.write() = Some(e.clone());
                return Err(SyncError::Transport(e));
            }
        };

        if !response.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&response.body)
                .map(|e| e.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).into_owned());
            let err = SyncError::Status {
                status: response.status,
                message,
            };
            *self.last_error.write() = Some(err.to_string());
            return Err(err);
        }

        *self.last_error.write() = None;
        serde_json::from_slice(&response.body)
            .map_err(|e| SyncError::Protocol(format!("failed to decode response: {e}")))
    }
}

impl<C: HttpClient> NoteTransport for HttpTransport<C> {
    fn fetch(&self, slug: &Slug) -> SyncResult<NoteResponse> {
        self.exchange(HttpMethod::Get, slug, Vec::new())
    }

    fn store(&self, slug: &Slug, content: &str) -> SyncResult<SaveResponse> {
        self.exchange(HttpMethod::Put, slug, SaveRequest::new(content).to_json())
    }
}

/// Blocking HTTP client backed by reqwest.
///
/// Must not be used from inside an async runtime.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::transport(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn request(&self, method: HttpMethod, url: &str, body: Vec<u8>) -> Result<HttpResponse, String> {
        let builder = match method {
            HttpMethod::Get => self.client.get(url).header("cache-control", "no-store"),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Post => self.client.post(url),
        };
        let builder = if method == HttpMethod::Get {
            builder
        } else {
            builder.header("content-type", "application/json").body(body)
        };

        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| e.to_string())?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a request for `path` (e.g. `/api/note/my-note`).
    fn handle(&self, method: HttpMethod, path: &str, body: &[u8]) -> HttpResponse;
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead. Taking it offline
/// makes every request fail as if the host were unreachable.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
    online: AtomicBool,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self {
            server,
            online: AtomicBool::new(true),
        }
    }

    /// Simulates losing or regaining the network.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn request(&self, method: HttpMethod, url: &str, body: Vec<u8>) -> Result<HttpResponse, String> {
        if !self.online.load(Ordering::SeqCst) {
            return Err("network unreachable".into());
        }

        // Extract path from URL
        let path = url.find("/api/").map(|i| &url[i..]).unwrap_or(url);

        Ok(self.server.handle(method, path, &body))
    }
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn request(&self, method: HttpMethod, url: &str, body: Vec<u8>) -> Result<HttpResponse, String> {
        (**self).request(method, url, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct TestClient {
        response: RwLock<Option<HttpResponse>>,
        requests: RwLock<Vec<(HttpMethod, String, Vec<u8>)>>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: RwLock::new(None),
                requests: RwLock::new(Vec::new()),
            }
        }

        fn set_response(&self, status: u16, body: &str) {
            *self.response.write() = Some(HttpResponse::new(status, body.as_bytes()));
        }
    }

    impl HttpClient for TestClient {
        fn request(
            &self,
            method: HttpMethod,
            url: &str,
            body: Vec<u8>,
        ) -> Result<HttpResponse, String> {
            self.requests.write().push((method, url.to_string(), body));
            self.response
                .read()
                .clone()
                .ok_or_else(|| "connection refused".into())
        }
    }

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    #[test]
    fn transport_creation() {
        let transport = HttpTransport::new("http://localhost:3000", TestClient::new());
        assert_eq!(transport.base_url(), "http://localhost:3000");
        assert!(transport.is_connected());
        assert!(transport.last_error().is_none());
    }

    #[test]
    fn fetch_builds_note_url() {
        let client = TestClient::new();
        client.set_response(200, r#"{"slug":"my-note","content":"abc","updatedAt":null}"#);
        let transport = HttpTransport::new("http://localhost:3000/", client);

        let note = transport.fetch(&slug("my-note")).unwrap();
        assert_eq!(note.content, "abc");

        let requests = transport.client.requests.read();
        assert_eq!(requests[0].0, HttpMethod::Get);
        assert_eq!(requests[0].1, "http://localhost:3000/api/note/my-note");
        assert!(requests[0].2.is_empty());
    }

    #[test]
    fn store_sends_put_with_json_body() {
        let client = TestClient::new();
        let saved = SaveResponse::success(Utc::now());
        client.set_response(200, &serde_json::to_string(&saved).unwrap());
        let transport = HttpTransport::new("http://localhost:3000", client);

        let response = transport.store(&slug("x"), "hello").unwrap();
        assert_eq!(response, saved);

        let requests = transport.client.requests.read();
        assert_eq!(requests[0].0, HttpMethod::Put);
        assert_eq!(
            SaveRequest::from_json(&requests[0].2).unwrap().content,
            "hello"
        );
    }

    #[test]
    fn unreachable_server_is_transport_failure() {
        let transport = HttpTransport::new("http://localhost:3000", TestClient::new());

        let err = transport.fetch(&slug("x")).unwrap_err();
        assert!(err.is_transport_failure());
        assert!(!transport.is_connected());
        assert_eq!(transport.last_error().as_deref(), Some("connection refused"));

        // Reachability is recovered by the next answered request.
        transport.client.set_response(200, r#"{"slug":"x","content":"","updatedAt":null}"#);
        transport.fetch(&slug("x")).unwrap();
        assert!(transport.is_connected());
        assert!(transport.last_error().is_none());
    }

    #[test]
    fn error_status_carries_server_message() {
        let client = TestClient::new();
        client.set_response(400, r#"{"error":"Invalid slug. Use letters"}"#);
        let transport = HttpTransport::new("http://localhost:3000", client);

        match transport.fetch(&slug("x")).unwrap_err() {
            SyncError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid slug. Use letters");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(transport.is_connected());
    }

    #[test]
    fn malformed_body_is_protocol_error() {
        let client = TestClient::new();
        client.set_response(200, "<html>proxy login</html>");
        let transport = HttpTransport::new("http://localhost:3000", client);

        let err = transport.fetch(&slug("x")).unwrap_err();
        assert!(matches!(err, SyncError::Protocol(_)));
    }

    struct EchoServer;

    impl LoopbackServer for EchoServer {
        fn handle(&self, method: HttpMethod, path: &str, _body: &[u8]) -> HttpResponse {
            HttpResponse::new(200, format!("{method} {path}"))
        }
    }

    #[test]
    fn loopback_strips_host() {
        let client = LoopbackClient::new(EchoServer);
        let response = client
            .request(HttpMethod::Post, "http://example.com/api/note/x", Vec::new())
            .unwrap();
        assert_eq!(response.body, b"POST /api/note/x");

        client.set_online(false);
        assert!(client
            .request(HttpMethod::Get, "http://example.com/api/note/x", Vec::new())
            .is_err());
    }
}
