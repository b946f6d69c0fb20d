//! HTTP transport seam
//!
//! The client never talks to `reqwest` directly. Everything goes through
//! `HttpTransport`, which the production adapter implements with a pooled
//! connection and which tests replace with a scripted stub.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::TransportError;

/// HTTP method used by the ERP endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request relative to the ERP base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpRequest {
    pub method: Method,
    /// Path starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub content_type: Option<&'static str>,
}

impl ErpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
            content_type: None,
        }
    }

    pub fn post(path: impl Into<String>, body: String, content_type: &'static str) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            content_type: Some(content_type),
        }
    }

    /// Adds a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Replaces every occurrence of a query parameter with a single value
    pub fn set_query(&mut self, key: &str, value: impl Into<String>) {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.into()));
    }

    /// First value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response from the ERP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ErpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Correlation id assigned by the ERP, if any
    pub fn request_id(&self) -> Option<&str> {
        self.header("X-Request-Id")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the ERP
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs one HTTP exchange. Any status code is a successful exchange.
    async fn send(&self, request: &ErpRequest) -> Result<ErpResponse, TransportError>;

    /// Releases pooled connections. Calling it more than once is a no-op.
    async fn close(&self) {}
}

/// Production transport backed by a pooled `reqwest::Client`
pub struct ReqwestTransport {
    base_url: String,
    client: RwLock<Option<reqwest::Client>>,
}

impl ReqwestTransport {
    /// Builds the connection pool
    ///
    /// `verify_ssl = false` accepts self-signed certificates, which on-premise
    /// ERP servers commonly use.
    pub fn new(base_url: &str, timeout: Duration, verify_ssl: bool) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: RwLock::new(Some(client)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ErpRequest) -> Result<ErpResponse, TransportError> {
        // reqwest::Client is a handle onto a shared pool
        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or(TransportError::Closed)?;

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => client.get(&url),
            Method::Post => client.post(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            if let Some(content_type) = request.content_type {
                builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
            }
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify)?;

        debug!(path = %request.path, status, bytes = body.len(), "ERP exchange completed");

        Ok(ErpResponse {
            status,
            headers,
            body,
        })
    }

    async fn close(&self) {
        if self.client.write().await.take().is_some() {
            debug!(base_url = %self.base_url, "ERP transport closed");
        }
    }
}

/// Scripted transport for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// One scripted outcome
    #[derive(Debug, Clone)]
    pub enum Reply {
        Respond(ErpResponse),
        Fail(TransportError),
    }

    /// A request seen by the stub, with the (possibly paused) clock reading
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub request: ErpRequest,
        pub at: Instant,
    }

    /// Replays queued replies per path, then repeats the path's fallback
    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        queued: Mutex<HashMap<String, VecDeque<Reply>>>,
        fallback: Mutex<HashMap<String, Reply>>,
        calls: Mutex<Vec<RecordedCall>>,
        latency: Option<Duration>,
        closed: AtomicBool,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every exchange takes this long before replying
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Queues a reply for the next unanswered request to `path`
        pub fn push(&self, path: &str, reply: Reply) -> &Self {
            lock(&self.queued)
                .entry(path.to_string())
                .or_default()
                .push_back(reply);
            self
        }

        /// Queues a plain response
        pub fn respond(&self, path: &str, status: u16, body: &str) -> &Self {
            self.push(path, Reply::Respond(ErpResponse::new(status, body)))
        }

        /// Reply used once the queue for `path` is drained
        pub fn always(&self, path: &str, reply: Reply) -> &Self {
            lock(&self.fallback).insert(path.to_string(), reply);
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            lock(&self.calls).clone()
        }

        pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
            lock(&self.calls)
                .iter()
                .filter(|c| c.request.path == path)
                .cloned()
                .collect()
        }

        pub fn count(&self, path: &str) -> usize {
            lock(&self.calls)
                .iter()
                .filter(|c| c.request.path == path)
                .count()
        }

        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }

        fn next_reply(&self, path: &str) -> Option<Reply> {
            let queued = lock(&self.queued)
                .get_mut(path)
                .and_then(VecDeque::pop_front);
            queued.or_else(|| lock(&self.fallback).get(path).cloned())
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: &ErpRequest) -> Result<ErpResponse, TransportError> {
            if self.is_closed() {
                return Err(TransportError::Closed);
            }

            lock(&self.calls).push(RecordedCall {
                request: request.clone(),
                at: Instant::now(),
            });

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            match self.next_reply(&request.path) {
                Some(Reply::Respond(response)) => Ok(response),
                Some(Reply::Fail(err)) => Err(err),
                None => Err(TransportError::Request(format!(
                    "no scripted reply for {}",
                    request.path
                ))),
            }
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{Reply, ScriptedTransport};
    use super::*;

    #[test]
    fn test_set_query_replaces_value() {
        let mut request = ErpRequest::get("/x").with_query("key", "old");
        request.set_query("key", "new");
        assert_eq!(request.query, vec![("key".to_string(), "new".to_string())]);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = ErpResponse::new(500, "").with_header("x-request-id", "abc");
        assert_eq!(response.request_id(), Some("abc"));
    }

    #[tokio::test]
    async fn test_scripted_queue_then_fallback() {
        let stub = ScriptedTransport::new();
        stub.respond("/a", 503, "busy")
            .always("/a", Reply::Respond(ErpResponse::new(200, "ok")));

        let request = ErpRequest::get("/a");
        assert_eq!(stub.send(&request).await.unwrap().status, 503);
        assert_eq!(stub.send(&request).await.unwrap().status, 200);
        assert_eq!(stub.send(&request).await.unwrap().status, 200);
        assert_eq!(stub.count("/a"), 3);
    }

    #[tokio::test]
    async fn test_scripted_unknown_path_fails() {
        let stub = ScriptedTransport::new();
        let err = stub.send(&ErpRequest::get("/nowhere")).await.unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }

    #[tokio::test]
    async fn test_reqwest_close_is_idempotent() {
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9/", Duration::from_secs(1), true).unwrap();
        assert_eq!(transport.base_url(), "http://127.0.0.1:9");

        transport.close().await;
        transport.close().await;

        let err = transport.send(&ErpRequest::get("/resto/api/auth")).await.unwrap_err();
        assert_eq!(err, TransportError::Closed);
    }
}
