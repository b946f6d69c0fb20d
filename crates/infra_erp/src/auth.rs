//! Token session
//!
//! The ERP hands out short-lived session tokens in exchange for a login and
//! SHA-1 password digest. Tokens are cached and refreshed ahead of expiry.
//! At most one refresh request is in flight at any time; concurrent callers
//! that find the cache stale wait for that refresh and share its token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Credentials, ErpClientConfig};
use crate::error::ErpError;
use crate::transport::{ErpRequest, HttpTransport};

/// Authentication endpoint
pub const AUTH_PATH: &str = "/resto/api/auth";

/// Query parameter carrying the session token on every other request
pub const TOKEN_PARAM: &str = "key";

/// Source of session tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a token that is not close to expiry, fetching one if needed
    async fn get_token(&self) -> Result<String, ErpError>;

    /// Drops the cached token so the next `get_token` fetches a fresh one
    async fn invalidate(&self);

    /// Drops the cached token only if it is the one the ERP rejected
    ///
    /// A rejection that arrives after another caller already refreshed
    /// leaves the newer token in place.
    async fn invalidate_if(&self, rejected: &str);
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    issued_at: Instant,
}

/// Token cache bound to one transport and one set of credentials
pub struct AuthSession {
    transport: Arc<dyn HttpTransport>,
    credentials: Credentials,
    ttl: Duration,
    refresh_threshold: Duration,
    cached: RwLock<Option<CachedToken>>,
    refresh: Mutex<()>,
    token_requests: AtomicU64,
}

impl AuthSession {
    /// Creates a session with the default 25 minute lifetime and 5 minute threshold
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Credentials) -> Self {
        let defaults = ErpClientConfig::default();
        Self::with_lifetime(
            transport,
            credentials,
            defaults.token_ttl(),
            defaults.token_refresh_threshold(),
        )
    }

    pub fn with_lifetime(
        transport: Arc<dyn HttpTransport>,
        credentials: Credentials,
        ttl: Duration,
        refresh_threshold: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            ttl,
            refresh_threshold,
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
            token_requests: AtomicU64::new(0),
        }
    }

    /// Number of token requests sent so far
    pub fn token_requests(&self) -> u64 {
        self.token_requests.load(Ordering::Relaxed)
    }

    // Valid while TTL − elapsed > threshold
    fn is_fresh(&self, token: &CachedToken) -> bool {
        let elapsed = token.issued_at.elapsed();
        self.ttl.saturating_sub(elapsed) > self.refresh_threshold
    }

    async fn cached_token(&self) -> Option<String> {
        let guard = self.cached.read().await;
        guard
            .as_ref()
            .filter(|token| self.is_fresh(token))
            .map(|token| token.value.clone())
    }

    async fn request_token(&self) -> Result<String, ErpError> {
        self.token_requests.fetch_add(1, Ordering::Relaxed);

        let request = ErpRequest::get(AUTH_PATH)
            .with_query("login", self.credentials.login())
            .with_query("pass", self.credentials.password_sha1());

        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|e| ErpError::Auth(format!("token request failed: {}", e)))?;

        if !response.is_success() {
            warn!(status = response.status, "ERP refused the credentials");
            return Err(ErpError::Auth(format!(
                "token request returned HTTP {}",
                response.status
            )));
        }

        let token = response.body.trim();
        if token.is_empty() {
            return Err(ErpError::Auth("empty token received".to_string()));
        }

        Ok(token.to_string())
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("credentials", &self.credentials)
            .field("ttl", &self.ttl)
            .field("refresh_threshold", &self.refresh_threshold)
            .finish()
    }
}

#[async_trait]
impl TokenProvider for AuthSession {
    async fn get_token(&self) -> Result<String, ErpError> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let token = self.request_token().await?;
        *self.cached.write().await = Some(CachedToken {
            value: token.clone(),
            issued_at: Instant::now(),
        });

        info!(token_prefix = %token_prefix(&token), "Obtained new ERP token");
        Ok(token)
    }

    async fn invalidate(&self) {
        if self.cached.write().await.take().is_some() {
            debug!("ERP token invalidated");
        }
    }

    async fn invalidate_if(&self, rejected: &str) {
        let mut cached = self.cached.write().await;
        if cached.as_ref().is_some_and(|token| token.value == rejected) {
            *cached = None;
            debug!(token_prefix = %token_prefix(rejected), "Rejected ERP token invalidated");
        }
    }
}

/// First few characters of a token, safe to log
pub(crate) fn token_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{}...", prefix)
}
