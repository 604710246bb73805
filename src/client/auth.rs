//! # Credential Provider
//!
//! OAuth client-credentials exchange with an in-memory token cache.
//!
//! The cached token is read concurrently; refreshes are single-flight. A
//! caller that finds the cache stale takes the refresh lock, re-checks the
//! cache (another caller may have refreshed while it waited), and only then
//! exchanges credentials.

use super::http::{ApiFailure, CarrierHttpClient};
use crate::config::AuthConfig;
use crate::constants::defaults;
use crate::error::AuthError;
use crate::logging::log_carrier_operation;
use crate::models::{AccessToken, Credentials};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Source of bearer tokens for carrier calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A token valid for at least the safety margin, exchanging only when needed
    async fn token(&self) -> Result<AccessToken, AuthError>;

    /// Replace a token the carrier answered 401 to
    ///
    /// Returns the cached token instead when another caller already replaced
    /// `stale`.
    async fn refresh_rejected(&self, stale: &AccessToken) -> Result<AccessToken, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

impl TokenResponse {
    /// Advertised lifetime in seconds, capped at one day
    fn lifetime_secs(&self) -> Result<i64, AuthError> {
        let secs = match &self.expires_in {
            None | Some(serde_json::Value::Null) => return Ok(defaults::TOKEN_LIFETIME_SECS),
            Some(serde_json::Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| AuthError::Malformed(format!("invalid expires_in: {n}")))?,
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| AuthError::Malformed(format!("invalid expires_in: {s:?}")))?,
            Some(other) => {
                return Err(AuthError::Malformed(format!("invalid expires_in: {other}")))
            }
        };

        if !secs.is_finite() || secs < 1.0 {
            return Err(AuthError::Malformed(format!(
                "expires_in must be at least one second, got {secs}"
            )));
        }
        Ok(secs.min(defaults::TOKEN_MAX_LIFETIME_SECS as f64) as i64)
    }
}

/// Refresh margin for a token of the given lifetime
///
/// A token that lives no longer than the configured margin is kept for half
/// its lifetime instead of being exchanged on every call.
fn refresh_margin(lifetime_secs: i64, safety_margin: Duration) -> Duration {
    if lifetime_secs > safety_margin.num_seconds() {
        safety_margin
    } else {
        Duration::milliseconds(lifetime_secs * 500)
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: AccessToken,
    refresh_margin: Duration,
}

/// Client-credentials token provider backed by the carrier's OAuth endpoint
pub struct OAuthTokenProvider {
    http: CarrierHttpClient,
    credentials: Credentials,
    token_path: String,
    safety_margin: Duration,
    cached: RwLock<Option<CachedToken>>,
    refresh_lock: Mutex<()>,
    exchanges: AtomicU64,
}

impl std::fmt::Debug for OAuthTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenProvider")
            .field("username", &self.credentials.username)
            .field("token_path", &self.token_path)
            .field("exchanges", &self.exchange_count())
            .finish()
    }
}

impl OAuthTokenProvider {
    pub fn new(
        http: CarrierHttpClient,
        credentials: Credentials,
        token_path: impl Into<String>,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            http,
            credentials,
            token_path: token_path.into(),
            safety_margin: auth.safety_margin(),
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            exchanges: AtomicU64::new(0),
        }
    }

    /// Number of credential exchanges performed so far
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    fn cached_valid(&self) -> Option<AccessToken> {
        let now = Utc::now();
        self.cached
            .read()
            .as_ref()
            .filter(|cached| cached.token.is_valid_at(now, cached.refresh_margin))
            .map(|cached| cached.token.clone())
    }

    async fn exchange(&self) -> Result<AccessToken, AuthError> {
        let url = self
            .http
            .url(&self.token_path)
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        debug!(url = %url, username = %self.credentials.username, "Exchanging client credentials");
        let started = Instant::now();
        self.exchanges.fetch_add(1, Ordering::Relaxed);

        let request = self
            .http
            .inner()
            .post(url)
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.secret.expose()),
            )
            .form(&[("grant_type", "client_credentials")]);

        let response: TokenResponse =
            self.http
                .send_json(request, "token")
                .await
                .map_err(|failure| match failure {
                    ApiFailure::Transport(e) => AuthError::Transport(e),
                    ApiFailure::Unauthorized => AuthError::Rejected {
                        status: 401,
                        body: "client credentials rejected".to_string(),
                    },
                    ApiFailure::Server { status, body } | ApiFailure::Client { status, body } => {
                        AuthError::Rejected { status, body }
                    }
                    ApiFailure::Decode(e) => AuthError::Malformed(e),
                })?;

        let value = response
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::Malformed("missing access_token".to_string()))?
            .to_string();
        let lifetime = response.lifetime_secs()?;
        let expires_at = Duration::try_seconds(lifetime)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| AuthError::Malformed(format!("expires_in out of range: {lifetime}")))?;
        let token = AccessToken::new(value, expires_at);

        log_carrier_operation(
            "token_exchange",
            None,
            "success",
            Some(started.elapsed().as_millis() as u64),
            Some(&format!("expires_in={lifetime}s")),
        );

        *self.cached.write() = Some(CachedToken {
            token: token.clone(),
            refresh_margin: refresh_margin(lifetime, self.safety_margin),
        });
        Ok(token)
    }
}

#[async_trait]
impl TokenSource for OAuthTokenProvider {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.cached_valid() {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = self.cached_valid() {
            debug!("Reusing token refreshed by a concurrent caller");
            return Ok(token);
        }

        self.exchange().await
    }

    async fn refresh_rejected(&self, stale: &AccessToken) -> Result<AccessToken, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.cached_valid() {
            if current != *stale {
                debug!("Rejected token already replaced by a concurrent caller");
                return Ok(current);
            }
        }

        info!("Carrier rejected the cached token, exchanging credentials again");
        *self.cached.write() = None;
        self.exchange().await
    }
}
