//! # Carrier HTTP Transport
//!
//! Thin wrapper over a shared `reqwest::Client`: URL construction relative to
//! the configured base, bearer and customer-number headers, and one place that
//! classifies HTTP outcomes into [`ApiFailure`]. Each component client maps
//! `ApiFailure` onto its own error type.

use crate::config::{ApiConfig, ConfigProblem, ConfigurationError};
use crate::constants::api::CUSTOMER_NUMBER_HEADER;
use crate::error::{InventoryError, OrderStatusError, OrderSubmissionError};
use crate::models::AccessToken;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, warn};

/// Classified outcome of a failed carrier call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// No HTTP answer: connect failure, reset, timeout
    Transport(String),
    /// HTTP 401
    Unauthorized,
    /// 5xx, 429 or 408; worth retrying
    Server { status: u16, body: String },
    /// Any other non-success status
    Client { status: u16, body: String },
    /// 2xx with a body that could not be decoded
    Decode(String),
}

impl ApiFailure {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }

    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            Self::Unauthorized
        } else if status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
        {
            Self::Server {
                status: status.as_u16(),
                body,
            }
        } else {
            Self::Client {
                status: status.as_u16(),
                body,
            }
        }
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Unauthorized => f.write_str("HTTP 401 Unauthorized"),
            Self::Server { status, body } | Self::Client { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            Self::Decode(e) => write!(f, "undecodable response: {e}"),
        }
    }
}

impl From<ApiFailure> for InventoryError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Unauthorized => Self::Unauthorized,
            f if f.is_transient() => Self::Transient(f.to_string()),
            f => Self::Permanent(f.to_string()),
        }
    }
}

impl From<ApiFailure> for OrderStatusError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Unauthorized => Self::Unauthorized,
            f if f.is_transient() => Self::Transient(f.to_string()),
            f => Self::Permanent(f.to_string()),
        }
    }
}

impl From<ApiFailure> for OrderSubmissionError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Unauthorized => Self::Unauthorized,
            ApiFailure::Client { status, body } => Self::Rejected {
                status,
                reason: body,
            },
            ApiFailure::Decode(e) => Self::Malformed(e),
            f => Self::Transient(f.to_string()),
        }
    }
}

/// Shared HTTP client bound to the carrier's base URL
#[derive(Clone)]
pub struct CarrierHttpClient {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for CarrierHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierHttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl CarrierHttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::Invalid {
            problems: vec![ConfigProblem {
                field: "api.base_url".to_string(),
                reason,
            }],
        };

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| invalid(format!("invalid base URL: {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("naas-checker/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| invalid(format!("failed to create HTTP client: {e}")))?;

        debug!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            "Created carrier HTTP client"
        );

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Resolve an endpoint path against the base URL, keeping any base path prefix
    pub fn url(&self, path: &str) -> Result<Url, ApiFailure> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ApiFailure::Transport(format!("failed to construct URL: {e}")))
    }

    /// Endpoint path followed by one escaped segment, e.g. an order id
    pub fn resource_url(&self, path: &str, id: &str) -> Result<Url, ApiFailure> {
        let mut url = self.url(path)?;
        url.path_segments_mut()
            .map_err(|_| ApiFailure::Transport(format!("cannot append a path segment to {path}")))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Request carrying the bearer token and the customer-number header
    pub fn authorized(
        &self,
        method: Method,
        path: &str,
        token: &AccessToken,
        customer_number: &str,
    ) -> Result<RequestBuilder, ApiFailure> {
        let url = self.url(path)?;
        Ok(self.authorized_url(method, url, token, customer_number))
    }

    pub fn authorized_url(
        &self,
        method: Method,
        url: Url,
        token: &AccessToken,
        customer_number: &str,
    ) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(token.value())
            .header(CUSTOMER_NUMBER_HEADER, customer_number)
    }

    /// Send and decode a JSON response, classifying every failure
    pub async fn send_json<T>(&self, request: RequestBuilder, operation: &str) -> Result<T, ApiFailure>
    where
        T: DeserializeOwned,
    {
        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            warn!(operation = %operation, error = %e, "Carrier request failed before a response");
            ApiFailure::Transport(e.to_string())
        })?;

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_success() {
            debug!(operation = %operation, status = %status, elapsed_ms, "Carrier request succeeded");
            return response.json::<T>().await.map_err(|e| {
                warn!(operation = %operation, error = %e, "Failed to decode carrier response");
                ApiFailure::Decode(format!("failed to parse {operation} response: {e}"))
            });
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!(
            operation = %operation,
            status = %status,
            elapsed_ms,
            error = %body,
            "Carrier request returned an error status"
        );
        Err(ApiFailure::from_status(status, body))
    }
}
