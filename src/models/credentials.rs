use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// A string that never shows up in logs, debug output or reports
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("****")
    }
}

/// OAuth client credentials, loaded once per process
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub secret: Secret,
    pub partner_id: String,
}

/// Bearer token issued by the carrier's token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: Secret,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: Secret::new(value),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        self.value.expose()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Usable at `now` if it outlives `now` by more than `safety_margin`
    pub fn is_valid_at(&self, now: DateTime<Utc>, safety_margin: Duration) -> bool {
        now < self.expires_at - safety_margin
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &self.value)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
