//! # Bandwidth Values
//!
//! Carrier inventories and configuration both express bandwidth as free text
//! ("10 Mbps", "1gbps", "100"). Comparison happens on a canonical integral
//! kbps value; the raw text is kept because it is what the carrier expects
//! back in a price request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BandwidthParseError {
    #[error("empty bandwidth value")]
    Empty,
    #[error("bandwidth '{0}' does not start with a number")]
    MissingNumber(String),
    #[error("bandwidth '{0}' must be greater than zero")]
    NotPositive(String),
    #[error("unknown bandwidth unit '{unit}' in '{raw}'")]
    UnknownUnit { raw: String, unit: String },
}

/// A bandwidth value normalized to kilobits per second
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Bandwidth {
    raw: String,
    kbps: u64,
}

impl Bandwidth {
    /// The text as written in configuration or returned by the carrier
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kbps(&self) -> u64 {
        self.kbps
    }

    /// Scale of a unit relative to one kbps
    fn unit_scale(unit: &str) -> Option<f64> {
        // "Mb/s", "mbps", "mbit/s" and "m" all collapse to "m"
        let unit = unit
            .trim_end_matches("/s")
            .trim_end_matches("ps")
            .trim_end_matches("it")
            .trim_end_matches('b');
        match unit {
            "" => Some(1_000.0),
            "k" => Some(1.0),
            "m" => Some(1_000.0),
            "g" => Some(1_000_000.0),
            "t" => Some(1_000_000_000.0),
            _ => None,
        }
    }
}

impl FromStr for Bandwidth {
    type Err = BandwidthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(BandwidthParseError::Empty);
        }

        let lowered = raw.to_ascii_lowercase();
        let split_at = lowered
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(lowered.len());
        let (number, unit) = lowered.split_at(split_at);

        let value: f64 = number
            .parse()
            .map_err(|_| BandwidthParseError::MissingNumber(raw.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(BandwidthParseError::NotPositive(raw.to_string()));
        }

        let unit = unit.trim();
        // A bare "bps" is plain bits; everything else is prefixed
        let scale = if matches!(unit, "b" | "bps" | "b/s" | "bit" | "bit/s") {
            Some(0.001)
        } else {
            Self::unit_scale(unit)
        }
        .ok_or_else(|| BandwidthParseError::UnknownUnit {
            raw: raw.to_string(),
            unit: unit.to_string(),
        })?;

        let kbps = (value * scale).round();
        if kbps < 1.0 {
            return Err(BandwidthParseError::NotPositive(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            kbps: kbps as u64,
        })
    }
}

impl TryFrom<String> for Bandwidth {
    type Error = BandwidthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Bandwidth> for String {
    fn from(value: Bandwidth) -> Self {
        value.raw
    }
}

impl PartialEq for Bandwidth {
    fn eq(&self, other: &Self) -> bool {
        self.kbps == other.kbps
    }
}

impl Eq for Bandwidth {}

impl Hash for Bandwidth {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kbps.hash(state);
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl fmt::Debug for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bandwidth({:?} = {} kbps)", self.raw, self.kbps)
    }
}
