//! Configuration Loader
//!
//! Layers, lowest to highest precedence:
//!
//! 0. `.env` file loaded into the process environment via `dotenvy`
//!    (never overriding variables that are already set)
//! 1. Built-in defaults for every tunable
//! 2. Optional YAML file (`--config`, `NAAS_CONFIG_PATH`, or
//!    `config/naas-checker.yaml` when present)
//! 3. Flat process environment (`SERVICE_ID`, `BANDWIDTH_FULL`, ...)
//! 4. Prefixed tunables (`NAAS_RETRY__MAX_ATTEMPTS`, `NAAS_PROBE__MODE`, ...)
//!
//! The merged result is deserialized into a raw, all-optional shape and then
//! validated into a [`CheckerConfig`].

use super::error::{ConfigProblem, ConfigResult, ConfigurationError};
use super::{
    ApiConfig, AuthConfig, BandwidthConfig, CheckerConfig, ProbeConfig, ProbeMode, RetryConfig,
    VerifierConfig,
};
use crate::constants::{defaults, env as env_keys};
use crate::models::{Bandwidth, ContactBlock, Credentials, Secret, ServiceDescriptor};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Builds a [`CheckerConfig`] from `.env`, YAML and environment sources
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    env_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load this `.env` file instead of `./.env`; it must exist
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Read this YAML file; it must exist
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Load from the real process environment and filesystem
    pub fn load(&self) -> ConfigResult<CheckerConfig> {
        self.load_env_file()?;

        let mut builder = Config::builder();
        if let Some(path) = self.resolve_config_file()? {
            debug!(path = %path.display(), "Reading configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }

        let config = Self::assemble(builder, None)?;

        info!(
            service_id = %config.service.service_id,
            base_url = %config.api.base_url,
            probe_mode = ?config.probe.mode,
            "Configuration loaded"
        );
        debug!(config = %config.sanitized(), "Effective configuration");

        Ok(config)
    }

    /// Load from in-memory sources without touching the process environment
    pub fn from_sources(
        yaml: Option<&str>,
        environment: HashMap<String, String>,
    ) -> ConfigResult<CheckerConfig> {
        let mut builder = Config::builder();
        if let Some(yaml) = yaml {
            builder = builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        }
        Self::assemble(builder, Some(environment))
    }

    fn assemble(
        builder: ConfigBuilder<DefaultState>,
        environment: Option<HashMap<String, String>>,
    ) -> ConfigResult<CheckerConfig> {
        let flat = Environment::default().source(environment.clone());
        let tunables = Environment::with_prefix(env_keys::TUNABLE_PREFIX)
            .prefix_separator("_")
            .separator(env_keys::TUNABLE_SEPARATOR)
            .try_parsing(true)
            .source(environment);

        let raw: RawSettings = builder
            .add_source(flat)
            .add_source(tunables)
            .build()?
            .try_deserialize()?;

        raw.validate()
    }

    fn load_env_file(&self) -> ConfigResult<()> {
        match &self.env_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigurationError::FileNotFound { path: path.clone() });
                }
                dotenvy::from_path(path).map_err(|e| ConfigurationError::EnvFile {
                    path: path.clone(),
                    error: e.to_string(),
                })?;
                debug!(path = %path.display(), "Loaded env file");
            }
            None => match dotenvy::dotenv() {
                Ok(path) => debug!(path = %path.display(), "Loaded env file"),
                Err(e) if e.not_found() => debug!("No .env file found, using process environment"),
                Err(e) => {
                    return Err(ConfigurationError::EnvFile {
                        path: PathBuf::from(".env"),
                        error: e.to_string(),
                    })
                }
            },
        }
        Ok(())
    }

    fn resolve_config_file(&self) -> ConfigResult<Option<PathBuf>> {
        let explicit = self
            .config_file
            .clone()
            .or_else(|| std::env::var(env_keys::CONFIG_PATH).ok().map(PathBuf::from));

        match explicit {
            Some(path) if path.is_file() => Ok(Some(path)),
            Some(path) => Err(ConfigurationError::FileNotFound { path }),
            None => {
                let default = Path::new(defaults::CONFIG_FILE_PATH);
                Ok(default.is_file().then(|| default.to_path_buf()))
            }
        }
    }
}

/// Merged sources before validation; every required field is optional here
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    username: Option<String>,
    secret: Option<String>,
    customer_number: Option<String>,
    service_id: Option<String>,
    currency_code: Option<String>,
    partner_id: Option<String>,
    product_code: Option<String>,
    product_name: Option<String>,
    external_id_prefix: Option<String>,
    contact_name: Option<String>,
    contact_role: Option<String>,
    contact_email: Option<String>,
    contact_org: Option<String>,
    contact_phone: Option<String>,
    bandwidth_full: Option<String>,
    bandwidth_heartbeat: Option<String>,
    lumen_ip: Option<String>,

    api: ApiConfig,
    auth: AuthConfig,
    probe: ProbeConfig,
    retry: RetryConfig,
    verifier: VerifierConfig,
}

/// Collects problems while pulling values out of [`RawSettings`]
#[derive(Default)]
struct Validator {
    problems: Vec<ConfigProblem>,
}

impl Validator {
    fn problem(&mut self, field: &str, reason: impl Into<String>) {
        self.problems.push(ConfigProblem {
            field: field.to_string(),
            reason: reason.into(),
        });
    }

    fn required(&mut self, field: &str, value: Option<String>) -> String {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v,
            _ => {
                self.problem(field, "required but not set");
                String::new()
            }
        }
    }

    fn bandwidth(&mut self, field: &str, value: Option<String>) -> Option<Bandwidth> {
        let raw = self.required(field, value);
        if raw.is_empty() {
            return None;
        }
        raw.parse()
            .map_err(|e| self.problem(field, format!("{e}")))
            .ok()
    }

    fn url(&mut self, field: &str, value: &str) {
        if let Err(e) = reqwest::Url::parse(value) {
            self.problem(field, format!("invalid URL '{value}': {e}"));
        }
    }
}

impl RawSettings {
    fn validate(self) -> ConfigResult<CheckerConfig> {
        let mut v = Validator::default();

        let credentials = Credentials {
            username: v.required("USERNAME", self.username),
            secret: Secret::new(v.required("SECRET", self.secret)),
            partner_id: v.required("PARTNER_ID", self.partner_id),
        };

        let service = ServiceDescriptor {
            customer_number: v.required("CUSTOMER_NUMBER", self.customer_number),
            service_id: v.required("SERVICE_ID", self.service_id),
            product_code: v.required("PRODUCT_CODE", self.product_code),
            product_name: v.required("PRODUCT_NAME", self.product_name),
            currency_code: v.required("CURRENCY_CODE", self.currency_code),
        };

        let contact = ContactBlock {
            name: v.required("CONTACT_NAME", self.contact_name),
            role: v.required("CONTACT_ROLE", self.contact_role),
            email: v.required("CONTACT_EMAIL", self.contact_email),
            organization: v.required("CONTACT_ORG", self.contact_org),
            phone: v.required("CONTACT_PHONE", self.contact_phone),
        };
        if !contact.email.is_empty() && !contact.email.contains('@') {
            v.problem("CONTACT_EMAIL", format!("'{}' is not an email address", contact.email));
        }

        let external_id_prefix = v.required("EXTERNAL_ID_PREFIX", self.external_id_prefix);

        let full = v.bandwidth("BANDWIDTH_FULL", self.bandwidth_full);
        let heartbeat = v.bandwidth("BANDWIDTH_HEARTBEAT", self.bandwidth_heartbeat);
        if let (Some(full), Some(heartbeat)) = (&full, &heartbeat) {
            if full == heartbeat {
                v.problem(
                    "BANDWIDTH_HEARTBEAT",
                    format!("must differ from BANDWIDTH_FULL ({full})"),
                );
            }
        }

        let lumen_ip_raw = v.required("LUMEN_IP", self.lumen_ip);
        let lumen_ip = if lumen_ip_raw.is_empty() {
            None
        } else {
            lumen_ip_raw
                .parse::<IpAddr>()
                .map_err(|e| v.problem("LUMEN_IP", format!("'{lumen_ip_raw}': {e}")))
                .ok()
        };

        v.url("api.base_url", &self.api.base_url);
        if self.api.timeout_ms == 0 {
            v.problem("api.timeout_ms", "must be greater than zero");
        }
        if self.probe.mode == ProbeMode::Egress {
            v.url("probe.egress_url", &self.probe.egress_url);
        }
        if self.probe.timeout_ms == 0 {
            v.problem("probe.timeout_ms", "must be greater than zero");
        }
        if self.auth.safety_margin_secs > defaults::TOKEN_SAFETY_MARGIN_MAX_SECS {
            v.problem(
                "auth.safety_margin_secs",
                format!("must not exceed {}", defaults::TOKEN_SAFETY_MARGIN_MAX_SECS),
            );
        }
        if self.retry.max_attempts == 0 {
            v.problem("retry.max_attempts", "must be at least 1");
        }
        if self.retry.backoff_multiplier < 1.0 {
            v.problem("retry.backoff_multiplier", "must be at least 1.0");
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            v.problem("retry.jitter_factor", "must be between 0.0 and 1.0");
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            v.problem("retry.max_delay_ms", "must not be below retry.base_delay_ms");
        }
        if self.verifier.poll_interval_secs == 0 {
            v.problem("verifier.poll_interval_secs", "must be greater than zero");
        }
        if self.verifier.max_wait_secs < self.verifier.poll_interval_secs {
            v.problem(
                "verifier.max_wait_secs",
                "must not be below verifier.poll_interval_secs",
            );
        }
        if self.verifier.max_wait_secs > defaults::VERIFIER_MAX_WAIT_LIMIT_SECS {
            v.problem(
                "verifier.max_wait_secs",
                format!("must not exceed {}", defaults::VERIFIER_MAX_WAIT_LIMIT_SECS),
            );
        }

        match (full, heartbeat, lumen_ip) {
            (Some(full), Some(heartbeat), Some(lumen_ip)) if v.problems.is_empty() => {
                Ok(CheckerConfig {
                    credentials,
                    service,
                    contact,
                    external_id_prefix,
                    bandwidth: BandwidthConfig { full, heartbeat },
                    lumen_ip,
                    api: self.api,
                    auth: self.auth,
                    probe: self.probe,
                    retry: self.retry,
                    verifier: self.verifier,
                })
            }
            _ => Err(ConfigurationError::Invalid {
                problems: v.problems,
            }),
        }
    }
}
