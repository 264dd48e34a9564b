//! Explicit run configuration, passed by value into the fetcher and driver.

use std::fmt;
use std::time::Duration;

use harvester_core::{Sequencer, TransientPolicy, DEFAULT_MISS_THRESHOLD};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::{CatalogEndpoint, FetchSettings};
use crate::normalize::{Normalizer, DEFAULT_CERTIFICATION_REGION};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_PACING_MS: u64 = 100;
pub const DEFAULT_TRANSIENT_RETRIES: u32 = 0;
pub const MAX_CONCURRENCY: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key is missing")]
    MissingApiKey,
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("certification region must be two ASCII letters, got {0:?}")]
    InvalidRegion(String),
    #[error("start id must be at least 1")]
    InvalidStartId,
    #[error("concurrency must be between 1 and 32, got {0}")]
    InvalidConcurrency(usize),
}

/// Credential token. Never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ApiKey(<empty>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub miss_threshold: u64,
    pub pacing_ms: u64,
    pub certification_region: String,
    /// Maximum fetches in flight; 1 is the strictly sequential baseline.
    pub concurrency: usize,
    pub transient_retries: u32,
    pub transient_policy: TransientPolicy,
    pub start_id: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_body_bytes: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            api_key: ApiKey::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            miss_threshold: DEFAULT_MISS_THRESHOLD,
            pacing_ms: DEFAULT_PACING_MS,
            certification_region: DEFAULT_CERTIFICATION_REGION.to_string(),
            concurrency: 1,
            transient_retries: DEFAULT_TRANSIENT_RETRIES,
            transient_policy: TransientPolicy::default(),
            start_id: 1,
            connect_timeout_ms: fetch.connect_timeout.as_millis() as u64,
            request_timeout_ms: fetch.request_timeout.as_millis() as u64,
            max_body_bytes: fetch.max_bytes,
        }
    }
}

impl HarvestConfig {
    /// Checks every option and canonicalizes the region code to upper case.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        self.base_url_parsed()?;

        let region = self.certification_region.trim().to_ascii_uppercase();
        if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidRegion(self.certification_region));
        }
        self.certification_region = region;

        if self.start_id == 0 {
            return Err(ConfigError::InvalidStartId);
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }
        Ok(self)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_bytes: self.max_body_bytes,
        }
    }

    pub fn endpoint(&self) -> Result<CatalogEndpoint, ConfigError> {
        Ok(CatalogEndpoint {
            base_url: self.base_url_parsed()?,
            api_key: self.api_key.expose().to_string(),
        })
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.certification_region.clone())
    }

    pub fn sequencer(&self) -> Sequencer {
        Sequencer::starting_at(self.start_id, self.miss_threshold)
    }

    fn base_url_parsed(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("url cannot be a base".to_string()));
        }
        Ok(url)
    }
}
