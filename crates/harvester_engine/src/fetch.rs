use std::time::Duration;

use futures_util::StreamExt;
use harvest_logging::harvest_trace;
use harvester_core::CandidateId;
use reqwest::Url;

use crate::record::RawRecord;
use crate::{FailureKind, FetchError, FetchOutcome};

/// Sub-resources requested alongside every primary record.
pub const ENRICHMENTS: [&str; 3] = ["keywords", "credits", "release_dates"];

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Where and how to reach the catalog's detail endpoint.
#[derive(Clone)]
pub struct CatalogEndpoint {
    pub base_url: Url,
    pub api_key: String,
}

// Hand-written so the token never reaches a log line.
impl std::fmt::Debug for CatalogEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEndpoint")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl CatalogEndpoint {
    /// `{base}/movie/{id}?api_key=..&append_to_response=keywords,credits,release_dates`
    pub fn detail_url(&self, id: CandidateId) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::new(FailureKind::InvalidUrl, "base url cannot be a base"))?
            .pop_if_empty()
            .push("movie")
            .push(&id.to_string());
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("append_to_response", &ENRICHMENTS.join(","));
        Ok(url)
    }
}

/// Looks up one id and classifies the result. Implementations never retry.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, id: CandidateId) -> FetchOutcome;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    endpoint: CatalogEndpoint,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(endpoint: CatalogEndpoint, settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            settings,
        })
    }

    async fn lookup(&self, id: CandidateId) -> Result<FetchOutcome, FetchError> {
        let url = self.endpoint.detail_url(id)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            harvest_trace!("id {} answered with status {}", id, status);
            return Ok(FetchOutcome::NotFound {
                status: status.as_u16(),
            });
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(FetchError::new(FailureKind::Parse, "empty response body"));
        }
        let record: RawRecord = serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Parse, err.to_string()))?;
        Ok(FetchOutcome::Found(Box::new(record)))
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, id: CandidateId) -> FetchOutcome {
        self.lookup(id).await.unwrap_or_else(FetchOutcome::Transient)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    // Strip the url: it carries the api key in its query string.
    let err = err.without_url();
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Parse, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
