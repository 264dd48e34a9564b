//! Builds the run configuration: defaults, then the RON file, then
//! environment and flags.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use harvest_logging::harvest_info;
use harvester_core::TransientPolicy;
use harvester_engine::{ApiKey, HarvestConfig};

use crate::cli::Overrides;

pub fn load_file(path: &Path) -> Result<HarvestConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config = ron::from_str(&text)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    harvest_info!("Loaded settings from {:?}", path);
    Ok(config)
}

/// Applies flag (or environment) values on top of `config`.
pub fn apply_overrides(mut config: HarvestConfig, overrides: &Overrides) -> HarvestConfig {
    if let Some(key) = &overrides.api_key {
        config.api_key = ApiKey::new(key.clone());
    }
    if let Some(url) = &overrides.base_url {
        config.base_url = url.clone();
    }
    if let Some(threshold) = overrides.miss_threshold {
        config.miss_threshold = threshold;
    }
    if let Some(pacing) = overrides.pacing_ms {
        config.pacing_ms = pacing;
    }
    if let Some(region) = &overrides.region {
        config.certification_region = region.clone();
    }
    if let Some(concurrency) = overrides.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(retries) = overrides.retries {
        config.transient_retries = retries;
    }
    if overrides.ignore_transient {
        config.transient_policy = TransientPolicy::Ignore;
    }
    if let Some(start) = overrides.start_id {
        config.start_id = start;
    }
    config
}

pub fn resolve(file: Option<&Path>, overrides: &Overrides) -> Result<HarvestConfig> {
    let base = match file {
        Some(path) => load_file(path)?,
        None => HarvestConfig::default(),
    };
    let config = apply_overrides(base, overrides)
        .validated()
        .context("invalid harvest settings")?;
    Ok(config)
}
