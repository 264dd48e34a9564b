use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use harvester_core::TransientPolicy;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{HarvestConfig, HarvestSummary};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("invalid output path: {0}")]
    InvalidPath(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Splits `path` into its directory (`.` when bare) and file name.
pub(crate) fn split_output_path(path: &Path) -> Result<(PathBuf, String), PersistError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PersistError::InvalidPath(path.display().to_string()))?
        .to_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // persist() replaces an existing target atomically on the same filesystem.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Settings worth recording next to a dataset; the api key is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestSettings {
    pub base_url: String,
    pub miss_threshold: u64,
    pub pacing_ms: u64,
    pub certification_region: String,
    pub concurrency: usize,
    pub transient_retries: u32,
    pub transient_policy: TransientPolicy,
    pub start_id: u64,
}

impl From<&HarvestConfig> for ManifestSettings {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            miss_threshold: config.miss_threshold,
            pacing_ms: config.pacing_ms,
            certification_region: config.certification_region.clone(),
            concurrency: config.concurrency,
            transient_retries: config.transient_retries,
            transient_policy: config.transient_policy,
            start_id: config.start_id,
        }
    }
}

/// Run summary written beside the dataset once the harvest finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunManifest {
    pub started_utc: DateTime<Utc>,
    pub finished_utc: DateTime<Utc>,
    pub dataset: Option<PathBuf>,
    pub columns: Vec<String>,
    pub settings: ManifestSettings,
    pub summary: HarvestSummary,
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<PathBuf, PersistError> {
    let (dir, file_name) = split_output_path(path)?;
    let content = serde_json::to_string_pretty(manifest)?;
    AtomicFileWriter::new(dir).write(&file_name, &content)
}
