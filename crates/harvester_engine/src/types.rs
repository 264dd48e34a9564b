use std::fmt;

use harvester_core::{CandidateId, HarvestSnapshot, StepKind};

use crate::record::RawRecord;

/// Classified result of a single detail lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(Box<RawRecord>),
    /// Explicit not-found or any other unsuccessful HTTP status.
    NotFound { status: u16 },
    /// Network or parse failure; the id may exist.
    Transient(FetchError),
}

impl FetchOutcome {
    pub fn kind(&self) -> StepKind {
        match self {
            FetchOutcome::Found(_) => StepKind::Found,
            FetchOutcome::NotFound { .. } => StepKind::NotFound,
            FetchOutcome::Transient(_) => StepKind::Transient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Parse,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Parse => write!(f, "parse error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Progress signal emitted by the driver; has no effect on the harvest itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    Step {
        id: CandidateId,
        kind: StepKind,
        /// Extra attempts spent on this id after transient failures.
        retries: u32,
        snapshot: HarvestSnapshot,
    },
    Finished(HarvestSummary),
}

/// Final tally returned when the exhaustion heuristic fires.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HarvestSummary {
    /// Last id that was probed and folded; `None` if nothing was probed.
    pub last_id: Option<CandidateId>,
    pub steps: u64,
    pub found: u64,
    pub not_found: u64,
    pub transient: u64,
    pub retries: u64,
    pub miss_streak: u64,
    pub threshold: u64,
    pub records_written: u64,
}
