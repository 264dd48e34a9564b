use serde::{Deserialize, Serialize};

use crate::{CandidateId, Sequencer, StepKind};

/// How a transient failure that outlived its retries affects the miss streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientPolicy {
    /// Treat it like a not-found id: the streak grows.
    #[default]
    CountAsMiss,
    /// Leave the streak untouched; only genuine not-found ids count.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HarvestCounters {
    pub steps: u64,
    pub found: u64,
    pub not_found: u64,
    pub transient: u64,
}

/// Point-in-time view of a harvest, suitable for progress reports and manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestSnapshot {
    pub phase: Phase,
    pub current_id: CandidateId,
    pub miss_streak: u64,
    pub threshold: u64,
    pub counters: HarvestCounters,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestState {
    sequencer: Sequencer,
    policy: TransientPolicy,
    phase: Phase,
    counters: HarvestCounters,
}

impl HarvestState {
    pub fn new(sequencer: Sequencer, policy: TransientPolicy) -> Self {
        Self {
            sequencer,
            policy,
            phase: Phase::Idle,
            counters: HarvestCounters::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn counters(&self) -> HarvestCounters {
        self.counters
    }

    pub fn snapshot(&self) -> HarvestSnapshot {
        HarvestSnapshot {
            phase: self.phase,
            current_id: self.sequencer.current(),
            miss_streak: self.sequencer.miss_streak(),
            threshold: self.sequencer.threshold(),
            counters: self.counters,
        }
    }

    pub(crate) fn start(&mut self) {
        self.sequencer.start();
        self.counters = HarvestCounters::default();
        self.phase = Phase::Running;
    }

    pub(crate) fn finish(&mut self) {
        self.phase = Phase::Finished;
    }

    pub(crate) fn advance(&mut self) -> CandidateId {
        self.sequencer.advance()
    }

    pub(crate) fn record(&mut self, kind: StepKind) {
        self.counters.steps += 1;
        match kind {
            StepKind::Found => {
                self.counters.found += 1;
                self.sequencer.on_found();
            }
            StepKind::NotFound => {
                self.counters.not_found += 1;
                self.sequencer.on_miss();
            }
            StepKind::Transient => {
                self.counters.transient += 1;
                if self.policy == TransientPolicy::CountAsMiss {
                    self.sequencer.on_miss();
                }
            }
        }
    }
}
