use harvest_logging::{harvest_debug, harvest_info};

use crate::HarvestEvent;

/// Observer of driver progress. Emitting must never fail the harvest.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: HarvestEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: HarvestEvent) {}
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<HarvestEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<HarvestEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: HarvestEvent) {
        let _ = self.tx.send(event);
    }
}

/// Logs every step at debug level and a running tally at info level every
/// `every` steps.
#[derive(Debug, Clone, Copy)]
pub struct LogProgressSink {
    every: u64,
}

impl LogProgressSink {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogProgressSink {
    fn default() -> Self {
        Self::new(500)
    }
}

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::Step {
                id,
                kind,
                retries,
                snapshot,
            } => {
                harvest_debug!(
                    "id={} outcome={:?} retries={} streak={}/{}",
                    id,
                    kind,
                    retries,
                    snapshot.miss_streak,
                    snapshot.threshold
                );
                let counters = snapshot.counters;
                if counters.steps % self.every == 0 {
                    harvest_info!(
                        "Probed {} ids up to {}: found={} not_found={} transient={} streak={}/{}",
                        counters.steps,
                        id,
                        counters.found,
                        counters.not_found,
                        counters.transient,
                        snapshot.miss_streak,
                        snapshot.threshold
                    );
                }
            }
            HarvestEvent::Finished(summary) => {
                harvest_info!(
                    "Id space exhausted after {} steps (last id {:?}): found={} not_found={} transient={} retries={}",
                    summary.steps,
                    summary.last_id,
                    summary.found,
                    summary.not_found,
                    summary.transient,
                    summary.retries
                );
            }
        }
    }
}
