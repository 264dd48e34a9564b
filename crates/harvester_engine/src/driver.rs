//! Harvest driver: probes ids, normalizes hits, and stops on miss-streak exhaustion.
//!
//! Two execution modes share one fold:
//! - sequential (`concurrency == 1`): one fetch at a time, a fixed pause after
//!   every step;
//! - pipelined (`concurrency > 1`): up to `concurrency` fetches in flight,
//!   dispatches spaced by the pacing interval, results folded strictly in id
//!   order. Ids fetched past the exhaustion point are dropped unfolded.

use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use harvester_core::{
    update, CandidateId, Effect, HarvestState, Msg, Sequencer, TransientPolicy,
};
use thiserror::Error;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::fetch::Fetcher;
use crate::normalize::Normalizer;
use crate::progress::ProgressSink;
use crate::sink::{DatasetSink, SinkError};
use crate::{FetchOutcome, HarvestConfig, HarvestEvent, HarvestSummary};

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("step for id {got} folded while id {expected} was pending")]
    OutOfOrder {
        expected: CandidateId,
        got: CandidateId,
    },
}

pub struct Harvester<F> {
    fetcher: F,
    normalizer: Normalizer,
    sequencer: Sequencer,
    policy: TransientPolicy,
    pacing: Duration,
    concurrency: usize,
    transient_retries: u32,
}

/// What the fold asks for next.
enum Next {
    Probe(CandidateId),
    Finish,
}

impl<F: Fetcher> Harvester<F> {
    /// Builds a driver from an already validated configuration.
    pub fn new(fetcher: F, config: &HarvestConfig) -> Self {
        Self {
            fetcher,
            normalizer: config.normalizer(),
            sequencer: config.sequencer(),
            policy: config.transient_policy,
            pacing: config.pacing(),
            concurrency: config.concurrency.max(1),
            transient_retries: config.transient_retries,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs until the miss streak reaches its threshold, streaming every found
    /// record into `sink`. Only a sink failure ends the run early.
    pub async fn run<S>(
        &self,
        sink: &mut S,
        progress: &dyn ProgressSink,
    ) -> Result<HarvestSummary, HarvestError>
    where
        S: DatasetSink + ?Sized,
    {
        harvest_info!(
            "Starting harvest at id {} (threshold {}, pacing {:?}, concurrency {}, region {})",
            self.sequencer.current(),
            self.sequencer.threshold(),
            self.pacing,
            self.concurrency,
            self.normalizer.certification_region()
        );

        let (state, effects) = update(
            HarvestState::new(self.sequencer.clone(), self.policy),
            Msg::Start,
        );
        let (state, retries) = match next_step(&effects)? {
            Next::Finish => (state, 0),
            Next::Probe(first) if self.concurrency > 1 => {
                self.run_pipelined(state, first, sink, progress).await?
            }
            Next::Probe(first) => self.run_sequential(state, first, sink, progress).await?,
        };

        sink.finish()?;
        let counters = state.counters();
        let snapshot = state.snapshot();
        let summary = HarvestSummary {
            last_id: (counters.steps > 0).then_some(snapshot.current_id),
            steps: counters.steps,
            found: counters.found,
            not_found: counters.not_found,
            transient: counters.transient,
            retries,
            miss_streak: snapshot.miss_streak,
            threshold: snapshot.threshold,
            records_written: sink.written(),
        };
        progress.emit(HarvestEvent::Finished(summary.clone()));
        Ok(summary)
    }

    async fn run_sequential<S>(
        &self,
        mut state: HarvestState,
        first: CandidateId,
        sink: &mut S,
        progress: &dyn ProgressSink,
    ) -> Result<(HarvestState, u64), HarvestError>
    where
        S: DatasetSink + ?Sized,
    {
        let mut id = first;
        let mut total_retries = 0;
        loop {
            let (outcome, retries) = self.fetch_with_retries(id).await;
            total_retries += u64::from(retries);

            let (next_state, next) = self.fold(state, id, outcome, retries, sink, progress)?;
            state = next_state;
            match next {
                Next::Finish => break,
                Next::Probe(next_id) => id = next_id,
            }
            self.pause().await;
        }
        Ok((state, total_retries))
    }

    async fn run_pipelined<S>(
        &self,
        mut state: HarvestState,
        first: CandidateId,
        sink: &mut S,
        progress: &dyn ProgressSink,
    ) -> Result<(HarvestState, u64), HarvestError>
    where
        S: DatasetSink + ?Sized,
    {
        let ticker = (!self.pacing.is_zero()).then(|| {
            let mut ticker = interval(self.pacing);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        // Unbounded id source; `buffered` keeps at most `concurrency` in flight
        // and yields results in id order regardless of completion order.
        let ids = stream::unfold((first, ticker), |(id, mut ticker)| async move {
            if let Some(ticker) = ticker.as_mut() {
                ticker.tick().await;
            }
            Some((id, (id + 1, ticker)))
        });
        let mut results = Box::pin(
            ids.map(|id| async move {
                let (outcome, retries) = self.fetch_with_retries(id).await;
                (id, outcome, retries)
            })
            .buffered(self.concurrency),
        );

        let mut total_retries = 0;
        while let Some((id, outcome, retries)) = results.next().await {
            total_retries += u64::from(retries);
            let (next_state, next) = self.fold(state, id, outcome, retries, sink, progress)?;
            state = next_state;
            if let Next::Finish = next {
                break;
            }
        }
        Ok((state, total_retries))
    }

    /// Applies one classified id to the state; writes the record when found.
    fn fold<S>(
        &self,
        state: HarvestState,
        id: CandidateId,
        outcome: FetchOutcome,
        retries: u32,
        sink: &mut S,
        progress: &dyn ProgressSink,
    ) -> Result<(HarvestState, Next), HarvestError>
    where
        S: DatasetSink + ?Sized,
    {
        let kind = outcome.kind();
        let (state, effects) = update(state, Msg::StepCompleted { id, kind });
        let next = next_step(&effects)?;

        match outcome {
            FetchOutcome::Found(raw) => sink.append(self.normalizer.normalize(*raw))?,
            FetchOutcome::NotFound { status } => {
                harvest_debug!("id {} not found (status {})", id, status);
            }
            FetchOutcome::Transient(err) => {
                harvest_warn!("id {} failed after {} retries: {}", id, retries, err);
            }
        }

        progress.emit(HarvestEvent::Step {
            id,
            kind,
            retries,
            snapshot: state.snapshot(),
        });
        Ok((state, next))
    }

    /// Fetches `id`, retrying transient failures up to the configured bound.
    async fn fetch_with_retries(&self, id: CandidateId) -> (FetchOutcome, u32) {
        let mut attempt = 0;
        loop {
            let outcome = self.fetcher.fetch(id).await;
            match &outcome {
                FetchOutcome::Transient(err) if attempt < self.transient_retries => {
                    attempt += 1;
                    harvest_debug!(
                        "id {} transient failure ({}), retry {}/{}",
                        id,
                        err,
                        attempt,
                        self.transient_retries
                    );
                    self.pause().await;
                }
                _ => return (outcome, attempt),
            }
        }
    }

    async fn pause(&self) {
        if !self.pacing.is_zero() {
            sleep(self.pacing).await;
        }
    }
}

fn next_step(effects: &[Effect]) -> Result<Next, HarvestError> {
    for effect in effects {
        match effect {
            Effect::Probe { id } => return Ok(Next::Probe(*id)),
            Effect::Finish => return Ok(Next::Finish),
            Effect::Rejected { expected, got } => {
                return Err(HarvestError::OutOfOrder {
                    expected: *expected,
                    got: *got,
                })
            }
        }
    }
    // `update` always answers Start and in-order steps with exactly one effect.
    Ok(Next::Finish)
}
