//! Harvester core: pure id-sequencing state machine and its fold function.
mod effect;
mod msg;
mod sequencer;
mod state;
mod update;

pub use effect::Effect;
pub use msg::{Msg, StepKind};
pub use sequencer::{CandidateId, Sequencer, DEFAULT_MISS_THRESHOLD};
pub use state::{HarvestCounters, HarvestSnapshot, HarvestState, Phase, TransientPolicy};
pub use update::update;
