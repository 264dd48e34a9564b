use crate::CandidateId;

/// Classification of one probed id, as seen by the fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Found,
    NotFound,
    /// Network or parse failure that survived any retries.
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin a harvest from the sequencer's first id.
    Start,
    /// The driver finished processing `id`. Must arrive in id order.
    StepCompleted { id: CandidateId, kind: StepKind },
}
