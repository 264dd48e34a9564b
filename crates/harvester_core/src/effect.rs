use crate::CandidateId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch and classify this id next.
    Probe { id: CandidateId },
    /// The miss streak reached its threshold; stop probing.
    Finish,
    /// A completed step arrived out of id order and was not folded.
    Rejected {
        expected: CandidateId,
        got: CandidateId,
    },
}
