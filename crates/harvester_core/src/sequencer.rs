/// Numeric identifier probed against the remote catalog. Always `>= 1`.
pub type CandidateId = u64;

/// Consecutive misses tolerated before the id space is declared exhausted.
pub const DEFAULT_MISS_THRESHOLD: u64 = 10_000;

/// Produces candidate ids one at a time and tracks the trailing miss streak.
///
/// The sequencer never bounds the id from above and never moves it backwards;
/// the only terminal condition is `miss_streak >= threshold`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequencer {
    first_id: CandidateId,
    current: CandidateId,
    miss_streak: u64,
    threshold: u64,
}

impl Sequencer {
    /// Sequencer starting at id 1.
    pub fn new(threshold: u64) -> Self {
        Self::starting_at(1, threshold)
    }

    /// Sequencer starting at `first_id` (clamped to 1).
    pub fn starting_at(first_id: CandidateId, threshold: u64) -> Self {
        let first_id = first_id.max(1);
        Self {
            first_id,
            current: first_id,
            miss_streak: 0,
            threshold,
        }
    }

    /// Resets to the first id with an empty miss streak.
    pub fn start(&mut self) {
        self.current = self.first_id;
        self.miss_streak = 0;
    }

    pub fn current(&self) -> CandidateId {
        self.current
    }

    /// Moves to the next id regardless of the last outcome.
    pub fn advance(&mut self) -> CandidateId {
        self.current += 1;
        self.current
    }

    pub fn on_found(&mut self) {
        self.miss_streak = 0;
    }

    pub fn on_miss(&mut self) {
        self.miss_streak += 1;
    }

    pub fn miss_streak(&self) -> u64 {
        self.miss_streak
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn is_exhausted(&self) -> bool {
        self.miss_streak >= self.threshold
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DEFAULT_MISS_THRESHOLD)
    }
}
