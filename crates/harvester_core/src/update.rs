use crate::{Effect, HarvestState, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
///
/// Completed steps are folded strictly in id order. A step for any id other
/// than the sequencer's current id is answered with [`Effect::Rejected`] and
/// leaves the state untouched, so the miss streak always describes a trailing
/// run of consecutive ids.
pub fn update(mut state: HarvestState, msg: Msg) -> (HarvestState, Vec<Effect>) {
    let effects = match msg {
        Msg::Start => {
            if state.phase() != Phase::Idle {
                return (state, Vec::new());
            }
            state.start();
            if state.sequencer().is_exhausted() {
                state.finish();
                vec![Effect::Finish]
            } else {
                vec![Effect::Probe {
                    id: state.sequencer().current(),
                }]
            }
        }
        Msg::StepCompleted { id, kind } => {
            if state.phase() != Phase::Running {
                return (state, Vec::new());
            }
            let expected = state.sequencer().current();
            if id != expected {
                return (state, vec![Effect::Rejected { expected, got: id }]);
            }

            state.record(kind);
            if state.sequencer().is_exhausted() {
                state.finish();
                vec![Effect::Finish]
            } else {
                let next = state.advance();
                vec![Effect::Probe { id: next }]
            }
        }
    };

    (state, effects)
}
