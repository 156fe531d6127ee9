use serde::Serialize;
use thiserror::Error;

/// Pipeline stages of a single turn, in the only order they may occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    Received,
    Classified,
    FactsGathered,
    Drafted,
    Validated,
    Emitted,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TurnTransitionError {
    #[error("invalid turn transition from {from:?} to {to:?}")]
    InvalidTransition { from: TurnStage, to: TurnStage },
}

/// Records the stages a turn has passed through and refuses any skip, so a
/// turn cannot reach `Emitted` without `Validated`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnTrace {
    stages: Vec<TurnStage>,
}

impl TurnTrace {
    pub fn received() -> Self {
        Self { stages: vec![TurnStage::Received] }
    }

    pub fn current(&self) -> TurnStage {
        self.stages.last().copied().unwrap_or(TurnStage::Received)
    }

    pub fn advance(&mut self, to: TurnStage) -> Result<(), TurnTransitionError> {
        use TurnStage::{Classified, Drafted, Emitted, FactsGathered, Received, Validated};

        let from = self.current();
        match (from, to) {
            (Received, Classified)
            | (Classified, FactsGathered)
            | (FactsGathered, Drafted)
            | (Drafted, Validated)
            | (Validated, Emitted) => {
                self.stages.push(to);
                Ok(())
            }
            _ => Err(TurnTransitionError::InvalidTransition { from, to }),
        }
    }

    pub fn is_emitted(&self) -> bool {
        self.current() == TurnStage::Emitted
    }

    pub fn stages(&self) -> &[TurnStage] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<TurnStage> {
        self.stages
    }
}

#[cfg(test)]
mod tests {
    use super::{TurnStage, TurnTrace, TurnTransitionError};

    #[test]
    fn happy_path_reaches_emitted_through_every_stage() {
        let mut trace = TurnTrace::received();
        for stage in [
            TurnStage::Classified,
            TurnStage::FactsGathered,
            TurnStage::Drafted,
            TurnStage::Validated,
            TurnStage::Emitted,
        ] {
            trace.advance(stage).expect("forward transition");
        }

        assert!(trace.is_emitted());
        assert_eq!(trace.stages().len(), 6);
    }

    #[test]
    fn skipping_validation_is_rejected() {
        let mut trace = TurnTrace::received();
        trace.advance(TurnStage::Classified).expect("classified");
        trace.advance(TurnStage::FactsGathered).expect("facts");
        trace.advance(TurnStage::Drafted).expect("drafted");

        let error = trace.advance(TurnStage::Emitted).expect_err("must not skip validated");
        assert_eq!(
            error,
            TurnTransitionError::InvalidTransition { from: TurnStage::Drafted, to: TurnStage::Emitted }
        );
        assert_eq!(trace.current(), TurnStage::Drafted);
    }

    #[test]
    fn stages_cannot_repeat() {
        let mut trace = TurnTrace::received();
        trace.advance(TurnStage::Classified).expect("classified");
        assert!(trace.advance(TurnStage::Classified).is_err());
    }
}
