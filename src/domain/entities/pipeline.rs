use serde::Serialize;

/// Progress of a single intake run. Exactly one instance lives per upload;
/// the next upload starts over from `Idle`.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    Reading,
    Analyzing,
    Persisting,
    Succeeded,
    Failed(String),
}

impl PipelineState {
    /// True while the run holds the loading indicator: asserted for the full
    /// duration of Reading, Analyzing, and Persisting, and nowhere else.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            PipelineState::Reading | PipelineState::Analyzing | PipelineState::Persisting
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed(_))
    }
}

/// Explicit observer boundary: the presentation layer subscribes to state
/// changes through this interface and never mutates pipeline state itself.
pub trait StateObserver: Send + Sync {
    fn state_changed(&self, state: &PipelineState);
}

/// Observer for callers that only need the terminal result.
pub struct NullObserver;

impl StateObserver for NullObserver {
    fn state_changed(&self, _state: &PipelineState) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_is_asserted_only_mid_pipeline() {
        assert!(!PipelineState::Idle.is_loading());
        assert!(PipelineState::Reading.is_loading());
        assert!(PipelineState::Analyzing.is_loading());
        assert!(PipelineState::Persisting.is_loading());
        assert!(!PipelineState::Succeeded.is_loading());
        assert!(!PipelineState::Failed("boom".into()).is_loading());
    }

    #[test]
    fn terminal_states_are_succeeded_and_failed() {
        assert!(PipelineState::Succeeded.is_terminal());
        assert!(PipelineState::Failed("boom".into()).is_terminal());
        assert!(!PipelineState::Persisting.is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
    }

    #[test]
    fn serializes_with_state_tag() {
        let json = serde_json::to_value(PipelineState::Failed("quota exceeded".into())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], "quota exceeded");

        let json = serde_json::to_value(PipelineState::Succeeded).unwrap();
        assert_eq!(json["state"], "succeeded");
    }
}
