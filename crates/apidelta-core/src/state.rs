//! Driver states and their legal transitions

use crate::error::PipelineError;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// One step of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    /// Selecting revisions
    Init,
    /// Extracting every operation of the sole (or forced) revision
    FullExtract,
    /// Loading both revisions and diffing them
    Compare,
    /// Extracting only added and updated paths
    SelectiveExtract,
    /// Pruning stale artifacts and handing fragments to generation
    Done,
}

impl DriverState {
    /// Snake-case name, as serialized
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::FullExtract => "full_extract",
            Self::Compare => "compare",
            Self::SelectiveExtract => "selective_extract",
            Self::Done => "done",
        }
    }
}

impl Display for DriverState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates a driver transition
///
/// # Errors
/// Returns [`PipelineError::IllegalTransition`] for moves outside
/// [`allowed_transitions`]
pub fn validate_transition(from: DriverState, to: DriverState) -> Result<(), PipelineError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PipelineError::IllegalTransition { from, to })
    }
}

/// States reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: DriverState) -> &'static [DriverState] {
    match from {
        DriverState::Init => &[DriverState::FullExtract, DriverState::Compare],
        // Forced full extraction is entered after the diff
        DriverState::Compare => &[
            DriverState::SelectiveExtract,
            DriverState::FullExtract,
            DriverState::Done,
        ],
        DriverState::FullExtract | DriverState::SelectiveExtract => &[DriverState::Done],
        DriverState::Done => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_path_is_legal() {
        assert!(validate_transition(DriverState::Init, DriverState::FullExtract).is_ok());
        assert!(validate_transition(DriverState::FullExtract, DriverState::Done).is_ok());
    }

    #[test]
    fn incremental_paths_are_legal() {
        assert!(validate_transition(DriverState::Init, DriverState::Compare).is_ok());
        assert!(validate_transition(DriverState::Compare, DriverState::SelectiveExtract).is_ok());
        assert!(validate_transition(DriverState::Compare, DriverState::Done).is_ok());
        assert!(validate_transition(DriverState::SelectiveExtract, DriverState::Done).is_ok());
    }

    #[test]
    fn skipping_ahead_is_rejected() {
        assert!(matches!(
            validate_transition(DriverState::Init, DriverState::Done),
            Err(PipelineError::IllegalTransition {
                from: DriverState::Init,
                to: DriverState::Done
            })
        ));
        assert!(validate_transition(DriverState::Init, DriverState::SelectiveExtract).is_err());
        assert!(validate_transition(DriverState::FullExtract, DriverState::Compare).is_err());
    }

    #[test]
    fn done_is_terminal() {
        assert!(allowed_transitions(DriverState::Done).is_empty());
    }

    #[test]
    fn display_matches_serialized_name() {
        for state in [
            DriverState::Init,
            DriverState::FullExtract,
            DriverState::Compare,
            DriverState::SelectiveExtract,
            DriverState::Done,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }
}
