//! Intent lifecycle state machine.
//!
//! Pure transition-validity relation over the nine named intent states.
//! No I/O, no persistence; the executor in the infra crate is the only
//! caller that pairs this with a durable event append.

use std::fmt;

/// One of the nine states an intent can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentState {
    Received,
    Screened,
    Validated,
    Enriched,
    Queued,
    Submitted,
    Included,
    Dropped,
    Rejected,
}

impl IntentState {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            IntentState::Included | IntentState::Dropped | IntentState::Rejected
        )
    }
}

impl fmt::Display for IntentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntentState::Received => "RECEIVED",
            IntentState::Screened => "SCREENED",
            IntentState::Validated => "VALIDATED",
            IntentState::Enriched => "ENRICHED",
            IntentState::Queued => "QUEUED",
            IntentState::Submitted => "SUBMITTED",
            IntentState::Included => "INCLUDED",
            IntentState::Dropped => "DROPPED",
            IntentState::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Returns true iff `to` is a legal successor of `from`.
pub fn can(from: IntentState, to: IntentState) -> bool {
    use IntentState::*;
    matches!(
        (from, to),
        (Received, Screened)
            | (Screened, Validated)
            | (Screened, Rejected)
            | (Validated, Enriched)
            | (Validated, Rejected)
            | (Enriched, Queued)
            | (Enriched, Rejected)
            | (Queued, Submitted)
            | (Submitted, Included)
            | (Submitted, Dropped)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use IntentState::*;

    #[test]
    fn green_ladder_is_legal() {
        assert!(can(Received, Screened));
        assert!(can(Screened, Validated));
        assert!(can(Validated, Enriched));
        assert!(can(Enriched, Queued));
        assert!(can(Queued, Submitted));
        assert!(can(Submitted, Included));
    }

    #[test]
    fn each_pre_terminal_state_can_reject() {
        assert!(can(Screened, Rejected));
        assert!(can(Validated, Rejected));
        assert!(can(Enriched, Rejected));
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for terminal in [Included, Dropped, Rejected] {
            for to in [
                Received, Screened, Validated, Enriched, Queued, Submitted, Included, Dropped,
                Rejected,
            ] {
                assert!(!can(terminal, to), "{terminal:?} -> {to:?} must be illegal");
            }
        }
        assert!(Included.is_terminal());
        assert!(Dropped.is_terminal());
        assert!(Rejected.is_terminal());
        assert!(!Queued.is_terminal());
    }

    #[test]
    fn received_cannot_skip_to_validated() {
        assert!(!can(Received, Validated));
    }

    #[test]
    fn queued_only_advances_to_submitted() {
        assert!(can(Queued, Submitted));
        assert!(!can(Queued, Rejected));
        assert!(!can(Queued, Included));
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(Received.to_string(), "RECEIVED");
        assert_eq!(Dropped.to_string(), "DROPPED");
    }
}
