//! Hand phase definitions and per-phase semantics

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phases of a single hand, in ledger order. The client never advances the
/// phase itself; it is read back from the ledger every poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// Between hands; someone may start the next one
    #[default]
    Waiting,
    /// Seated players submit the hash of their secret
    Commit,
    /// Seated players reveal the secret they committed to
    Reveal,
    Preflop,
    Flop,
    Turn,
    River,
    /// Hand resolves and returns to waiting
    Showdown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("unknown game phase code {0}")]
    UnknownCode(u8),
}

/// Actions whose legality depends on the phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseAction {
    StartHand,
    Commit,
    Reveal,
    Bet,
}

impl GamePhase {
    pub const ALL: [GamePhase; 8] = [
        GamePhase::Waiting,
        GamePhase::Commit,
        GamePhase::Reveal,
        GamePhase::Preflop,
        GamePhase::Flop,
        GamePhase::Turn,
        GamePhase::River,
        GamePhase::Showdown,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self, PhaseError> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(PhaseError::UnknownCode(code))
    }

    /// Next phase in the ledger's sequence; showdown wraps back to waiting.
    pub fn next(self) -> GamePhase {
        match self {
            GamePhase::Waiting => GamePhase::Commit,
            GamePhase::Commit => GamePhase::Reveal,
            GamePhase::Reveal => GamePhase::Preflop,
            GamePhase::Preflop => GamePhase::Flop,
            GamePhase::Flop => GamePhase::Turn,
            GamePhase::Turn => GamePhase::River,
            GamePhase::River => GamePhase::Showdown,
            GamePhase::Showdown => GamePhase::Waiting,
        }
    }

    pub fn is_betting(self) -> bool {
        matches!(
            self,
            GamePhase::Preflop | GamePhase::Flop | GamePhase::Turn | GamePhase::River
        )
    }

    /// Hole cards only exist once the deal has happened.
    pub fn hole_cards_visible(self) -> bool {
        self >= GamePhase::Preflop
    }

    pub fn allows(self, action: PhaseAction) -> bool {
        match action {
            PhaseAction::StartHand => self == GamePhase::Waiting,
            PhaseAction::Commit => self == GamePhase::Commit,
            PhaseAction::Reveal => self == GamePhase::Reveal,
            PhaseAction::Bet => self.is_betting(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GamePhase::Waiting => "WAITING",
            GamePhase::Commit => "COMMIT",
            GamePhase::Reveal => "REVEAL",
            GamePhase::Preflop => "PREFLOP",
            GamePhase::Flop => "FLOP",
            GamePhase::Turn => "TURN",
            GamePhase::River => "RIVER",
            GamePhase::Showdown => "SHOWDOWN",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GamePhase::Waiting => "Waiting for the next hand to start.",
            GamePhase::Commit => {
                "Submit a hash of your secret to commit to your hidden card draw."
            }
            GamePhase::Reveal => "Reveal the secret you committed to finalize randomness.",
            GamePhase::Preflop | GamePhase::Flop | GamePhase::Turn | GamePhase::River => {
                "Betting round in progress."
            }
            GamePhase::Showdown => "Hand resolving at showdown.",
        }
    }
}

impl TryFrom<u8> for GamePhase {
    type Error = PhaseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        GamePhase::from_code(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_ledger_order() {
        for (code, phase) in GamePhase::ALL.iter().enumerate() {
            assert_eq!(GamePhase::from_code(code as u8), Ok(*phase));
            assert_eq!(phase.ordinal(), code as u8);
        }
        assert_eq!(GamePhase::from_code(8), Err(PhaseError::UnknownCode(8)));
    }

    #[test]
    fn sequence_wraps_after_showdown() {
        let mut phase = GamePhase::Waiting;
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(phase);
            phase = phase.next();
        }
        assert_eq!(seen, GamePhase::ALL.to_vec());
        assert_eq!(phase, GamePhase::Waiting);
    }

    #[test]
    fn hole_cards_hidden_before_preflop() {
        assert!(!GamePhase::Waiting.hole_cards_visible());
        assert!(!GamePhase::Commit.hole_cards_visible());
        assert!(!GamePhase::Reveal.hole_cards_visible());
        for phase in &GamePhase::ALL[3..] {
            assert!(phase.hole_cards_visible(), "{phase:?} should show cards");
        }
    }

    #[test]
    fn each_lifecycle_action_has_exactly_one_phase() {
        for action in [PhaseAction::StartHand, PhaseAction::Commit, PhaseAction::Reveal] {
            let phases: Vec<_> = GamePhase::ALL
                .iter()
                .filter(|phase| phase.allows(action))
                .collect();
            assert_eq!(phases.len(), 1, "{action:?}");
        }
        assert!(!GamePhase::Showdown.allows(PhaseAction::Bet));
        assert!(GamePhase::River.allows(PhaseAction::Bet));
    }
}
