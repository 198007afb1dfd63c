//! SessionStatus enum for tracking the lifecycle of chat sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a chat session.
///
/// ```text
/// Active ──► Completed | Paused | Cancelled | Error
/// Paused ──► Active | Completed | Cancelled
/// ```
///
/// `Paused → Completed` is only taken by an explicit end; everything else is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Paused,
    Error,
    Cancelled,
}

impl SessionStatus {
    /// Returns true if the session accepts new turns.
    pub fn accepts_turns(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    /// Returns true if the session is still open (active or paused).
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::Paused)
    }

    /// All statuses, in declaration order.
    pub fn all() -> [SessionStatus; 5] {
        [
            SessionStatus::Active,
            SessionStatus::Completed,
            SessionStatus::Paused,
            SessionStatus::Error,
            SessionStatus::Cancelled,
        ]
    }
}

impl StateMachine for SessionStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Active => vec![Completed, Paused, Cancelled, Error],
            Paused => vec![Active, Completed, Cancelled],
            Completed | Error | Cancelled => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Paused => "paused",
            SessionStatus::Error => "error",
            SessionStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}
