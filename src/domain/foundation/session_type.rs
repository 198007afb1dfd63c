//! Kind of conversation a session runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of conversation a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Screening,
    Assessment,
    FollowUp,
    Consultation,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionType::Screening => "screening",
            SessionType::Assessment => "assessment",
            SessionType::FollowUp => "follow_up",
            SessionType::Consultation => "consultation",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionType::FollowUp).unwrap(),
            "\"follow_up\""
        );
        assert_eq!(SessionType::FollowUp.to_string(), "follow_up");
    }
}
