//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod session;

pub use session::{
    // Commands
    ChangeSessionStatusCommand, EndSessionCommand, ExpireIdleSessionsCommand, ProcessTurnCommand,
    StartSessionCommand, StatusChange,
    // Handlers
    ChangeSessionStatusHandler, EndSessionHandler, ExpireIdleSessionsHandler, GetAssessmentHandler,
    GetSessionHandler, ListMessagesHandler, ProcessTurnHandler, StartSessionHandler,
    // Results
    EndSessionResult, ExpireIdleSessionsResult, StartSessionResult, TurnOutcome, TurnSettings,
};
