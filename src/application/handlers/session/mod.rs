//! Session command and query handlers.

mod change_session_status;
mod end_session;
mod expire_idle_sessions;
mod process_turn;
mod queries;
mod start_session;

#[cfg(test)]
pub(crate) mod test_support;

pub use change_session_status::{ChangeSessionStatusCommand, ChangeSessionStatusHandler, StatusChange};
pub use end_session::{EndSessionCommand, EndSessionHandler, EndSessionResult, END_REASON_REQUESTED};
pub use expire_idle_sessions::{ExpireIdleSessionsCommand, ExpireIdleSessionsHandler, ExpireIdleSessionsResult};
pub use process_turn::{ProcessTurnCommand, ProcessTurnHandler, TurnOutcome, TurnSettings};
pub use queries::{GetAssessmentHandler, GetSessionHandler, ListMessagesHandler};
pub use start_session::{StartSessionCommand, StartSessionHandler, StartSessionResult};
