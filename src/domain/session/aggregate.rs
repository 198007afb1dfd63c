//! Session aggregate entity.
//!
//! A session is one intake conversation between a subject and a strategy.
//! It owns the accumulated facts, the pinned strategy snapshot and the
//! current assessment. Only the orchestrator mutates it, and only through
//! the methods below.

use serde::{Deserialize, Serialize};

use crate::domain::assessment::AssessmentResult;
use crate::domain::fact::Facts;
use crate::domain::foundation::{
    DomainError, ErrorCode, SessionId, SessionStatus, SessionType, StateMachine, StrategyId, SubjectId, Timestamp,
};
use crate::domain::strategy::{Strategy, StrategySnapshot};

/// End reason recorded when the strategy's turn limit is hit.
pub const END_REASON_MAX_TURNS: &str = "max_turns_reached";

/// End reason recorded by the idle-session sweep.
pub const END_REASON_TIMEOUT: &str = "timeout";

/// Session aggregate.
///
/// # Invariants
///
/// - `status` only changes along [`SessionStatus`] transitions
/// - `turn_count` never exceeds the snapshot's `max_turns`
/// - `completed_at` is set exactly when the session leaves the open states
/// - `last_activity_at` never moves backwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    strategy_id: StrategyId,
    subject_id: SubjectId,
    session_type: SessionType,
    status: SessionStatus,

    /// Strategy as it was when the session started.
    strategy: StrategySnapshot,

    facts: Facts,
    turn_count: u32,
    last_assessment: Option<AssessmentResult>,

    /// Caller-supplied context, always a JSON object.
    initial_context: serde_json::Value,

    end_reason: Option<String>,
    started_at: Timestamp,
    last_activity_at: Timestamp,
    completed_at: Option<Timestamp>,
}

impl Session {
    /// Starts a new active session pinned to a snapshot of `strategy`.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `initial_context` is neither null nor a JSON object
    pub fn start(
        strategy: &Strategy,
        subject_id: SubjectId,
        session_type: SessionType,
        initial_context: serde_json::Value,
    ) -> Result<Self, DomainError> {
        let initial_context = match initial_context {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value @ serde_json::Value::Object(_) => value,
            _ => {
                return Err(DomainError::validation(
                    "initial_context",
                    "Initial context must be a JSON object",
                ))
            }
        };

        let snapshot = strategy.snapshot();
        let now = *snapshot.pinned_at();
        Ok(Self {
            id: SessionId::new(),
            strategy_id: strategy.id.clone(),
            subject_id,
            session_type,
            status: SessionStatus::Active,
            strategy: snapshot,
            facts: Facts::new(),
            turn_count: 0,
            last_assessment: None,
            initial_context,
            end_reason: None,
            started_at: now,
            last_activity_at: now,
            completed_at: None,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn strategy_id(&self) -> &StrategyId {
        &self.strategy_id
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the pinned strategy snapshot.
    pub fn strategy(&self) -> &StrategySnapshot {
        &self.strategy
    }

    pub fn facts(&self) -> &Facts {
        &self.facts
    }

    /// Number of user turns processed so far.
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn last_assessment(&self) -> Option<&AssessmentResult> {
        self.last_assessment.as_ref()
    }

    pub fn initial_context(&self) -> &serde_json::Value {
        &self.initial_context
    }

    pub fn end_reason(&self) -> Option<&str> {
        self.end_reason.as_deref()
    }

    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    pub fn last_activity_at(&self) -> &Timestamp {
        &self.last_activity_at
    }

    pub fn completed_at(&self) -> Option<&Timestamp> {
        self.completed_at.as_ref()
    }

    /// Returns true once the turn limit of the snapshot is reached.
    pub fn has_reached_max_turns(&self) -> bool {
        self.turn_count >= self.strategy.max_turns()
    }

    /// Returns true if the session is open and was last active before `cutoff`.
    pub fn is_idle_since(&self, cutoff: &Timestamp) -> bool {
        self.status.is_open() && self.last_activity_at.is_before(cutoff)
    }

    /// Timestamp for the next message appended to this session.
    ///
    /// Strictly later than the last recorded activity, so stored messages
    /// stay in append order even if the wall clock steps back. Callers
    /// `touch` the session with it once the message is stored.
    pub fn next_message_timestamp(&self) -> Timestamp {
        Timestamp::now_after(&self.last_activity_at)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fails unless the session accepts new turns.
    pub fn ensure_accepts_turns(&self) -> Result<(), DomainError> {
        if self.status.accepts_turns() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::SessionNotActive,
                format!("Session {} is {} and does not accept turns", self.id, self.status),
            ))
        }
    }

    /// Records activity at `at`; earlier instants are ignored.
    pub fn touch(&mut self, at: Timestamp) {
        self.last_activity_at = self.last_activity_at.max(at);
    }

    /// Counts one processed user turn.
    pub fn record_turn(&mut self, at: Timestamp) -> Result<u32, DomainError> {
        self.ensure_accepts_turns()?;
        self.turn_count += 1;
        self.touch(at);
        Ok(self.turn_count)
    }

    /// Merges newly extracted facts, last write wins. Returns the changed keys.
    pub fn merge_facts(&mut self, new_facts: &Facts) -> Vec<String> {
        self.facts.merge(new_facts)
    }

    /// Stores the current assessment result.
    pub fn set_assessment(&mut self, result: AssessmentResult) {
        self.last_assessment = Some(result);
    }

    /// Ends the session as completed.
    ///
    /// Returns `Ok(false)` when the session was already completed.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` from `Cancelled` or `Error`
    pub fn complete(&mut self, reason: impl Into<String>) -> Result<bool, DomainError> {
        if self.status == SessionStatus::Completed {
            return Ok(false);
        }
        self.close(SessionStatus::Completed, reason.into())?;
        Ok(true)
    }

    /// Suspends an active session.
    pub fn pause(&mut self) -> Result<(), DomainError> {
        self.transition(SessionStatus::Paused)
    }

    /// Resumes a paused session.
    pub fn resume(&mut self) -> Result<(), DomainError> {
        self.transition(SessionStatus::Active)
    }

    /// Cancels an open session.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.close(SessionStatus::Cancelled, reason.into())
    }

    /// Marks an active session as failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.close(SessionStatus::Error, reason.into())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn close(&mut self, target: SessionStatus, reason: String) -> Result<(), DomainError> {
        self.transition(target)?;
        let now = Timestamp::now_not_before(&self.last_activity_at);
        self.end_reason = Some(reason);
        self.completed_at = Some(now);
        self.last_activity_at = now;
        Ok(())
    }

    fn transition(&mut self, target: SessionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Session {} cannot move from {} to {}", self.id, self.status, target),
            )
        })?;
        self.touch(Timestamp::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::{AssessmentEngine, TierThresholds};
    use crate::domain::fact::FactValue;

    fn strategy(max_turns: u32) -> Strategy {
        Strategy::new(StrategyId::new("screening").unwrap(), "Screening", "Collect basics").with_max_turns(max_turns)
    }

    fn session(max_turns: u32) -> Session {
        Session::start(
            &strategy(max_turns),
            SubjectId::new("patient-1").unwrap(),
            SessionType::Screening,
            serde_json::Value::Null,
        )
        .unwrap()
    }

    #[test]
    fn start_creates_active_session_with_empty_context_object() {
        let s = session(5);
        assert_eq!(s.status(), SessionStatus::Active);
        assert_eq!(s.turn_count(), 0);
        assert!(s.facts().is_empty());
        assert!(s.initial_context().is_object());
        assert_eq!(s.strategy().max_turns(), 5);
        assert_eq!(s.started_at(), s.last_activity_at());
    }

    #[test]
    fn start_rejects_non_object_context() {
        let err = Session::start(
            &strategy(5),
            SubjectId::new("p").unwrap(),
            SessionType::Assessment,
            serde_json::json!([1, 2]),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn record_turn_counts_and_reaches_limit() {
        let mut s = session(2);
        assert_eq!(s.record_turn(Timestamp::now()).unwrap(), 1);
        assert!(!s.has_reached_max_turns());
        assert_eq!(s.record_turn(Timestamp::now()).unwrap(), 2);
        assert!(s.has_reached_max_turns());
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut s = session(5);
        let later = s.last_activity_at().plus_secs(60);
        s.touch(later);
        s.touch(later.minus_secs(120));
        assert_eq!(s.last_activity_at(), &later);
        assert!(s.next_message_timestamp().is_after(&later));
    }

    #[test]
    fn complete_is_idempotent() {
        let mut s = session(5);
        assert!(s.complete("done").unwrap());
        let completed_at = *s.completed_at().unwrap();
        assert!(!s.complete("again").unwrap());
        assert_eq!(s.end_reason(), Some("done"));
        assert_eq!(s.completed_at(), Some(&completed_at));
    }

    #[test]
    fn complete_from_paused_is_allowed() {
        let mut s = session(5);
        s.pause().unwrap();
        assert!(s.complete("user ended").unwrap());
        assert_eq!(s.status(), SessionStatus::Completed);
    }

    #[test]
    fn complete_from_cancelled_or_error_fails() {
        let mut s = session(5);
        s.cancel("withdrawn").unwrap();
        assert_eq!(s.complete("x").unwrap_err().code, ErrorCode::InvalidStateTransition);

        let mut s = session(5);
        s.fail("provider outage").unwrap();
        assert_eq!(s.complete("x").unwrap_err().code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn paused_session_rejects_turns_until_resumed() {
        let mut s = session(5);
        s.pause().unwrap();
        assert_eq!(s.record_turn(Timestamp::now()).unwrap_err().code, ErrorCode::SessionNotActive);
        s.resume().unwrap();
        assert!(s.record_turn(Timestamp::now()).is_ok());
    }

    #[test]
    fn fail_is_only_reachable_from_active() {
        let mut s = session(5);
        s.pause().unwrap();
        assert!(s.fail("boom").is_err());
        assert_eq!(s.status(), SessionStatus::Paused);
    }

    #[test]
    fn merge_facts_and_assessment() {
        let mut s = session(5);
        let mut new_facts = Facts::new();
        new_facts.insert("age", FactValue::Integer(30));
        assert_eq!(s.merge_facts(&new_facts), vec!["age".to_string()]);

        let result = AssessmentEngine::new(TierThresholds::default()).assess(s.facts(), s.strategy().criteria());
        s.set_assessment(result);
        assert!(s.last_assessment().is_some());
    }

    #[test]
    fn idle_detection_ignores_closed_sessions() {
        let mut s = session(5);
        let future = s.last_activity_at().plus_secs(3600);
        assert!(s.is_idle_since(&future));
        s.complete("done").unwrap();
        assert!(!s.is_idle_since(&future.plus_secs(3600)));
    }
}
