//! Session repository port.
//!
//! Defines the contract for persisting and retrieving Session aggregates.
//! Each call is its own unit of work; there are no transactions spanning
//! calls.

use crate::domain::foundation::{DomainError, SessionId, SessionStatus};
use crate::domain::session::Session;
use async_trait::async_trait;

/// Repository port for Session aggregate persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate id
    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    /// Update an existing session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if session doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, session: &Session) -> Result<(), DomainError>;

    /// Find a session by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Find all sessions in the given status, oldest activity first.
    async fn list_by_status(&self, status: SessionStatus) -> Result<Vec<Session>, DomainError>;
}
