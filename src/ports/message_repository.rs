//! Message repository port.
//!
//! Messages are append-only. Listing returns them in `(created_at, id)`
//! order so the conversation reads back exactly as it happened.

use crate::domain::conversation::Message;
use crate::domain::foundation::{DomainError, SessionId};
use async_trait::async_trait;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate id
    async fn append(&self, message: &Message) -> Result<(), DomainError>;

    /// All messages of a session, ordered by `(created_at, id)`.
    async fn list_by_session(&self, session_id: &SessionId) -> Result<Vec<Message>, DomainError>;

    /// Number of messages stored for a session.
    async fn count_by_session(&self, session_id: &SessionId) -> Result<usize, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn MessageRepository) {}
    }
}
