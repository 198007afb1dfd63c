//! In-memory append-only message log.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::Message;
use crate::domain::foundation::{DomainError, SessionId};
use crate::ports::MessageRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<SessionId, Vec<Message>>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: &Message) -> Result<(), DomainError> {
        let mut messages = self.messages.write().await;
        let log = messages.entry(*message.session_id()).or_default();
        if log.iter().any(|m| m.id() == message.id()) {
            return Err(DomainError::database(format!("message {} already exists", message.id())));
        }
        log.push(message.clone());
        Ok(())
    }

    async fn list_by_session(&self, session_id: &SessionId) -> Result<Vec<Message>, DomainError> {
        let mut listed = self.messages.read().await.get(session_id).cloned().unwrap_or_default();
        listed.sort_by_key(Message::ordering_key);
        Ok(listed)
    }

    async fn count_by_session(&self, session_id: &SessionId) -> Result<usize, DomainError> {
        Ok(self.messages.read().await.get(session_id).map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::MessageKind;
    use crate::domain::foundation::{ErrorCode, Timestamp};

    #[tokio::test]
    async fn lists_in_timestamp_order_regardless_of_insertion() {
        let repo = InMemoryMessageRepository::new();
        let session_id = SessionId::new();
        let now = Timestamp::now();

        let later = Message::assistant(session_id, MessageKind::Question, "second", now.plus_secs(1)).unwrap();
        let earlier = Message::user(session_id, "first", now).unwrap();
        repo.append(&later).await.unwrap();
        repo.append(&earlier).await.unwrap();

        let listed = repo.list_by_session(&session_id).await.unwrap();
        let contents: Vec<&str> = listed.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(repo.count_by_session(&session_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_append_is_rejected() {
        let repo = InMemoryMessageRepository::new();
        let message = Message::user(SessionId::new(), "hello", Timestamp::now()).unwrap();
        repo.append(&message).await.unwrap();

        let err = repo.append(&message).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[tokio::test]
    async fn unknown_session_is_empty() {
        let repo = InMemoryMessageRepository::new();
        assert!(repo.list_by_session(&SessionId::new()).await.unwrap().is_empty());
        assert_eq!(repo.count_by_session(&SessionId::new()).await.unwrap(), 0);
    }
}
