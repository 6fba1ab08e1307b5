//! Conversation Transcript
//!
//! Append-only, ordered record of the chat. Insertion order is display order.
//! There is no way to edit or remove a message once appended.
//!
//! # Concurrency
//!
//! The studio is the only writer. Readers (renderers, the playback
//! coordinator) hold cheap clones and always observe a consistent prefix of
//! the transcript.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::artifacts::Artifact;
use crate::messages::{ArtifactId, Message, MessageId};

/// Shared, append-only transcript
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl ConversationStore {
    /// Create an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message
    pub fn append_user(&self, content: impl Into<String>) -> Message {
        self.push(Message::user(content))
    }

    /// Append an assistant message
    ///
    /// When `artifact` is given the message references it; the artifact must
    /// already be registered.
    pub fn append_assistant(&self, content: impl Into<String>, artifact: Option<&Artifact>) -> Message {
        self.push(Message::assistant(content, artifact))
    }

    fn push(&self, message: Message) -> Message {
        let mut messages = self.messages.write();
        tracing::debug!(
            id = %message.id,
            role = ?message.role,
            position = messages.len(),
            "Appended transcript message"
        );
        messages.push(message.clone());
        message
    }

    /// Snapshot of all messages in display order
    #[must_use]
    pub fn all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Whether the transcript is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Get a message by id
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<Message> {
        self.messages.read().iter().find(|m| &m.id == id).cloned()
    }

    /// Find the entry that produced an artifact
    #[must_use]
    pub fn find_by_artifact(&self, artifact_id: &ArtifactId) -> Option<Message> {
        self.messages
            .read()
            .iter()
            .find(|m| m.artifact_id.as_ref() == Some(artifact_id))
            .cloned()
    }

    /// The last N messages
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<Message> {
        let messages = self.messages.read();
        let start = messages.len().saturating_sub(count);
        messages[start..].to_vec()
    }
}
