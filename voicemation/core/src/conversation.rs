//! Conversation List
//!
//! The sidebar's list of conversations and which one is active.
//!
//! Switching conversations does NOT partition or reset the transcript: every
//! conversation shows the same shared [`crate::transcript::ConversationStore`].
//! Per-conversation history is a known gap, kept as-is.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversation identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub u32);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One sidebar entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Identifier
    pub id: ConversationId,
    /// Display title
    pub title: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
}

/// Ordered list of conversations, newest first
#[derive(Clone, Debug)]
pub struct ConversationList {
    entries: Vec<ConversationSummary>,
    active: ConversationId,
}

impl Default for ConversationList {
    fn default() -> Self {
        Self {
            entries: vec![ConversationSummary {
                id: ConversationId(1),
                title: "Voice Animation Demo".to_string(),
                created_at: Utc::now(),
            }],
            active: ConversationId(1),
        }
    }
}

impl ConversationList {
    /// Create the list with its initial demo conversation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new conversation and make it active
    pub fn new_conversation(&mut self) -> ConversationId {
        let next = u32::try_from(self.entries.len()).unwrap_or(u32::MAX - 1) + 1;
        let id = ConversationId(next);
        self.entries.insert(
            0,
            ConversationSummary {
                id,
                title: format!("New Conversation {next}"),
                created_at: Utc::now(),
            },
        );
        self.active = id;
        tracing::info!(conversation = %id, "Started conversation");
        id
    }

    /// Switch the active conversation
    ///
    /// Returns false (and changes nothing) for an unknown id.
    pub fn select(&mut self, id: ConversationId) -> bool {
        if self.entries.iter().any(|c| c.id == id) {
            self.active = id;
            true
        } else {
            false
        }
    }

    /// Active conversation
    #[must_use]
    pub fn active(&self) -> ConversationId {
        self.active
    }

    /// All conversations, newest first
    #[must_use]
    pub fn entries(&self) -> &[ConversationSummary] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_conversation() {
        let list = ConversationList::new();
        assert_eq!(list.entries().len(), 1);
        assert_eq!(list.active(), ConversationId(1));
        assert_eq!(list.entries()[0].title, "Voice Animation Demo");
    }

    #[test]
    fn test_new_conversation_is_prepended_and_active() {
        let mut list = ConversationList::new();
        let id = list.new_conversation();

        assert_eq!(id, ConversationId(2));
        assert_eq!(list.active(), id);
        assert_eq!(list.entries()[0].title, "New Conversation 2");
        assert_eq!(list.entries()[1].id, ConversationId(1));
    }

    #[test]
    fn test_select() {
        let mut list = ConversationList::new();
        list.new_conversation();

        assert!(list.select(ConversationId(1)));
        assert_eq!(list.active(), ConversationId(1));

        assert!(!list.select(ConversationId(99)));
        assert_eq!(list.active(), ConversationId(1));
    }
}
