//! Studio Messages
//!
//! Identifiers, transcript entries, and the messages the studio sends to the
//! view layer.
//!
//! # Design Philosophy
//!
//! The studio owns every piece of state. Views render what they are told and
//! report what the user did through [`crate::events::ViewEvent`]. No view ever
//! reaches into another component: focus requests, reveal/highlight effects and
//! playback changes all travel as a [`StudioMessage`].

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifacts::Artifact;
use crate::capture::CaptureSession;
use crate::conversation::{ConversationId, ConversationSummary};
use crate::playback::{Highlight, PlaybackState};

/// Allocate the next time-derived identifier.
///
/// Identifiers follow wall-clock milliseconds but never repeat or go backwards:
/// two allocations within the same millisecond (a user message and its paired
/// assistant message) still yield strictly increasing values.
fn next_time_id() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let prev = LAST
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
            Some(now.max(prev + 1))
        })
        .unwrap_or_else(|prev| prev);
    now.max(prev + 1)
}

/// Transcript message identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Generate a new identifier, larger than every previously generated one
    #[must_use]
    pub fn next() -> Self {
        Self(next_time_id())
    }

    /// Get the raw numeric value
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generated artifact identifier
///
/// Assigned by the client when a successful response is received; the
/// generation service never supplies one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub u64);

impl ArtifactId {
    /// Generate a new identifier
    #[must_use]
    pub fn next() -> Self {
        Self(next_time_id())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Who authored a transcript message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The person speaking or typing
    User,
    /// The studio's reply (success or failure)
    Assistant,
}

/// One entry of the conversation transcript
///
/// `artifact_id` and `media_url` are either both present (the turn produced an
/// artifact) or both absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique, monotonically increasing id
    pub id: MessageId,
    /// Author
    pub role: MessageRole,
    /// Display text
    pub content: String,
    /// Artifact produced by this turn, if generation succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<ArtifactId>,
    /// Resolved media URL of that artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::next(),
            role: MessageRole::User,
            content: content.into(),
            artifact_id: None,
            media_url: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant message, optionally attached to an artifact
    pub fn assistant(content: impl Into<String>, artifact: Option<&Artifact>) -> Self {
        Self {
            id: MessageId::next(),
            role: MessageRole::Assistant,
            content: content.into(),
            artifact_id: artifact.map(|a| a.id),
            media_url: artifact.map(|a| a.media_url.clone()),
            timestamp: Utc::now(),
        }
    }

    /// Whether this message carries a generated artifact
    #[must_use]
    pub fn has_artifact(&self) -> bool {
        self.artifact_id.is_some()
    }
}

/// Notification severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Something the user should know about
    Warning,
    /// Something failed
    Error,
}

/// Messages from the studio to the view layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StudioMessage {
    // ============================================
    // Transcript
    // ============================================
    /// A message was appended to the transcript
    MessageAppended {
        /// The new message
        message: Message,
    },

    // ============================================
    // Capture
    // ============================================
    /// Capture session changed (status, mode, elapsed time or status text)
    CaptureUpdated {
        /// Current session snapshot
        session: CaptureSession,
        /// User-visible status line (None = nothing to show)
        status_message: Option<String>,
    },

    // ============================================
    // Playback
    // ============================================
    /// A freshly generated artifact should be presented inline
    ArtifactReady {
        /// The artifact
        artifact: Artifact,
    },

    /// The inline artifact was dismissed
    InlineCleared,

    /// Fullscreen playback state changed
    PlaybackChanged {
        /// New state
        state: PlaybackState,
    },

    /// Scroll the given transcript entry into view
    RevealMessage {
        /// Entry to reveal
        message_id: MessageId,
    },

    /// Transient emphasis changed (None = no entry emphasized)
    HighlightChanged {
        /// Current highlight
        highlight: Option<Highlight>,
    },

    /// Move keyboard focus to the input field
    FocusInput,

    // ============================================
    // Conversations
    // ============================================
    /// Conversation list changed
    ConversationsChanged {
        /// All conversations, newest first
        conversations: Vec<ConversationSummary>,
        /// Active conversation
        active: ConversationId,
    },

    // ============================================
    // Lifecycle
    // ============================================
    /// Show a notification
    Notify {
        /// Severity
        level: NotifyLevel,
        /// Text
        message: String,
    },

    /// The studio is shutting down
    ShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increase() {
        let mut last = MessageId::next();
        for _ in 0..1000 {
            let next = MessageId::next();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_ids_are_time_derived() {
        let before = u64::try_from(Utc::now().timestamp_millis()).unwrap();
        let id = MessageId::next();
        assert!(id.as_u64() >= before);
    }

    #[test]
    fn test_artifact_and_message_ids_share_ordering() {
        let user = Message::user("draw a circle");
        let artifact_id = ArtifactId::next();
        let assistant = Message::assistant("done", None);
        assert!(user.id.0 < artifact_id.0);
        assert!(artifact_id.0 < assistant.id.0);
    }

    #[test]
    fn test_artifact_id_parse() {
        assert_eq!("42".parse::<ArtifactId>().unwrap(), ArtifactId(42));
        assert_eq!(" 7 ".parse::<ArtifactId>().unwrap(), ArtifactId(7));
        assert!("abc".parse::<ArtifactId>().is_err());
    }

    #[test]
    fn test_user_message_has_no_artifact() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, MessageRole::User);
        assert!(!msg.has_artifact());
        assert!(msg.media_url.is_none());
    }

    #[test]
    fn test_message_serialization_omits_missing_artifact() {
        let msg = Message::assistant("I couldn't create that animation.", None);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json.get("artifact_id").is_none());
        assert!(json.get("media_url").is_none());
    }
}
