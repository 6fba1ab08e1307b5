//! View Events
//!
//! Events sent from the view layer to the studio. They report what the user
//! did; the studio decides what it means.

use serde::{Deserialize, Serialize};

use crate::backend::Mode;
use crate::conversation::ConversationId;
use crate::messages::ArtifactId;

/// Keys the studio reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    /// Escape
    Escape,
    /// Enter/Return
    Enter,
    /// Anything else
    Other,
}

/// Events from the view layer to the studio
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    // ============================================
    // Capture
    // ============================================
    /// Record button pressed while idle
    StartRecording,

    /// Record button pressed while recording
    StopRecording,

    /// Text submitted from the input field
    SubmitText {
        /// Raw input (trimmed by the studio)
        text: String,
    },

    /// Mode selected explicitly
    SetMode {
        /// Requested mode
        mode: Mode,
    },

    /// Mode switch flipped
    ToggleMode,

    // ============================================
    // Playback
    // ============================================
    /// Expand an artifact to fullscreen
    OpenFullscreen {
        /// Artifact to play
        artifact_id: ArtifactId,
    },

    /// Fullscreen close control pressed
    CloseFullscreen,

    /// Key pressed anywhere in the view
    KeyPressed {
        /// The key
        key: Key,
    },

    /// "Return to chat" pressed
    ReturnToChat,

    /// Inline player dismissed
    ClearInline,

    // ============================================
    // Conversations
    // ============================================
    /// "New conversation" pressed
    NewConversation,

    /// Sidebar entry selected
    SelectConversation {
        /// Conversation to activate
        id: ConversationId,
    },

    // ============================================
    // Lifecycle
    // ============================================
    /// The view is closing
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = ViewEvent::SubmitText {
            text: "draw a circle".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "submit_text");
        assert_eq!(json["text"], "draw a circle");

        let parsed: ViewEvent =
            serde_json::from_str(r#"{"type":"key_pressed","key":"escape"}"#).unwrap();
        assert_eq!(parsed, ViewEvent::KeyPressed { key: Key::Escape });
    }
}
