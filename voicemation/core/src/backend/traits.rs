//! Generation Backend Traits
//!
//! Trait and value types for talking to the remote generation service. The
//! abstraction lets the studio run against the HTTP client in production and
//! against scripted backends in tests.
//!
//! # Contract
//!
//! [`GenerationBackend::submit`] makes exactly one attempt. There is no retry,
//! no timeout and no cancellation; whoever calls it owns every state
//! transition that follows.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::ArtifactId;

/// Generation depth requested from the service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Short animation
    #[default]
    Standard,
    /// Long, in-depth animation
    Extended,
}

impl Mode {
    /// Value of the service's `inDepthMode` flag
    #[must_use]
    pub fn in_depth(&self) -> bool {
        matches!(self, Self::Extended)
    }

    /// The other mode
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Standard => Self::Extended,
            Self::Extended => Self::Standard,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Extended => write!(f, "in-depth"),
        }
    }
}

/// Recorded audio in its container format
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    /// Encoded container bytes
    pub bytes: Vec<u8>,
    /// File name sent with the upload
    pub file_name: String,
    /// Container MIME type
    pub mime_type: String,
}

impl AudioClip {
    /// Wrap a WebM recording
    #[must_use]
    pub fn webm(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "recording.webm".to_string(),
            mime_type: "audio/webm".to_string(),
        }
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// What the user asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationPayload {
    /// Typed prompt
    Text(String),
    /// Spoken prompt, recognized by the service
    Audio(AudioClip),
}

/// A single generation request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationInput {
    /// Prompt payload
    pub payload: GenerationPayload,
    /// Mode captured when the request was built
    pub mode: Mode,
}

impl GenerationInput {
    /// Text request
    pub fn text(text: impl Into<String>, mode: Mode) -> Self {
        Self {
            payload: GenerationPayload::Text(text.into()),
            mode,
        }
    }

    /// Audio request
    #[must_use]
    pub fn audio(clip: AudioClip, mode: Mode) -> Self {
        Self {
            payload: GenerationPayload::Audio(clip),
            mode,
        }
    }

    /// Source text to use when the service does not echo one back
    #[must_use]
    pub fn fallback_source_text(&self) -> &str {
        match &self.payload {
            GenerationPayload::Text(text) => text,
            GenerationPayload::Audio(_) => "Voice Input",
        }
    }

    /// Short label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.payload {
            GenerationPayload::Text(_) => "text",
            GenerationPayload::Audio(_) => "audio",
        }
    }
}

/// A generated artifact as returned by the backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationSuccess {
    /// Client-assigned artifact id
    pub artifact_id: ArtifactId,
    /// Normalized source text
    pub source_text: String,
    /// Absolute media URL
    pub media_url: String,
}

/// Classification of a failed attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The request never produced an HTTP response
    Network,
    /// The service answered with a non-2xx status
    Http,
    /// The service answered `success: false` (or an unusable body)
    Application,
}

/// A failed generation attempt
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationFailure {
    /// Failure class
    pub kind: FailureKind,
    /// Human-readable description
    pub message: String,
    /// HTTP status, for [`FailureKind::Http`]
    pub status: Option<u16>,
}

impl GenerationFailure {
    /// Fallback text when the service gives no reason
    pub const GENERIC_MESSAGE: &'static str = "Failed to generate animation";

    /// Transport failure
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Network,
            message: message.into(),
            status: None,
        }
    }

    /// Non-2xx response, with the service's own reason when it gave one
    #[must_use]
    pub fn http(status: u16, detail: Option<&str>) -> Self {
        let message = match detail {
            Some(detail) if !detail.trim().is_empty() => {
                format!("HTTP error! status: {status}: {detail}")
            }
            _ => format!("HTTP error! status: {status}"),
        };
        Self {
            kind: FailureKind::Http,
            message,
            status: Some(status),
        }
    }

    /// `success: false` response
    #[must_use]
    pub fn application(error: Option<&str>) -> Self {
        let message = error
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(Self::GENERIC_MESSAGE);
        Self {
            kind: FailureKind::Application,
            message: message.to_string(),
            status: None,
        }
    }

    /// Short status line for the capture indicator
    #[must_use]
    pub fn status_line(&self) -> String {
        match (self.kind, self.status) {
            (FailureKind::Network, _) => "Network error".to_string(),
            (FailureKind::Http, Some(status)) => format!("Server error (HTTP {status})"),
            (FailureKind::Http, None) => "Server error".to_string(),
            (FailureKind::Application, _) => self.message.clone(),
        }
    }
}

/// Generation backend trait
///
/// Implement this to plug in a different transport.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Check whether the service is reachable
    async fn health_check(&self) -> bool;

    /// Make one generation attempt
    async fn submit(&self, input: GenerationInput) -> Result<GenerationSuccess, GenerationFailure>;
}
