//! Capture Session Types
//!
//! State of the single capture attempt the controller is running.

use serde::{Deserialize, Serialize};

use crate::backend::Mode;

/// Where the capture session is in its lifecycle
///
/// Voice path: `Idle -> AwaitingPermission -> Recording -> Processing -> Succeeded|Failed -> Idle`.
/// Text path: `Idle -> Processing -> Succeeded|Failed -> Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// Nothing happening
    #[default]
    Idle,
    /// Waiting for the user/platform to grant microphone access
    AwaitingPermission,
    /// Collecting audio
    Recording,
    /// Waiting for the generation service
    Processing,
    /// Last attempt produced an artifact
    Succeeded,
    /// Last attempt failed
    Failed,
}

impl CaptureStatus {
    /// Whether a new session must be refused
    ///
    /// This is the single busy flag shared by the voice and text paths.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::AwaitingPermission | Self::Recording | Self::Processing
        )
    }

    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AwaitingPermission => "Waiting for microphone",
            Self::Recording => "Recording",
            Self::Processing => "Generating",
            Self::Succeeded => "Ready",
            Self::Failed => "Failed",
        }
    }
}

/// Snapshot of the capture session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSession {
    /// Lifecycle position
    pub status: CaptureStatus,
    /// Mode the next request will use
    pub mode: Mode,
    /// Whole seconds spent recording
    pub elapsed_seconds: u32,
}

impl CaptureSession {
    /// Idle session in the given mode
    #[must_use]
    pub fn idle(mode: Mode) -> Self {
        Self {
            status: CaptureStatus::Idle,
            mode,
            elapsed_seconds: 0,
        }
    }

    /// Elapsed recording time as `mm:ss`
    #[must_use]
    pub fn elapsed_display(&self) -> String {
        let mins = self.elapsed_seconds / 60;
        let secs = self.elapsed_seconds % 60;
        format!("{mins:02}:{secs:02}")
    }
}
