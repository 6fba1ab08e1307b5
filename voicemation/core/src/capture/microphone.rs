//! Microphone Access
//!
//! Audio sources the capture controller records from.
//!
//! A [`Microphone`] hands out an exclusive [`AudioCapture`] once access is
//! granted. The capture holds the device until it is finished or dropped;
//! implementations must release the device in both cases so that no path
//! (stop, success, failure, shutdown) leaks it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::backend::AudioClip;

/// Microphone access failure
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
    /// The user or platform refused access
    #[error("Microphone access denied")]
    Denied,
    /// No usable input device
    #[error("Microphone unavailable: {0}")]
    Unavailable(String),
}

/// An audio input device
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Request exclusive access and start collecting audio
    async fn acquire(&self) -> Result<Box<dyn AudioCapture>, PermissionError>;
}

/// An in-progress recording
pub trait AudioCapture: Send {
    /// Stop collecting audio, release the device and return the recording
    fn finish(self: Box<Self>) -> AudioClip;
}

/// Microphone that "records" a pre-recorded container file
///
/// Used by the command-line driver, where there is no browser capture API.
#[derive(Clone, Debug)]
pub struct FileMicrophone {
    path: PathBuf,
}

impl FileMicrophone {
    /// Play back the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path being played back
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Microphone for FileMicrophone {
    async fn acquire(&self) -> Result<Box<dyn AudioCapture>, PermissionError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                PermissionError::Denied
            } else {
                PermissionError::Unavailable(format!("{}: {e}", self.path.display()))
            }
        })?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Opened recording file");
        Ok(Box::new(FileCapture {
            clip: clip_for(&self.path, bytes),
        }))
    }
}

/// Recording backed by file contents
struct FileCapture {
    clip: AudioClip,
}

impl AudioCapture for FileCapture {
    fn finish(self: Box<Self>) -> AudioClip {
        self.clip
    }
}

/// Build a clip whose name and MIME type follow the file extension
fn clip_for(path: &Path, bytes: Vec<u8>) -> AudioClip {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mime_type = match extension.as_str() {
        "webm" => "audio/webm",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        _ => return AudioClip::webm(bytes),
    };

    AudioClip {
        bytes,
        file_name: format!("recording.{extension}"),
        mime_type: mime_type.to_string(),
    }
}
