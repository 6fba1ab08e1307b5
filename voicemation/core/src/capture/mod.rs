//! Capture Controller
//!
//! Drives one capture session at a time: microphone recording or typed text,
//! then a single generation request, then the transcript and registry updates
//! for the result.
//!
//! # Scheduling
//!
//! Nothing here blocks the studio loop. Permission prompts, the one-second
//! recording clock, generation requests and status display delays all run as
//! spawned tasks that report back through [`CaptureSignal`]s, which the studio
//! feeds into [`CaptureController::on_signal`]. Every signal carries the
//! attempt number it belongs to; signals from an older attempt are ignored.
//!
//! # Ordering
//!
//! - The user message is appended before the request is dispatched.
//! - On success the artifact is registered before the assistant message that
//!   references it is appended.
//! - The assistant message is appended only once the response is classified.

mod microphone;
mod session;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use microphone::{AudioCapture, FileMicrophone, Microphone, PermissionError};
pub use session::{CaptureSession, CaptureStatus};

use crate::artifacts::{Artifact, ArtifactRegistry};
use crate::backend::{
    GenerationBackend, GenerationFailure, GenerationInput, GenerationSuccess, Mode,
};
use crate::config::StudioConfig;
use crate::messages::StudioMessage;
use crate::transcript::ConversationStore;

/// Status line while waiting for microphone access
pub const STATUS_REQUESTING: &str = "Requesting microphone access...";
/// Status line while recording
pub const STATUS_RECORDING: &str = "Recording...";
/// Status line while the request is in flight
pub const STATUS_GENERATING: &str = "Generating animation...";
/// Status line after a successful round trip
pub const STATUS_READY: &str = "Animation ready!";
/// Transcript text standing in for a spoken prompt
pub const VOICE_INPUT_LABEL: &str = "Voice Input";

/// Rejected capture request
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// Another session is recording or processing
    #[error("a capture session is already in progress")]
    Busy,
    /// Stop requested while not recording
    #[error("not recording")]
    NotRecording,
    /// Text was empty after trimming
    #[error("nothing to submit")]
    EmptyInput,
}

/// Completion reported by a capture background task
pub enum CaptureSignal {
    /// Microphone request answered
    PermissionResolved {
        /// Attempt the request belongs to
        attempt: u64,
        /// Granted capture or refusal
        result: Result<Box<dyn AudioCapture>, PermissionError>,
    },
    /// One second of recording elapsed
    Tick {
        /// Attempt the clock belongs to
        attempt: u64,
    },
    /// Generation request finished
    GenerationFinished {
        /// Attempt the request belongs to
        attempt: u64,
        /// Outcome
        result: Result<GenerationSuccess, GenerationFailure>,
    },
    /// Success/failure display delay elapsed
    StatusExpired {
        /// Attempt the delay belongs to
        attempt: u64,
    },
}

impl fmt::Debug for CaptureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionResolved { attempt, result } => f
                .debug_struct("PermissionResolved")
                .field("attempt", attempt)
                .field("granted", &result.is_ok())
                .finish(),
            Self::Tick { attempt } => f.debug_struct("Tick").field("attempt", attempt).finish(),
            Self::GenerationFinished { attempt, result } => f
                .debug_struct("GenerationFinished")
                .field("attempt", attempt)
                .field("result", result)
                .finish(),
            Self::StatusExpired { attempt } => f
                .debug_struct("StatusExpired")
                .field("attempt", attempt)
                .finish(),
        }
    }
}

/// Microphone held for the duration of a recording
struct ActiveRecording {
    capture: Box<dyn AudioCapture>,
    ticker: JoinHandle<()>,
    started_at: Instant,
}

/// Capture state machine
pub struct CaptureController {
    session: CaptureSession,
    status_message: Option<String>,
    attempt: u64,
    recording: Option<ActiveRecording>,
    reset_timer: Option<JoinHandle<()>>,
    backend: Arc<dyn GenerationBackend>,
    microphone: Arc<dyn Microphone>,
    transcript: ConversationStore,
    artifacts: ArtifactRegistry,
    success_display: Duration,
    failure_display: Duration,
    tx: mpsc::Sender<StudioMessage>,
    signals: mpsc::UnboundedSender<CaptureSignal>,
}

impl CaptureController {
    /// Create a controller and the receiver for its background signals
    pub fn new(
        config: &StudioConfig,
        backend: Arc<dyn GenerationBackend>,
        microphone: Arc<dyn Microphone>,
        transcript: ConversationStore,
        artifacts: ArtifactRegistry,
        tx: mpsc::Sender<StudioMessage>,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureSignal>) {
        let (signals, signals_rx) = mpsc::unbounded_channel();
        let controller = Self {
            session: CaptureSession::idle(config.default_mode),
            status_message: None,
            attempt: 0,
            recording: None,
            reset_timer: None,
            backend,
            microphone,
            transcript,
            artifacts,
            success_display: config.success_display,
            failure_display: config.failure_display,
            tx,
            signals,
        };
        (controller, signals_rx)
    }

    /// Current session snapshot
    #[must_use]
    pub fn session(&self) -> CaptureSession {
        self.session
    }

    /// User-visible status line
    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Whether a recording or request is in progress
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.session.status.is_busy()
    }

    /// Ask for the microphone and start recording once granted
    ///
    /// # Errors
    ///
    /// [`CaptureError::Busy`] if a session is already running; nothing changes.
    pub async fn start_recording(&mut self) -> Result<(), CaptureError> {
        if self.is_busy() {
            return Err(CaptureError::Busy);
        }

        self.begin_attempt();
        self.session.status = CaptureStatus::AwaitingPermission;
        self.status_message = Some(STATUS_REQUESTING.to_string());
        self.publish().await;

        let microphone = Arc::clone(&self.microphone);
        let signals = self.signals.clone();
        let attempt = self.attempt;
        tokio::spawn(async move {
            let result = microphone.acquire().await;
            // If the studio is gone the capture is dropped here, releasing the device
            let _ = signals.send(CaptureSignal::PermissionResolved { attempt, result });
        });

        Ok(())
    }

    /// Stop recording and submit the audio
    ///
    /// # Errors
    ///
    /// [`CaptureError::NotRecording`] unless a recording is running.
    pub async fn stop_recording(&mut self) -> Result<(), CaptureError> {
        if self.session.status != CaptureStatus::Recording {
            return Err(CaptureError::NotRecording);
        }
        let recording = self.recording.take().ok_or(CaptureError::NotRecording)?;

        recording.ticker.abort();
        let clip = recording.capture.finish();
        tracing::info!(
            bytes = clip.len(),
            elapsed_seconds = self.session.elapsed_seconds,
            wall_ms = recording.started_at.elapsed().as_millis() as u64,
            "Recording stopped"
        );

        self.session.status = CaptureStatus::Processing;
        let input = GenerationInput::audio(clip, self.session.mode);
        self.dispatch(input, VOICE_INPUT_LABEL).await;
        Ok(())
    }

    /// Submit a typed prompt
    ///
    /// # Errors
    ///
    /// [`CaptureError::Busy`] while a session is running, [`CaptureError::EmptyInput`]
    /// for blank text. Neither changes any state.
    pub async fn submit_text(&mut self, text: &str) -> Result<(), CaptureError> {
        if self.is_busy() {
            return Err(CaptureError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(CaptureError::EmptyInput);
        }

        self.begin_attempt();
        self.session.status = CaptureStatus::Processing;
        let input = GenerationInput::text(text, self.session.mode);
        self.dispatch(input, text).await;
        Ok(())
    }

    /// Select the mode for the next request
    ///
    /// # Errors
    ///
    /// [`CaptureError::Busy`] while recording or processing.
    pub async fn set_mode(&mut self, mode: Mode) -> Result<(), CaptureError> {
        if self.is_busy() {
            return Err(CaptureError::Busy);
        }
        if self.session.mode != mode {
            self.session.mode = mode;
            tracing::info!(mode = %mode, "Mode changed");
            self.publish().await;
        }
        Ok(())
    }

    /// Flip between standard and extended mode
    ///
    /// # Errors
    ///
    /// [`CaptureError::Busy`] while recording or processing.
    pub async fn toggle_mode(&mut self) -> Result<(), CaptureError> {
        self.set_mode(self.session.mode.toggled()).await
    }

    /// Apply a background completion
    ///
    /// Returns the artifact when a round trip just succeeded.
    pub async fn on_signal(&mut self, signal: CaptureSignal) -> Option<Artifact> {
        match signal {
            CaptureSignal::PermissionResolved { attempt, result } => {
                self.on_permission(attempt, result).await;
                None
            }
            CaptureSignal::Tick { attempt } => {
                if attempt == self.attempt && self.session.status == CaptureStatus::Recording {
                    self.session.elapsed_seconds += 1;
                    self.publish().await;
                }
                None
            }
            CaptureSignal::GenerationFinished { attempt, result } => {
                self.on_generation_finished(attempt, result).await
            }
            CaptureSignal::StatusExpired { attempt } => {
                if attempt == self.attempt
                    && matches!(
                        self.session.status,
                        CaptureStatus::Succeeded | CaptureStatus::Failed
                    )
                {
                    self.session.status = CaptureStatus::Idle;
                    self.session.elapsed_seconds = 0;
                    self.status_message = None;
                    self.publish().await;
                }
                None
            }
        }
    }

    /// Release the microphone and stop all timers
    ///
    /// An in-flight generation request is not cancelled; its result is dropped.
    pub fn shutdown(&mut self) {
        if let Some(recording) = self.recording.take() {
            recording.ticker.abort();
            drop(recording.capture);
            tracing::info!("Recording discarded on shutdown");
        }
        if let Some(timer) = self.reset_timer.take() {
            timer.abort();
        }
    }

    async fn on_permission(
        &mut self,
        attempt: u64,
        result: Result<Box<dyn AudioCapture>, PermissionError>,
    ) {
        if attempt != self.attempt || self.session.status != CaptureStatus::AwaitingPermission {
            tracing::debug!(attempt, "Ignoring stale microphone grant");
            return;
        }

        match result {
            Ok(capture) => {
                self.session.status = CaptureStatus::Recording;
                self.session.elapsed_seconds = 0;
                self.status_message = Some(STATUS_RECORDING.to_string());
                let ticker = self.spawn_ticker(attempt);
                self.recording = Some(ActiveRecording {
                    capture,
                    ticker,
                    started_at: Instant::now(),
                });
                tracing::info!(attempt, mode = %self.session.mode, "Recording started");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Microphone access failed");
                self.session.status = CaptureStatus::Idle;
                self.status_message = Some(e.to_string());
            }
        }
        self.publish().await;
    }

    async fn on_generation_finished(
        &mut self,
        attempt: u64,
        result: Result<GenerationSuccess, GenerationFailure>,
    ) -> Option<Artifact> {
        if attempt != self.attempt || self.session.status != CaptureStatus::Processing {
            tracing::warn!(attempt, current = self.attempt, "Ignoring stale generation result");
            return None;
        }

        let success = match result {
            Ok(success) => success,
            Err(failure) => {
                self.record_failure(&failure.message, failure.status_line())
                    .await;
                return None;
            }
        };

        let artifact = Artifact::new(success.artifact_id, success.source_text, success.media_url);
        if let Err(e) = self.artifacts.put(artifact.clone()) {
            self.record_failure(&e.to_string(), "Error occurred".to_string())
                .await;
            return None;
        }

        let content = format!(
            "I've created an educational animation based on your concept: \"{}\"",
            artifact.source_text
        );
        let message = self.transcript.append_assistant(content, Some(&artifact));
        self.send(StudioMessage::MessageAppended { message }).await;

        self.settle(CaptureStatus::Succeeded, STATUS_READY.to_string(), self.success_display)
            .await;
        Some(artifact)
    }

    async fn record_failure(&mut self, reason: &str, status_line: String) {
        let content = format!("I couldn't create that animation. Error: {reason}");
        let message = self.transcript.append_assistant(content, None);
        self.send(StudioMessage::MessageAppended { message }).await;

        self.settle(CaptureStatus::Failed, status_line, self.failure_display)
            .await;
    }

    /// Enter a terminal status and schedule the return to idle
    async fn settle(&mut self, status: CaptureStatus, message: String, display: Duration) {
        self.session.status = status;
        self.status_message = Some(message);
        self.publish().await;

        let signals = self.signals.clone();
        let attempt = self.attempt;
        self.reset_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(display).await;
            let _ = signals.send(CaptureSignal::StatusExpired { attempt });
        }));
    }

    /// Append the user's message and send the request
    async fn dispatch(&mut self, input: GenerationInput, user_content: &str) {
        let message = self.transcript.append_user(user_content);
        self.send(StudioMessage::MessageAppended { message }).await;

        self.status_message = Some(STATUS_GENERATING.to_string());
        self.publish().await;

        let backend = Arc::clone(&self.backend);
        let signals = self.signals.clone();
        let attempt = self.attempt;
        tracing::debug!(attempt, backend = backend.name(), kind = input.kind(), "Dispatching request");
        tokio::spawn(async move {
            let result = backend.submit(input).await;
            let _ = signals.send(CaptureSignal::GenerationFinished { attempt, result });
        });
    }

    fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.session.elapsed_seconds = 0;
        if let Some(timer) = self.reset_timer.take() {
            timer.abort();
        }
    }

    fn spawn_ticker(&self, attempt: u64) -> JoinHandle<()> {
        let signals = self.signals.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if signals.send(CaptureSignal::Tick { attempt }).is_err() {
                    break;
                }
            }
        })
    }

    async fn publish(&self) {
        self.send(StudioMessage::CaptureUpdated {
            session: self.session,
            status_message: self.status_message.clone(),
        })
        .await;
    }

    async fn send(&self, msg: StudioMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to view: {}", e);
        }
    }
}
