//! Studio - The Orchestration Core
//!
//! The studio wires capture, generation, the transcript, the artifact registry
//! and playback together, and is the single writer of all of them.
//!
//! # Design Philosophy
//!
//! The studio is view-agnostic. A terminal, a web page or a test harness talk
//! to it the same way:
//! - `ViewEvent`: what the user did, received FROM the view
//! - `StudioMessage`: what to render, sent TO the view
//!
//! Background work (microphone prompts, requests, timers) reports back through
//! internal signal channels, so every state change happens on the studio's own
//! task, one at a time.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::artifacts::ArtifactRegistry;
use crate::backend::GenerationBackend;
use crate::capture::{CaptureController, CaptureSignal, Microphone};
use crate::config::StudioConfig;
use crate::conversation::ConversationList;
use crate::events::ViewEvent;
use crate::messages::{NotifyLevel, StudioMessage};
use crate::playback::{CloseReason, PlaybackCoordinator, PlaybackSignal};
use crate::transcript::ConversationStore;

/// Internal completion waiting to be applied
#[derive(Debug)]
pub enum Signal {
    /// From the capture controller's background tasks
    Capture(CaptureSignal),
    /// From the playback coordinator's timers
    Playback(PlaybackSignal),
}

/// The studio
pub struct Studio {
    config: StudioConfig,
    backend: Arc<dyn GenerationBackend>,
    capture: CaptureController,
    capture_signals: mpsc::UnboundedReceiver<CaptureSignal>,
    playback: PlaybackCoordinator,
    playback_signals: mpsc::UnboundedReceiver<PlaybackSignal>,
    transcript: ConversationStore,
    artifacts: ArtifactRegistry,
    conversations: ConversationList,
    tx: mpsc::Sender<StudioMessage>,
    shut_down: bool,
}

impl Studio {
    /// Create a new studio
    pub fn new<B, M>(
        backend: B,
        microphone: M,
        config: StudioConfig,
        tx: mpsc::Sender<StudioMessage>,
    ) -> Self
    where
        B: GenerationBackend + 'static,
        M: Microphone + 'static,
    {
        Self::with_shared(Arc::new(backend), Arc::new(microphone), config, tx)
    }

    /// Create a studio from already shared backend and microphone handles
    pub fn with_shared(
        backend: Arc<dyn GenerationBackend>,
        microphone: Arc<dyn Microphone>,
        config: StudioConfig,
        tx: mpsc::Sender<StudioMessage>,
    ) -> Self {
        let transcript = ConversationStore::new();
        let artifacts = ArtifactRegistry::new();

        let (capture, capture_signals) = CaptureController::new(
            &config,
            Arc::clone(&backend),
            microphone,
            transcript.clone(),
            artifacts.clone(),
            tx.clone(),
        );
        let (playback, playback_signals) =
            PlaybackCoordinator::new(&config, artifacts.clone(), transcript.clone(), tx.clone());

        Self {
            config,
            backend,
            capture,
            capture_signals,
            playback,
            playback_signals,
            transcript,
            artifacts,
            conversations: ConversationList::new(),
            tx,
            shut_down: false,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// Read handle on the transcript
    #[must_use]
    pub fn transcript(&self) -> &ConversationStore {
        &self.transcript
    }

    /// Read handle on the artifact registry
    #[must_use]
    pub fn artifacts(&self) -> &ArtifactRegistry {
        &self.artifacts
    }

    /// Capture controller
    #[must_use]
    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    /// Playback coordinator
    #[must_use]
    pub fn playback(&self) -> &PlaybackCoordinator {
        &self.playback
    }

    /// Conversation list
    #[must_use]
    pub fn conversations(&self) -> &ConversationList {
        &self.conversations
    }

    /// Probe the service and publish the initial state
    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.backend.health_check().await {
            tracing::info!(backend = self.backend.name(), base_url = %self.config.base_url, "Generation service reachable");
        } else {
            tracing::warn!(base_url = %self.config.base_url, "Generation service unreachable");
            self.notify(
                NotifyLevel::Warning,
                &format!(
                    "Generation service not reachable at {} - requests will fail until it is up",
                    self.config.base_url
                ),
            )
            .await;
        }

        self.publish_conversations().await;
        self.send(StudioMessage::CaptureUpdated {
            session: self.capture.session(),
            status_message: self.capture.status_message().map(str::to_string),
        })
        .await;

        Ok(())
    }

    /// Handle an event from the view
    pub async fn handle_event(&mut self, event: ViewEvent) -> anyhow::Result<()> {
        tracing::debug!(?event, "View event");
        match event {
            ViewEvent::StartRecording => {
                if let Err(e) = self.capture.start_recording().await {
                    self.reject(e).await;
                }
            }

            ViewEvent::StopRecording => {
                if let Err(e) = self.capture.stop_recording().await {
                    self.reject(e).await;
                }
            }

            ViewEvent::SubmitText { text } => {
                if let Err(e) = self.capture.submit_text(&text).await {
                    self.reject(e).await;
                }
            }

            ViewEvent::SetMode { mode } => {
                if let Err(e) = self.capture.set_mode(mode).await {
                    self.reject(e).await;
                }
            }

            ViewEvent::ToggleMode => {
                if let Err(e) = self.capture.toggle_mode().await {
                    self.reject(e).await;
                }
            }

            ViewEvent::OpenFullscreen { artifact_id } => {
                if let Err(e) = self.playback.open_fullscreen(artifact_id).await {
                    self.reject(e).await;
                }
            }

            ViewEvent::CloseFullscreen => {
                self.playback.close(CloseReason::Control).await;
            }

            ViewEvent::KeyPressed { key } => {
                self.playback.handle_key(key).await;
            }

            ViewEvent::ReturnToChat => {
                self.playback.return_to_chat().await;
            }

            ViewEvent::ClearInline => {
                self.playback.clear_inline().await;
            }

            ViewEvent::NewConversation => {
                self.conversations.new_conversation();
                self.publish_conversations().await;
            }

            ViewEvent::SelectConversation { id } => {
                if self.conversations.select(id) {
                    self.publish_conversations().await;
                } else {
                    self.reject(format!("unknown conversation: {id}")).await;
                }
            }

            ViewEvent::Shutdown => {
                self.shutdown().await?;
            }
        }

        Ok(())
    }

    /// Wait for the next internal completion
    ///
    /// Returns `None` only if every signal source has gone away.
    pub async fn next_signal(&mut self) -> Option<Signal> {
        tokio::select! {
            Some(signal) = self.capture_signals.recv() => Some(Signal::Capture(signal)),
            Some(signal) = self.playback_signals.recv() => Some(Signal::Playback(signal)),
            else => None,
        }
    }

    /// Apply an internal completion
    pub async fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Capture(signal) => {
                if let Some(artifact) = self.capture.on_signal(signal).await {
                    self.playback.present_inline(&artifact).await;
                }
            }
            Signal::Playback(signal) => self.playback.on_signal(signal).await,
        }
    }

    /// Run the event loop
    ///
    /// Returns after a `Shutdown` event or once the view drops its sender.
    pub async fn run(&mut self, mut events: mpsc::Receiver<ViewEvent>) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let stop = matches!(event, ViewEvent::Shutdown);
                        self.handle_event(event).await?;
                        if stop {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("View event channel closed");
                        self.shutdown().await?;
                        break;
                    }
                },
                Some(signal) = self.next_signal() => {
                    self.handle_signal(signal).await;
                }
            }
        }

        tracing::info!(messages = self.transcript.len(), artifacts = self.artifacts.len(), "Studio stopped");
        Ok(())
    }

    /// Release the microphone, stop timers and tell the view
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        self.capture.shutdown();
        self.playback.shutdown();
        self.send(StudioMessage::ShuttingDown).await;
        Ok(())
    }

    async fn publish_conversations(&self) {
        self.send(StudioMessage::ConversationsChanged {
            conversations: self.conversations.entries().to_vec(),
            active: self.conversations.active(),
        })
        .await;
    }

    /// Report a refused request without changing any state
    async fn reject(&self, reason: impl fmt::Display) {
        tracing::debug!(%reason, "Request rejected");
        self.notify(NotifyLevel::Warning, &reason.to_string()).await;
    }

    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(StudioMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    async fn send(&self, msg: StudioMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to view: {}", e);
        }
    }
}
