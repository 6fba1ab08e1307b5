//! Playback Coordinator
//!
//! Inline vs fullscreen viewing of generated artifacts, and highlight
//! correlation back to the transcript entry that produced them.
//!
//! # Highlight correlation
//!
//! Closing fullscreen playback reveals the originating message right away,
//! then emphasizes it once the view has had time to scroll:
//!
//! ```text
//! close() ──► RevealMessage ──(settle)──► HighlightChanged(Some) ──(duration)──► HighlightChanged(None)
//! ```
//!
//! The highlight is plain state with an expiry time. Views render it; they
//! never have to find or mutate anything themselves. Each correlation bumps an
//! epoch so that timers from an earlier one cannot clear a later highlight.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::artifacts::{Artifact, ArtifactRegistry};
use crate::config::StudioConfig;
use crate::events::Key;
use crate::messages::{ArtifactId, MessageId, StudioMessage};
use crate::transcript::ConversationStore;

/// Fullscreen playback state
///
/// `is_fullscreen` implies `active_artifact_id` is set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Artifact being played
    pub active_artifact_id: Option<ArtifactId>,
    /// Whether the fullscreen player is shown
    pub is_fullscreen: bool,
}

impl PlaybackState {
    /// Fullscreen playback of `id`
    #[must_use]
    pub fn fullscreen(id: ArtifactId) -> Self {
        Self {
            active_artifact_id: Some(id),
            is_fullscreen: true,
        }
    }
}

/// What triggered a close
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// The player's close control
    Control,
    /// Escape key
    Escape,
    /// "Return to chat" action
    ReturnToChat,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control => write!(f, "control"),
            Self::Escape => write!(f, "escape"),
            Self::ReturnToChat => write!(f, "return-to-chat"),
        }
    }
}

/// Transient emphasis of a transcript entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// Entry to emphasize
    pub message_id: MessageId,
    /// Artifact that entry produced
    pub artifact_id: ArtifactId,
    /// When the emphasis ends
    pub expires_at: DateTime<Utc>,
}

impl Highlight {
    /// Whether the emphasis should still be drawn at `now`
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Playback request that could not be honored
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// No artifact with that id has been generated
    #[error("unknown artifact: {0}")]
    UnknownArtifact(ArtifactId),
}

/// Timer completion reported back to the coordinator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackSignal {
    /// Scroll settle delay elapsed; start emphasis
    SettleElapsed {
        /// Correlation the timer belongs to
        epoch: u64,
        /// Artifact being correlated
        artifact_id: ArtifactId,
        /// Entry to emphasize
        message_id: MessageId,
    },
    /// Emphasis duration elapsed
    HighlightExpired {
        /// Correlation the timer belongs to
        epoch: u64,
    },
}

/// Playback coordinator
pub struct PlaybackCoordinator {
    state: PlaybackState,
    inline: Option<ArtifactId>,
    highlight: Option<Highlight>,
    epoch: u64,
    timer: Option<JoinHandle<()>>,
    settle: Duration,
    duration: Duration,
    artifacts: ArtifactRegistry,
    transcript: ConversationStore,
    tx: mpsc::Sender<StudioMessage>,
    signals: mpsc::UnboundedSender<PlaybackSignal>,
}

impl PlaybackCoordinator {
    /// Create a coordinator and the receiver for its timer signals
    pub fn new(
        config: &StudioConfig,
        artifacts: ArtifactRegistry,
        transcript: ConversationStore,
        tx: mpsc::Sender<StudioMessage>,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackSignal>) {
        let (signals, signals_rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            state: PlaybackState::default(),
            inline: None,
            highlight: None,
            epoch: 0,
            timer: None,
            settle: config.highlight_settle,
            duration: config.highlight_duration,
            artifacts,
            transcript,
            tx,
            signals,
        };
        (coordinator, signals_rx)
    }

    /// Current fullscreen state
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Artifact shown inline below the transcript
    #[must_use]
    pub fn inline(&self) -> Option<ArtifactId> {
        self.inline
    }

    /// Current emphasis, if any
    #[must_use]
    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    /// Show a freshly generated artifact inline
    pub async fn present_inline(&mut self, artifact: &Artifact) {
        self.inline = Some(artifact.id);
        self.send(StudioMessage::ArtifactReady {
            artifact: artifact.clone(),
        })
        .await;
    }

    /// Dismiss the inline artifact
    pub async fn clear_inline(&mut self) {
        if self.inline.take().is_some() {
            self.send(StudioMessage::InlineCleared).await;
        }
    }

    /// Play an artifact fullscreen
    ///
    /// # Errors
    ///
    /// [`PlaybackError::UnknownArtifact`] if the registry has no such artifact.
    pub async fn open_fullscreen(&mut self, artifact_id: ArtifactId) -> Result<(), PlaybackError> {
        if !self.artifacts.contains(&artifact_id) {
            return Err(PlaybackError::UnknownArtifact(artifact_id));
        }

        self.state = PlaybackState::fullscreen(artifact_id);
        tracing::info!(artifact = %artifact_id, "Fullscreen playback opened");
        self.send(StudioMessage::PlaybackChanged { state: self.state })
            .await;
        Ok(())
    }

    /// Close fullscreen playback
    ///
    /// Every close path ends here. Returns false when nothing was open; in
    /// that case nothing is emitted and no highlight starts.
    pub async fn close(&mut self, reason: CloseReason) -> bool {
        let Some(previous) = self.state.active_artifact_id else {
            tracing::debug!(%reason, "Close ignored, nothing playing");
            return false;
        };

        self.state = PlaybackState::default();
        tracing::info!(artifact = %previous, %reason, "Fullscreen playback closed");
        self.send(StudioMessage::PlaybackChanged { state: self.state })
            .await;

        self.correlate(previous).await;
        true
    }

    /// Route a key press; only Escape while fullscreen does anything
    pub async fn handle_key(&mut self, key: Key) -> bool {
        if key == Key::Escape && self.state.is_fullscreen {
            self.close(CloseReason::Escape).await
        } else {
            false
        }
    }

    /// Leave playback entirely and give focus back to the input
    pub async fn return_to_chat(&mut self) {
        self.clear_inline().await;
        self.close(CloseReason::ReturnToChat).await;
        self.send(StudioMessage::FocusInput).await;
    }

    /// Apply a timer completion
    pub async fn on_signal(&mut self, signal: PlaybackSignal) {
        match signal {
            PlaybackSignal::SettleElapsed {
                epoch,
                artifact_id,
                message_id,
            } => {
                if epoch != self.epoch {
                    return;
                }

                let expires_at = Utc::now()
                    + chrono::Duration::from_std(self.duration).unwrap_or_else(|_| chrono::Duration::zero());
                let highlight = Highlight {
                    message_id,
                    artifact_id,
                    expires_at,
                };
                self.highlight = Some(highlight.clone());
                self.send(StudioMessage::HighlightChanged {
                    highlight: Some(highlight),
                })
                .await;

                self.schedule(self.duration, PlaybackSignal::HighlightExpired { epoch });
            }
            PlaybackSignal::HighlightExpired { epoch } => {
                if epoch == self.epoch && self.highlight.take().is_some() {
                    self.send(StudioMessage::HighlightChanged { highlight: None })
                        .await;
                }
            }
        }
    }

    /// Stop pending timers
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Reveal the entry that produced `artifact_id`, then emphasize it
    async fn correlate(&mut self, artifact_id: ArtifactId) {
        let Some(message) = self.transcript.find_by_artifact(&artifact_id) else {
            tracing::debug!(artifact = %artifact_id, "No transcript entry for artifact");
            return;
        };

        self.epoch += 1;
        self.send(StudioMessage::RevealMessage {
            message_id: message.id,
        })
        .await;

        self.schedule(
            self.settle,
            PlaybackSignal::SettleElapsed {
                epoch: self.epoch,
                artifact_id,
                message_id: message.id,
            },
        );
    }

    fn schedule(&mut self, delay: Duration, signal: PlaybackSignal) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let signals = self.signals.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = signals.send(signal);
        }));
    }

    async fn send(&self, msg: StudioMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to view: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Harness {
        playback: PlaybackCoordinator,
        signals: mpsc::UnboundedReceiver<PlaybackSignal>,
        view: mpsc::Receiver<StudioMessage>,
        artifact: Artifact,
        message_id: MessageId,
    }

    impl Harness {
        fn new() -> Self {
            let artifacts = ArtifactRegistry::new();
            let transcript = ConversationStore::new();
            transcript.append_user("draw a circle");
            let artifact = Artifact::new(ArtifactId::next(), "draw a circle", "http://host/out/1.mp4");
            artifacts.put(artifact.clone()).unwrap();
            let message = transcript.append_assistant("done", Some(&artifact));

            let (tx, view) = mpsc::channel(64);
            let (playback, signals) =
                PlaybackCoordinator::new(&StudioConfig::default(), artifacts, transcript, tx);
            Self {
                playback,
                signals,
                view,
                artifact,
                message_id: message.id,
            }
        }

        fn drain(&mut self) -> Vec<StudioMessage> {
            let mut out = Vec::new();
            while let Ok(msg) = self.view.try_recv() {
                out.push(msg);
            }
            out
        }

        async fn pump(&mut self) {
            let signal = self.signals.recv().await.unwrap();
            self.playback.on_signal(signal).await;
        }
    }

    fn reveals(messages: &[StudioMessage]) -> usize {
        messages
            .iter()
            .filter(|m| matches!(m, StudioMessage::RevealMessage { .. }))
            .count()
    }

    #[tokio::test]
    async fn test_open_unknown_artifact() {
        let mut h = Harness::new();
        let missing = ArtifactId(1);
        assert_eq!(
            h.playback.open_fullscreen(missing).await,
            Err(PlaybackError::UnknownArtifact(missing))
        );
        assert_eq!(h.playback.state(), PlaybackState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_twice_highlights_once() {
        let mut h = Harness::new();
        h.playback.open_fullscreen(h.artifact.id).await.unwrap();
        assert_eq!(h.playback.state(), PlaybackState::fullscreen(h.artifact.id));

        assert!(h.playback.close(CloseReason::Control).await);
        let first_state = h.playback.state();
        assert!(!h.playback.close(CloseReason::Control).await);

        assert_eq!(h.playback.state(), first_state);
        assert_eq!(first_state, PlaybackState::default());

        let messages = h.drain();
        assert_eq!(reveals(&messages), 1);
        assert!(messages.contains(&StudioMessage::RevealMessage {
            message_id: h.message_id
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_starts_after_settle_and_expires() {
        let mut h = Harness::new();
        h.playback.open_fullscreen(h.artifact.id).await.unwrap();
        h.playback.close(CloseReason::Control).await;
        assert!(h.playback.highlight().is_none());

        let closed_at = tokio::time::Instant::now();
        h.pump().await;
        assert!(closed_at.elapsed() >= Duration::from_millis(300));

        let highlight = h.playback.highlight().cloned().unwrap();
        assert_eq!(highlight.message_id, h.message_id);
        assert_eq!(highlight.artifact_id, h.artifact.id);

        h.pump().await;
        assert!(h.playback.highlight().is_none());
        assert!(closed_at.elapsed() >= Duration::from_millis(2300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_only_while_fullscreen() {
        let mut h = Harness::new();
        assert!(!h.playback.handle_key(Key::Escape).await);

        h.playback.open_fullscreen(h.artifact.id).await.unwrap();
        assert!(!h.playback.handle_key(Key::Enter).await);
        assert!(h.playback.state().is_fullscreen);

        assert!(h.playback.handle_key(Key::Escape).await);
        assert!(!h.playback.state().is_fullscreen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_to_chat() {
        let mut h = Harness::new();
        let artifact = h.artifact.clone();
        h.playback.present_inline(&artifact).await;
        h.playback.open_fullscreen(artifact.id).await.unwrap();
        h.drain();

        h.playback.return_to_chat().await;

        assert_eq!(h.playback.inline(), None);
        assert_eq!(h.playback.state(), PlaybackState::default());
        let messages = h.drain();
        assert_eq!(messages.first(), Some(&StudioMessage::InlineCleared));
        assert_eq!(messages.last(), Some(&StudioMessage::FocusInput));
        assert_eq!(reveals(&messages), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_to_chat_without_playback_still_focuses() {
        let mut h = Harness::new();
        h.playback.return_to_chat().await;
        assert_eq!(h.drain(), vec![StudioMessage::FocusInput]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_during_highlight_keeps_latest() {
        let mut h = Harness::new();
        h.playback.open_fullscreen(h.artifact.id).await.unwrap();
        h.playback.close(CloseReason::Control).await;
        h.pump().await;
        assert!(h.playback.highlight().is_some());

        // Second correlation supersedes the first; its timer replaces the old one
        h.playback.open_fullscreen(h.artifact.id).await.unwrap();
        h.playback.close(CloseReason::Escape).await;
        h.pump().await;
        let highlight = h.playback.highlight().cloned().unwrap();
        assert!(highlight.is_active_at(Utc::now()));

        h.pump().await;
        assert!(h.playback.highlight().is_none());
    }

    #[test]
    fn test_highlight_expiry_check() {
        let now = Utc::now();
        let highlight = Highlight {
            message_id: MessageId(1),
            artifact_id: ArtifactId(2),
            expires_at: now + chrono::Duration::seconds(2),
        };
        assert!(highlight.is_active_at(now));
        assert!(!highlight.is_active_at(now + chrono::Duration::seconds(3)));
    }
}
