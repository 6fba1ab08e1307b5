//! Terminal view
//!
//! Renders studio messages to stdout, saves generated media when asked to, and
//! decides when a one-shot command is done.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;

use voicemation_core::{
    Artifact, CaptureSession, CaptureStatus, GenerationClient, MessageRole, NotifyLevel,
    StudioMessage, ViewEvent,
};

/// How the view drives the session
#[derive(Clone, Copy, Debug)]
pub enum Session {
    /// One round trip, then exit. Recordings stop after `stop_after`.
    OneShot { stop_after: Option<Duration> },
    /// Keep going until the user quits
    Interactive,
}

/// How a run ended
#[derive(Clone, Copy, Debug, Default)]
pub struct Outcome {
    /// Whether a one-shot round trip failed
    pub failed: bool,
}

pub struct View {
    json: bool,
    save_dir: Option<PathBuf>,
    client: GenerationClient,
    events: mpsc::Sender<ViewEvent>,
    session: Session,
    last_status: Option<String>,
    was_busy: bool,
    stop_scheduled: bool,
    outcome: Outcome,
}

impl View {
    pub fn new(
        json: bool,
        save_dir: Option<PathBuf>,
        client: GenerationClient,
        events: mpsc::Sender<ViewEvent>,
        session: Session,
    ) -> Self {
        Self {
            json,
            save_dir,
            client,
            events,
            session,
            last_status: None,
            was_busy: false,
            stop_scheduled: false,
            outcome: Outcome::default(),
        }
    }

    /// Consume studio messages until the studio shuts down
    pub async fn run(mut self, mut rx: mpsc::Receiver<StudioMessage>) -> anyhow::Result<Outcome> {
        while let Some(msg) = rx.recv().await {
            if self.json {
                println!("{}", serde_json::to_string(&msg)?);
            } else {
                self.render(&msg);
            }

            match msg {
                StudioMessage::CaptureUpdated { session, .. } => self.track(session).await,
                StudioMessage::ArtifactReady { artifact } => {
                    if let Err(e) = self.save(&artifact).await {
                        tracing::warn!(error = %e, "Failed to save animation");
                        eprintln!("! could not save animation {}: {e:#}", artifact.id);
                    }
                }
                StudioMessage::ShuttingDown => break,
                _ => {}
            }
        }

        Ok(self.outcome)
    }

    /// React to session changes: auto-stop recordings, finish one-shot runs
    async fn track(&mut self, session: CaptureSession) {
        let busy = session.status.is_busy();

        if let Session::OneShot { stop_after } = self.session {
            if session.status == CaptureStatus::Recording && !self.stop_scheduled {
                self.stop_scheduled = true;
                let delay = stop_after.unwrap_or_default();
                let events = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(ViewEvent::StopRecording).await;
                });
            }

            if self.was_busy && !busy {
                self.outcome.failed = session.status != CaptureStatus::Succeeded;
                let _ = self.events.send(ViewEvent::Shutdown).await;
            }
        }

        self.was_busy = busy;
    }

    async fn save(&self, artifact: &Artifact) -> anyhow::Result<()> {
        let Some(dir) = &self.save_dir else {
            return Ok(());
        };

        let dest = dir.join(artifact.file_name());
        let bytes = self
            .client
            .download_media(&artifact.media_url, &dest)
            .await
            .with_context(|| format!("Downloading {}", artifact.media_url))?;

        if !self.json {
            println!("  saved {} ({bytes} bytes)", dest.display());
        }
        Ok(())
    }

    fn render(&mut self, msg: &StudioMessage) {
        match msg {
            StudioMessage::MessageAppended { message } => {
                let who = match message.role {
                    MessageRole::User => "you",
                    MessageRole::Assistant => "studio",
                };
                println!("{who}> {}", message.content);
                if let (Some(id), Some(url)) = (message.artifact_id, &message.media_url) {
                    println!("  [{id}] {url}");
                }
            }
            StudioMessage::CaptureUpdated {
                session,
                status_message,
            } => {
                let line = match (session.status, status_message) {
                    (CaptureStatus::Recording, Some(text)) => {
                        Some(format!("{text} {}", session.elapsed_display()))
                    }
                    (_, Some(text)) => Some(text.clone()),
                    (_, None) => None,
                };
                if line.is_some() && line != self.last_status {
                    if let Some(text) = &line {
                        println!("[{text}] ({} mode)", session.mode);
                    }
                }
                self.last_status = line;
            }
            StudioMessage::ArtifactReady { artifact } => {
                println!("> animation {} ready: {}", artifact.id, artifact.media_url);
            }
            StudioMessage::InlineCleared => println!("(inline player closed)"),
            StudioMessage::PlaybackChanged { state } => match state.active_artifact_id {
                Some(id) if state.is_fullscreen => {
                    println!("> playing {id} fullscreen (/esc or /close to stop)");
                }
                _ => println!("(fullscreen closed)"),
            },
            StudioMessage::RevealMessage { message_id } => {
                tracing::debug!(message = %message_id, "Reveal");
            }
            StudioMessage::HighlightChanged { highlight } => {
                if let Some(highlight) = highlight {
                    println!("* message {} came from animation {}", highlight.message_id, highlight.artifact_id);
                }
            }
            StudioMessage::FocusInput => println!("> "),
            StudioMessage::ConversationsChanged {
                conversations,
                active,
            } => {
                for conversation in conversations {
                    let marker = if conversation.id == *active { '*' } else { ' ' };
                    println!("{marker} {} {}", conversation.id, conversation.title);
                }
            }
            StudioMessage::Notify { level, message } => match level {
                NotifyLevel::Info => println!("i {message}"),
                NotifyLevel::Warning => eprintln!("! {message}"),
                NotifyLevel::Error => eprintln!("!! {message}"),
            },
            StudioMessage::ShuttingDown => println!("bye"),
        }
    }
}
