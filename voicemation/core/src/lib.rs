//! Voicemation Core - Headless Voice-to-Animation Orchestration
//!
//! This crate turns a spoken or typed concept into a generated animation and
//! keeps the conversation around it consistent. It has no UI dependencies and
//! can drive a terminal, a web page, or a test harness.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          View Layer                            │
//! │        ┌─────────┐     ┌──────────┐     ┌──────────────┐       │
//! │        │   CLI   │     │ Web page │     │ Test harness │       │
//! │        └────┬────┘     └────┬─────┘     └──────┬───────┘       │
//! │             └───────────────┴──────────────────┘               │
//! │                    ViewEvent (up)                              │
//! │                  StudioMessage (down)                          │
//! └─────────────────────────────┼─────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┼─────────────────────────────────┐
//! │                      VOICEMATION CORE                          │
//! │  ┌──────────────────────────┴──────────────────────────────┐   │
//! │  │                         Studio                           │   │
//! │  │  ┌──────────┐  ┌────────────┐  ┌──────────┐  ┌────────┐  │   │
//! │  │  │ Capture  │─►│ Generation │  │ Artifact │  │Playback│  │   │
//! │  │  │Controller│  │   Client   │  │ Registry │  │ Coord. │  │   │
//! │  │  └────┬─────┘  └────────────┘  └────▲─────┘  └───┬────┘  │   │
//! │  │       └─────────► Conversation ◄────┘            │       │   │
//! │  │                      Store  ◄────────────────────┘       │   │
//! │  └──────────────────────────────────────────────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Studio`]: owns every component and runs the event loop
//! - [`CaptureController`]: recording/text sessions, one at a time
//! - [`GenerationClient`]: the HTTP generation service
//! - [`ConversationStore`]: append-only transcript
//! - [`ArtifactRegistry`]: write-once artifact lookup
//! - [`PlaybackCoordinator`]: fullscreen playback and highlight correlation
//!
//! # Quick Start
//!
//! ```ignore
//! use voicemation_core::{FileMicrophone, GenerationClient, Studio, StudioConfig, ViewEvent};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StudioConfig::from_env();
//!     let (tx, mut rx) = mpsc::channel(config.message_capacity);
//!     let (events_tx, events_rx) = mpsc::channel(16);
//!
//!     let backend = GenerationClient::new(&config.base_url);
//!     let mut studio = Studio::new(backend, FileMicrophone::new("take.webm"), config, tx);
//!     studio.start().await?;
//!
//!     tokio::spawn(async move {
//!         while let Some(msg) = rx.recv().await {
//!             // render
//!         }
//!     });
//!
//!     events_tx.send(ViewEvent::SubmitText { text: "draw a circle".into() }).await?;
//!     studio.run(events_rx).await
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`artifacts`]: generated artifacts and their registry
//! - [`backend`]: generation service abstraction and HTTP client
//! - [`capture`]: capture session state machine and microphone sources
//! - [`config`]: timing and service configuration
//! - [`conversation`]: sidebar conversation list
//! - [`events`]: events from the view to the studio
//! - [`messages`]: identifiers, transcript entries, messages to the view
//! - [`playback`]: inline/fullscreen playback and highlight correlation
//! - [`studio`]: the orchestrator
//! - [`transcript`]: the conversation transcript

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod artifacts;
pub mod backend;
pub mod capture;
pub mod config;
pub mod conversation;
pub mod events;
pub mod messages;
pub mod playback;
pub mod studio;
pub mod transcript;

pub use artifacts::{Artifact, ArtifactRegistry, RegistryError};
pub use backend::{
    AudioClip, FailureKind, GenerationBackend, GenerationClient, GenerationFailure,
    GenerationInput, GenerationPayload, GenerationSuccess, Mode,
};
pub use capture::{
    AudioCapture, CaptureController, CaptureError, CaptureSession, CaptureSignal, CaptureStatus,
    FileMicrophone, Microphone, PermissionError,
};
pub use config::StudioConfig;
pub use conversation::{ConversationId, ConversationList, ConversationSummary};
pub use events::{Key, ViewEvent};
pub use messages::{
    ArtifactId, Message, MessageId, MessageRole, NotifyLevel, StudioMessage,
};
pub use playback::{
    CloseReason, Highlight, PlaybackCoordinator, PlaybackError, PlaybackSignal, PlaybackState,
};
pub use studio::{Signal, Studio};
pub use transcript::ConversationStore;
