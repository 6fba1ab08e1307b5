//! voicemation - turn spoken or typed concepts into educational animations
//!
//! Terminal driver for the voicemation studio. Talks to a running generation
//! service over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # One text round trip
//! voicemation submit "draw a circle"
//!
//! # One voice round trip from a recorded file, stopping after 3 seconds
//! voicemation record --audio-file take.webm --seconds 3 --in-depth
//!
//! # Interactive session, saving every animation
//! voicemation --save-dir ./animations chat
//!
//! # Machine-readable output
//! voicemation --json submit "a bouncing ball"
//! ```
//!
//! # Environment Variables
//!
//! - `VOICEMATION_BASE_URL`: service address (default: http://localhost:5001)
//! - `VOICEMATION_IN_DEPTH`: start in in-depth mode
//! - `RUST_LOG`: log level; logs go to stderr

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;

use voicemation_core::{
    FileMicrophone, GenerationClient, Microphone, Mode, Studio, StudioConfig, StudioMessage,
    ViewEvent,
};

mod repl;
mod view;

use repl::SwitchableMicrophone;
use view::{Session, View};

#[derive(Parser)]
#[command(name = "voicemation")]
#[command(about = "Turn spoken or typed concepts into educational animations")]
#[command(version)]
struct Cli {
    /// Generation service address
    #[arg(long, global = true, env = "VOICEMATION_BASE_URL")]
    base_url: Option<String>,

    /// Print studio messages as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Save generated animations into this directory
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an animation from text
    Submit {
        /// The concept to animate
        text: String,

        /// Ask for a longer, in-depth animation
        #[arg(long)]
        in_depth: bool,
    },

    /// Generate an animation from a recorded audio file
    Record {
        /// Recording to upload (webm, wav, ogg, mp3, m4a)
        #[arg(long)]
        audio_file: PathBuf,

        /// Seconds to "record" before stopping
        #[arg(long, default_value = "0")]
        seconds: u64,

        /// Ask for a longer, in-depth animation
        #[arg(long)]
        in_depth: bool,
    },

    /// Interactive session
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("voicemation=info".parse()?)
                .add_directive("voicemation_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let mut config = StudioConfig::from_env();
    if let Some(base_url) = &cli.base_url {
        config.base_url.clone_from(base_url);
    }

    if let Some(dir) = &cli.save_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let (event_tx, event_rx) = mpsc::channel::<ViewEvent>(32);
    let (microphone, first_event, session) = match cli.command {
        Commands::Submit { text, in_depth } => {
            if text.trim().is_empty() {
                anyhow::bail!("Nothing to submit");
            }
            if in_depth {
                config.default_mode = Mode::Extended;
            }
            (
                Arc::new(SwitchableMicrophone::default()) as Arc<dyn Microphone>,
                Some(ViewEvent::SubmitText { text }),
                Session::OneShot { stop_after: None },
            )
        }
        Commands::Record {
            audio_file,
            seconds,
            in_depth,
        } => {
            if in_depth {
                config.default_mode = Mode::Extended;
            }
            (
                Arc::new(FileMicrophone::new(audio_file)) as Arc<dyn Microphone>,
                Some(ViewEvent::StartRecording),
                Session::OneShot {
                    stop_after: Some(Duration::from_secs(seconds)),
                },
            )
        }
        Commands::Chat => {
            let microphone = SwitchableMicrophone::default();
            let reader_mic = microphone.clone();
            let reader_tx = event_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = repl::read_input(reader_mic, reader_tx).await {
                    tracing::warn!(error = %e, "Input reader stopped");
                }
            });
            (
                Arc::new(microphone) as Arc<dyn Microphone>,
                None,
                Session::Interactive,
            )
        }
    };

    info!(base_url = %config.base_url, mode = %config.default_mode, "Starting voicemation");

    let client = GenerationClient::new(&config.base_url);
    let (msg_tx, msg_rx) = mpsc::channel::<StudioMessage>(config.message_capacity);

    let view = View::new(cli.json, cli.save_dir, client.clone(), event_tx.clone(), session);
    let view_task = tokio::spawn(view.run(msg_rx));

    let mut studio = Studio::with_shared(Arc::new(client), microphone, config, msg_tx);
    studio.start().await?;

    // Ctrl+C goes through the same shutdown path as /quit
    let shutdown_tx = event_tx.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            let _ = shutdown_tx.send(ViewEvent::Shutdown).await;
        }
    });

    if let Some(event) = first_event {
        event_tx.send(event).await.context("Studio stopped early")?;
    }
    drop(event_tx);

    studio.run(event_rx).await?;
    drop(studio);

    let outcome = view_task.await.context("View task failed")??;
    if outcome.failed {
        anyhow::bail!("Animation was not generated");
    }
    Ok(())
}
