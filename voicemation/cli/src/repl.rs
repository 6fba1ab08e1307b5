//! Chat REPL
//!
//! Line-oriented input for `voicemation chat`. Plain lines are prompts;
//! lines starting with `/` are commands.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use voicemation_core::{
    ArtifactId, AudioCapture, ConversationId, FileMicrophone, Key, Microphone, PermissionError,
    ViewEvent,
};

pub const HELP: &str = "\
Commands:
  <text>             generate an animation from text
  /record <path>     start recording from an audio file
  /stop              stop recording and generate
  /mode              toggle standard / in-depth mode
  /open <id>         play an animation fullscreen
  /close             close fullscreen playback
  /esc               press Escape
  /back              return to chat
  /new               start a new conversation
  /switch <id>       switch conversation
  /help              show this help
  /quit              exit";

/// A parsed input line
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Forward to the studio
    Event(ViewEvent),
    /// Select the recording source, then start recording
    Record(PathBuf),
    /// Print help
    Help,
    /// Nothing to do
    Empty,
}

/// Parse one input line
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Event(ViewEvent::SubmitText {
            text: line.to_string(),
        }));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let event = match name {
        "record" => {
            if arg.is_empty() {
                return Err("usage: /record <path>".to_string());
            }
            return Ok(Command::Record(PathBuf::from(arg)));
        }
        "help" | "?" => return Ok(Command::Help),
        "stop" => ViewEvent::StopRecording,
        "mode" => ViewEvent::ToggleMode,
        "open" => {
            let artifact_id = arg
                .parse::<ArtifactId>()
                .map_err(|_| "usage: /open <artifact-id>".to_string())?;
            ViewEvent::OpenFullscreen { artifact_id }
        }
        "close" => ViewEvent::CloseFullscreen,
        "esc" => ViewEvent::KeyPressed { key: Key::Escape },
        "back" => ViewEvent::ReturnToChat,
        "new" => ViewEvent::NewConversation,
        "switch" => {
            let id = arg
                .parse::<u32>()
                .map_err(|_| "usage: /switch <conversation-id>".to_string())?;
            ViewEvent::SelectConversation {
                id: ConversationId(id),
            }
        }
        "quit" | "exit" => ViewEvent::Shutdown,
        other => return Err(format!("unknown command: /{other} (try /help)")),
    };

    Ok(Command::Event(event))
}

/// Microphone whose source file is chosen per recording
#[derive(Clone, Default)]
pub struct SwitchableMicrophone {
    source: Arc<Mutex<Option<PathBuf>>>,
}

impl SwitchableMicrophone {
    /// Use `path` for the next recording
    pub fn select(&self, path: PathBuf) {
        *self.source.lock() = Some(path);
    }
}

#[async_trait]
impl Microphone for SwitchableMicrophone {
    async fn acquire(&self) -> Result<Box<dyn AudioCapture>, PermissionError> {
        let path = self.source.lock().clone().ok_or_else(|| {
            PermissionError::Unavailable("no recording selected, use /record <path>".to_string())
        })?;
        FileMicrophone::new(path).acquire().await
    }
}

/// Read stdin until EOF or `/quit`, forwarding events to the studio
pub async fn read_input(
    microphone: SwitchableMicrophone,
    events: mpsc::Sender<ViewEvent>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    while let Some(line) = lines.next_line().await? {
        let event = match parse(&line) {
            Ok(Command::Event(event)) => event,
            Ok(Command::Record(path)) => {
                microphone.select(path);
                ViewEvent::StartRecording
            }
            Ok(Command::Help) => {
                println!("{HELP}");
                continue;
            }
            Ok(Command::Empty) => continue,
            Err(usage) => {
                eprintln!("{usage}");
                continue;
            }
        };

        let quit = event == ViewEvent::Shutdown;
        if events.send(event).await.is_err() || quit {
            return Ok(());
        }
    }

    tracing::debug!("stdin closed");
    let _ = events.send(ViewEvent::Shutdown).await;
    Ok(())
}
