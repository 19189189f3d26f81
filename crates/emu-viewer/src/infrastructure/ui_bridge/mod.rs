//! Command bridge between a front end and the viewer session.
//!
//! The headless binary reads one command per line on stdin and answers each
//! with one JSON line.  A windowed front end would call the same functions
//! directly.
//!
//! # Commands
//!
//! | Line                    | Effect                                         |
//! |-------------------------|------------------------------------------------|
//! | `rotate`                | rotate the device and the view by 90°          |
//! | `key <Name> <down\|up>` | press or release a key (`key KeyA down`)       |
//! | `tap <x> <y>`           | left press then release at view coordinates    |
//! | `resize <w> <h>`        | change the view size used for pointer mapping  |
//! | `status`                | connection, feed and frame statistics          |
//! | `quit`                  | stop the viewer                                |
//!
//! # `CommandResult<T>`
//!
//! Every command returns the same envelope:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```
//! so a caller can use one error-handling path for all of them.

use std::str::FromStr;
use std::sync::Arc;

use emu_core::{
    keymap::LocalKey,
    protocol::buttons,
    view::Size,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::interactive_session::{InteractiveSession, SessionStatus};
use crate::infrastructure::frame_sink::{FrameStats, HeadlessFrameSink};
use crate::infrastructure::network::ControlChannel;

// ── Shared application state ──────────────────────────────────────────────────

/// Everything the commands need to reach.
pub struct ViewerAppState {
    pub session: Arc<InteractiveSession>,
    pub channel: ControlChannel,
    pub sink: Arc<HeadlessFrameSink>,
}

// ── Command parsing ───────────────────────────────────────────────────────────

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    Rotate,
    Key { key: LocalKey, pressed: bool },
    Tap { x: i32, y: i32 },
    Resize { width: u32, height: u32 },
    Status,
    Quit,
}

/// Why a command line could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

impl FromStr for ViewerCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandParseError::Empty)?;
        let args: Vec<&str> = words.collect();

        match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("rotate", []) => Ok(ViewerCommand::Rotate),
            ("status", []) => Ok(ViewerCommand::Status),
            ("quit" | "exit", []) => Ok(ViewerCommand::Quit),
            ("key", [name, action]) => {
                let key = name
                    .parse::<LocalKey>()
                    .map_err(|_| CommandParseError::UnknownKey(name.to_string()))?;
                let pressed = match action.to_ascii_lowercase().as_str() {
                    "down" | "press" => true,
                    "up" | "release" => false,
                    _ => return Err(CommandParseError::Usage("key <Name> <down|up>")),
                };
                Ok(ViewerCommand::Key { key, pressed })
            }
            ("key", _) => Err(CommandParseError::Usage("key <Name> <down|up>")),
            ("tap", [x, y]) => match (x.parse(), y.parse()) {
                (Ok(x), Ok(y)) => Ok(ViewerCommand::Tap { x, y }),
                _ => Err(CommandParseError::Usage("tap <x> <y>")),
            },
            ("tap", _) => Err(CommandParseError::Usage("tap <x> <y>")),
            ("resize", [w, h]) => match (w.parse(), h.parse()) {
                (Ok(width), Ok(height)) => Ok(ViewerCommand::Resize { width, height }),
                _ => Err(CommandParseError::Usage("resize <width> <height>")),
            },
            ("resize", _) => Err(CommandParseError::Usage("resize <width> <height>")),
            (other, _) => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Full status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerStatusDto {
    /// `"Connecting"`, `"Connected"` or `"Disconnected"`.
    pub connection_status: String,
    pub authorized: bool,
    pub console_address: String,
    pub session: SessionStatus,
    pub frames: FrameStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationDto {
    pub rotation_degrees: u32,
}

/// Whether an input command produced a console command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDto {
    pub sent: bool,
}

/// Unified response wrapper for commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }

    /// Serializes the envelope to one JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"data":null,"error":"serialization failed: {e}"}}"#)
        })
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn get_status(state: &ViewerAppState) -> CommandResult<ViewerStatusDto> {
    CommandResult::ok(ViewerStatusDto {
        connection_status: format!("{:?}", state.channel.state()),
        authorized: state.channel.is_authorized(),
        console_address: state.channel.console_addr().to_string(),
        session: state.session.status(),
        frames: state.sink.stats(),
    })
}

pub async fn rotate(state: &ViewerAppState) -> CommandResult<RotationDto> {
    match state.session.rotate().await {
        Ok(q) => CommandResult::ok(RotationDto { rotation_degrees: q.degrees() }),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub async fn send_key(state: &ViewerAppState, key: LocalKey, pressed: bool) -> CommandResult<InputDto> {
    match state.session.forward_key(key, pressed).await {
        Ok(sent) => CommandResult::ok(InputDto { sent }),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Left-button press followed by release at the same point.
pub async fn tap(state: &ViewerAppState, x: i32, y: i32) -> CommandResult<InputDto> {
    let press = state.session.forward_pointer(x, y, buttons::LEFT).await;
    let result = match press {
        Ok(true) => state.session.forward_pointer(x, y, buttons::NONE).await,
        other => other,
    };
    match result {
        Ok(sent) => CommandResult::ok(InputDto { sent }),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub async fn resize_view(state: &ViewerAppState, width: u32, height: u32) -> CommandResult<Size> {
    let size = Size::new(width, height);
    if size.is_empty() {
        return CommandResult::err("view size must be non-zero");
    }
    state.session.resize_view(size);
    CommandResult::ok(size)
}

/// Result of handling one input line.
#[derive(Debug)]
pub struct LineOutcome {
    /// The JSON response line.
    pub response: String,
    /// `true` if the line asked the viewer to stop.
    pub quit: bool,
}

/// Parses and executes one command line.
pub async fn handle_line(state: &ViewerAppState, line: &str) -> LineOutcome {
    let command = match line.parse::<ViewerCommand>() {
        Ok(command) => command,
        Err(e) => {
            return LineOutcome { response: CommandResult::<()>::err(e.to_string()).to_json(), quit: false };
        }
    };

    let quit = command == ViewerCommand::Quit;
    let response = match command {
        ViewerCommand::Rotate => rotate(state).await.to_json(),
        ViewerCommand::Key { key, pressed } => send_key(state, key, pressed).await.to_json(),
        ViewerCommand::Tap { x, y } => tap(state, x, y).await.to_json(),
        ViewerCommand::Resize { width, height } => resize_view(state, width, height).await.to_json(),
        ViewerCommand::Status => get_status(state).await.to_json(),
        ViewerCommand::Quit => CommandResult::ok(()).to_json(),
    };

    LineOutcome { response, quit }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
