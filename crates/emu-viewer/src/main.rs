//! Emulator viewer entry point.
//!
//! Wires together the console control channel, the reconnect supervisor, the
//! interactive session and the stdin command bridge, then runs until Ctrl+C
//! or a `quit` command.
//!
//! # Usage
//!
//! ```text
//! emu-viewer [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Config file [default: platform config dir]
//!   --host <IP>           Console host [default: 127.0.0.1]
//!   --port <PORT>         Console port [default: 5554]
//!   --fps <FPS>           Frame rate to request from the emulator
//!   --view-width <PX>     View width used for pointer mapping [default: 360]
//!   --view-height <PX>    View height used for pointer mapping [default: 640]
//!   --log-level <LEVEL>   Log level when RUST_LOG is unset [default: info]
//! ```
//!
//! CLI values override the config file; the config file overrides the
//! built-in defaults.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ ControlChannel::connect()          -- TCP + auth, publishes events
//!  └─ ReconnectSupervisor::run()         -- StateChanged -> reconnect / start stream
//!  └─ message loop                       -- MessageReceived -> InteractiveSession
//!  └─ stdin loop                         -- command lines -> ui_bridge -> JSON
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use emu_core::protocol::ChannelEvent;
use emu_viewer::application::{
    console_link::ConsoleLink, interactive_session::InteractiveSession,
    supervise_reconnect::ReconnectSupervisor,
};
use emu_viewer::infrastructure::{
    config::{default_config_path, load_config, ViewerConfig},
    frame_sink::HeadlessFrameSink,
    network::{ControlChannel, ControlChannelConfig},
    shared_memory::NativeRegionProvider,
    ui_bridge::{handle_line, ViewerAppState},
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Headless viewer for a running Android emulator.
///
/// Connects to the emulator console, attaches the shared-memory video feed,
/// and forwards commands typed on stdin.
#[derive(Debug, Parser)]
#[command(name = "emu-viewer", about = "Console-driven viewer for a running emulator", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "EMU_VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// IP address of the emulator console.
    #[arg(long, env = "EMU_CONSOLE_HOST")]
    host: Option<String>,

    /// Console port of the emulator (5554, 5556, ...).
    #[arg(long, env = "EMU_CONSOLE_PORT")]
    port: Option<u16>,

    /// Frame rate to request with `screenrecord webrtc start`.
    #[arg(long)]
    fps: Option<u32>,

    /// Width of the view surface in pixels.
    #[arg(long)]
    view_width: Option<u32>,

    /// Height of the view surface in pixels.
    #[arg(long)]
    view_height: Option<u32>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Loads the config file and applies CLI overrides on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    fn into_config(self) -> anyhow::Result<ViewerConfig> {
        let path = match self.config {
            Some(path) => Some(path),
            None => default_config_path().ok(),
        };

        let mut config = match &path {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ViewerConfig::default(),
        };

        if let Some(host) = self.host {
            config.console.host = host;
        }
        if let Some(port) = self.port {
            config.console.port = port;
        }
        if self.fps.is_some() {
            config.video.fps = self.fps;
        }
        if let Some(width) = self.view_width {
            config.view.width = width;
        }
        if let Some(height) = self.view_height {
            config.view.height = height;
        }
        if let Some(level) = self.log_level {
            config.viewer.log_level = level;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.viewer.log_level)),
        )
        .init();

    let console_addr = config
        .console
        .socket_addr()
        .context("invalid console address")?;
    info!("Emulator viewer starting; console at {console_addr}");

    // ── Components ────────────────────────────────────────────────────────────
    let channel = ControlChannel::new(ControlChannelConfig {
        console_addr,
        auth_marker: config.console.token_marker.clone(),
    });
    let link: Arc<dyn ConsoleLink> = Arc::new(channel.clone());
    let sink = Arc::new(HeadlessFrameSink::new());

    let session = Arc::new(
        InteractiveSession::new(
            Arc::clone(&link),
            Arc::new(NativeRegionProvider::new()),
            sink.clone(),
            config.view.size(),
        )
        .with_handle_prefix(config.video.handle_prefix.clone()),
    );

    let supervisor = Arc::new(
        ReconnectSupervisor::new(Arc::clone(&link))
            .with_view(session.clone())
            .with_delay(config.console.reconnect_delay())
            .with_fps(config.video.fps),
    );

    // ── Event wiring ──────────────────────────────────────────────────────────
    let (_, supervisor_rx) = channel.subscribe();
    tokio::spawn(Arc::clone(&supervisor).run(supervisor_rx));

    let (_, session_rx) = channel.subscribe();
    tokio::spawn(dispatch_messages(Arc::clone(&session), session_rx));

    channel.connect();

    // ── Command loop ──────────────────────────────────────────────────────────
    let quit = Arc::new(Notify::new());
    let state = ViewerAppState {
        session: Arc::clone(&session),
        channel: channel.clone(),
        sink,
    };
    tokio::spawn(read_commands(state, Arc::clone(&quit)));

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!("Failed to listen for Ctrl+C: {e}"),
        },
        _ = quit.notified() => info!("Quit requested"),
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    supervisor.stop();
    session.shutdown().await;
    channel.close().await;

    info!("Emulator viewer stopped");
    Ok(())
}

/// Hands authorized console lines to the session.
async fn dispatch_messages(
    session: Arc<InteractiveSession>,
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
) {
    while let Some(event) = events.recv().await {
        if let ChannelEvent::MessageReceived(line) = event {
            if let Err(e) = session.on_message(&line) {
                warn!("{e}");
            }
        }
    }
}

/// Reads commands from stdin and prints one JSON response per line.
async fn read_commands(state: ViewerAppState, quit: Arc<Notify>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                let outcome = handle_line(&state, &line).await;
                println!("{}", outcome.response);
                if outcome.quit {
                    break;
                }
            }
            Ok(None) => {
                debug!("stdin closed; commands disabled");
                return;
            }
            Err(e) => {
                warn!("Failed to read command: {e}");
                return;
            }
        }
    }
    quit.notify_one();
}

// ── Tests ─────────────────────────────────────────────────────────────────────
