//! Network infrastructure: the console control channel.
//!
//! Architecture:
//! - `ControlChannel` owns one TCP connection to the emulator console at a
//!   time.  `connect()` spawns a task that opens the socket and then drives
//!   the read loop until the connection ends.
//! - Inbound bytes are reassembled into lines.  Until the console has
//!   accepted us, lines are only scanned for the auth challenge; after that,
//!   every line is published as [`ChannelEvent::MessageReceived`].
//! - State transitions are published as [`ChannelEvent::StateChanged`] to all
//!   subscribers, including repeats.
//! - Outbound commands go through `send`, which writes one line on the shared
//!   write half.  There is no queue: a send while disconnected fails.
//!
//! # Connection lifecycle (for beginners)
//!
//! ```text
//!  connect()          socket open        auth sent / no auth needed
//! ──────────> Connecting ───────────> (read loop) ──────────────────> Connected
//!                 │                       │                               │
//!                 │ connect error         │ EOF, read error,              │ EOF, read error
//!                 ▼                       ▼ unreadable token file         ▼
//!            Disconnected <───────────────┴───────────────────────────────┘
//! ```
//!
//! Each `connect()` or `close()` starts a new generation.  A connection task
//! from an older generation may still be unwinding after `abort()`; its state
//! changes, writer updates and messages are dropped.
//!
//! Leaving `Connected` always clears the authorized flag.  Reconnecting is
//! not this module's job; the `ReconnectSupervisor` watches the state events
//! and calls `connect()` again.

pub mod subscribers;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use emu_core::protocol::{
    AuthScanner, AuthStep, ChannelEvent, ConnectionState, ConsoleCommand, LineAccumulator,
    AUTH_MARKER, DEFAULT_CONSOLE_PORT,
};
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::application::console_link::{ConsoleLink, LinkError};

pub use subscribers::{SubscriptionId, Subscribers};

/// Size of the socket read buffer.
const READ_BUF_SIZE: usize = 4096;

/// Errors that can occur on the control channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// TCP connection to the console failed.
    #[error("failed to connect to console at {addr}: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// `send` was called with no open socket.
    #[error("console is not connected")]
    NotConnected,
    /// The auth token file named by the console could not be read.
    #[error("cannot read console auth token from {path}: {source}")]
    AuthFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The console closed the connection.
    #[error("connection closed by console")]
    Closed,
}

impl From<ChannelError> for LinkError {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::NotConnected => LinkError::NotConnected,
            other => LinkError::Write(other.to_string()),
        }
    }
}

/// Configuration for the control channel.
#[derive(Debug, Clone)]
pub struct ControlChannelConfig {
    /// Address of the emulator console.
    pub console_addr: SocketAddr,
    /// Text that introduces the token file path in the auth banner.
    pub auth_marker: String,
}

impl Default for ControlChannelConfig {
    fn default() -> Self {
        Self {
            console_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_CONSOLE_PORT)),
            auth_marker: AUTH_MARKER.to_string(),
        }
    }
}

struct ChannelInner {
    config: ControlChannelConfig,
    state: StdMutex<ConnectionState>,
    authorized: AtomicBool,
    generation: AtomicU64,
    writer: Mutex<Option<OwnedWriteHalf>>,
    subscribers: Subscribers,
    task: StdMutex<Option<JoinHandle<()>>>,
}

/// Client side of the emulator console protocol.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone)]
pub struct ControlChannel {
    inner: Arc<ChannelInner>,
}

impl ControlChannel {
    /// Creates a channel in the `Disconnected` state.  Nothing is opened
    /// until [`connect`](Self::connect).
    pub fn new(config: ControlChannelConfig) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                config,
                state: StdMutex::new(ConnectionState::Disconnected),
                authorized: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                writer: Mutex::new(None),
                subscribers: Subscribers::new(),
                task: StdMutex::new(None),
            }),
        }
    }

    pub fn console_addr(&self) -> SocketAddr {
        self.inner.config.console_addr
    }

    /// Registers for state changes and authorized messages.
    pub fn subscribe(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<ChannelEvent>) {
        self.inner.subscribers.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_authorized(&self) -> bool {
        self.inner.authorized.load(Ordering::SeqCst)
    }

    /// Starts a connect attempt and returns immediately.
    ///
    /// Publishes `Connecting` now, then `Connected` once authorized or
    /// `Disconnected` on failure.  A previous connection, if any, is torn
    /// down first.
    pub fn connect(&self) {
        let previous = self.inner.take_task();
        if let Some(task) = previous {
            task.abort();
        }

        let generation = self.inner.begin_connection();
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run_connection(generation).await });
        *self.inner.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    /// Writes `message` followed by `\n`.
    ///
    /// Works whether or not the console has authorized us yet.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotConnected`] without an open socket, or
    /// [`ChannelError::Io`] if the write fails.
    pub async fn send(&self, message: &str) -> Result<(), ChannelError> {
        self.inner.send_line(None, message).await
    }

    /// Closes the socket, stops the read loop and publishes `Disconnected`.
    pub async fn close(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.inner.take_task() {
            task.abort();
        }
        if let Some(mut writer) = self.inner.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        if self.state() != ConnectionState::Disconnected {
            self.inner.transition(None, ConnectionState::Disconnected);
        }
    }
}

#[async_trait]
impl ConsoleLink for ControlChannel {
    fn connect(&self) {
        ControlChannel::connect(self);
    }

    async fn send(&self, message: &str) -> Result<(), LinkError> {
        ControlChannel::send(self, message).await.map_err(LinkError::from)
    }
}

impl ChannelInner {
    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Starts a new generation and publishes `Connecting` for it.
    fn begin_connection(&self) -> u64 {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.apply_state(&mut current, ConnectionState::Connecting);
        generation
    }

    /// Publishes `state` unless `generation` has been superseded.  `None`
    /// publishes unconditionally.  Returns whether the state was applied.
    fn transition(&self, generation: Option<u64>, state: ConnectionState) -> bool {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(generation) = generation {
            if !self.is_current(generation) {
                debug!(generation, ?state, "Dropping state change from a replaced connection");
                return false;
            }
        }
        self.apply_state(&mut current, state);
        true
    }

    fn apply_state(&self, current: &mut ConnectionState, state: ConnectionState) {
        self.authorized.store(state == ConnectionState::Connected, Ordering::SeqCst);
        *current = state;
        info!(addr = %self.config.console_addr, ?state, "Console state changed");
        self.subscribers.publish(&ChannelEvent::StateChanged(state));
    }

    /// Replaces the write half if `generation` is still current.
    async fn set_writer(&self, generation: u64, writer: Option<OwnedWriteHalf>) {
        let mut guard = self.writer.lock().await;
        if self.is_current(generation) {
            *guard = writer;
        }
    }

    /// One connection from connect to teardown.
    async fn run_connection(&self, generation: u64) {
        let addr = self.config.console_addr;
        self.set_writer(generation, None).await;
        let reader = match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!("Connected to console at {addr}");
                let (reader, writer) = stream.into_split();
                self.set_writer(generation, Some(writer)).await;
                reader
            }
            Err(source) => {
                let e = ChannelError::ConnectFailed { addr, source };
                warn!("{e}");
                self.transition(Some(generation), ConnectionState::Disconnected);
                return;
            }
        };

        match self.read_loop(generation, reader).await {
            Err(e @ ChannelError::AuthFailure { .. }) => error!("{e}"),
            Err(ChannelError::Closed) => info!("Console at {addr} closed the connection"),
            Err(e) => warn!("Console connection lost: {e}"),
            Ok(()) => {}
        }

        self.set_writer(generation, None).await;
        self.transition(Some(generation), ConnectionState::Disconnected);
    }

    /// Reads until EOF or error, authenticating first.
    async fn read_loop(&self, generation: u64, mut reader: OwnedReadHalf) -> Result<(), ChannelError> {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut lines = LineAccumulator::new();
        let mut scanner = AuthScanner::new(self.config.auth_marker.clone());
        let mut authorized = false;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                return Err(ChannelError::Closed);
            }

            for line in lines.push(&buf[..n]) {
                if authorized {
                    if !self.is_current(generation) {
                        return Ok(());
                    }
                    debug!(%line, "Console message");
                    self.subscribers.publish(&ChannelEvent::MessageReceived(line));
                    continue;
                }

                match scanner.feed(&line) {
                    AuthStep::Pending => debug!(%line, "Console greeting"),
                    AuthStep::TokenPath(path) => {
                        self.authenticate(generation, &path).await?;
                        if !self.transition(Some(generation), ConnectionState::Connected) {
                            return Ok(());
                        }
                        authorized = true;
                    }
                    AuthStep::NotRequired => {
                        info!("Console does not require authentication");
                        if !self.transition(Some(generation), ConnectionState::Connected) {
                            return Ok(());
                        }
                        authorized = true;
                    }
                }
            }
        }
    }

    async fn authenticate(&self, generation: u64, path: &Path) -> Result<(), ChannelError> {
        let token = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ChannelError::AuthFailure {
                path: path.to_path_buf(),
                source,
            })?;
        let auth = ConsoleCommand::Auth { token: token.trim().to_string() };
        self.send_line(Some(generation), &auth.to_string()).await?;
        info!(token_file = %path.display(), "Sent console auth token");
        Ok(())
    }

    /// Writes one line.  With a `generation`, the write only goes out while
    /// that connection is still the current one.
    async fn send_line(&self, generation: Option<u64>, message: &str) -> Result<(), ChannelError> {
        let mut guard = self.writer.lock().await;
        if generation.is_some_and(|g| !self.is_current(g)) {
            return Err(ChannelError::NotConnected);
        }
        let writer = guard.as_mut().ok_or(ChannelError::NotConnected)?;

        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        debug!(message, "Sent console line");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
