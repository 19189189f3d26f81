//! ReconnectSupervisor: keeps the console connection alive.
//!
//! The supervisor only reacts to state notifications from the control
//! channel:
//!
//! - `Disconnected` – detach the video view and schedule `connect()` after a
//!   fixed delay.  At most one attempt is pending at a time.
//! - `Connected` – ask the emulator to start sharing video frames.
//!
//! There is no backoff growth and no retry cap; an emulator that is restarted
//! is picked up within one delay period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use emu_core::protocol::{ChannelEvent, ConnectionState, ConsoleCommand};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::console_link::ConsoleLink;

/// Default delay before a reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Something that shows the video feed and must let go of it when the
/// console goes away.
pub trait ViewReset: Send + Sync {
    fn reset_view(&self);
}

/// Reconnect and stream-activation policy for one control channel.
pub struct ReconnectSupervisor {
    link: Arc<dyn ConsoleLink>,
    view: Option<Arc<dyn ViewReset>>,
    delay: Duration,
    activation: ConsoleCommand,
    pending: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl ReconnectSupervisor {
    /// Creates a supervisor with the default one-second delay.
    pub fn new(link: Arc<dyn ConsoleLink>) -> Self {
        Self {
            link,
            view: None,
            delay: DEFAULT_RECONNECT_DELAY,
            activation: ConsoleCommand::ScreenShareStart { fps: None },
            pending: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registers the view to reset on disconnect.
    pub fn with_view(mut self, view: Arc<dyn ViewReset>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Requests a specific frame rate in the activation command.
    pub fn with_fps(mut self, fps: Option<u32>) -> Self {
        self.activation = ConsoleCommand::ScreenShareStart { fps };
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// `true` while a reconnect is scheduled but has not fired yet.
    pub fn is_reconnect_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Applies the policy for one state notification.
    pub async fn on_state_change(&self, state: ConnectionState) {
        match state {
            ConnectionState::Disconnected => {
                if let Some(view) = &self.view {
                    view.reset_view();
                }
                self.schedule_reconnect();
            }
            ConnectionState::Connected => {
                let command = self.activation.to_string();
                info!(%command, "Console connected; starting video stream");
                if let Err(e) = self.link.send(&command).await {
                    warn!("Failed to request video stream: {e}");
                }
            }
            ConnectionState::Connecting => debug!("Console connecting"),
        }
    }

    fn schedule_reconnect(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            debug!("Supervisor stopped; not reconnecting");
            return;
        }
        if self.pending.swap(true, Ordering::SeqCst) {
            debug!("Reconnect already pending");
            return;
        }

        info!("Console disconnected; reconnecting in {:?}", self.delay);
        let link = Arc::clone(&self.link);
        let pending = Arc::clone(&self.pending);
        let stopped = Arc::clone(&self.stopped);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            pending.store(false, Ordering::SeqCst);
            if !stopped.load(Ordering::SeqCst) {
                link.connect();
            }
        });
    }

    /// Consumes channel events until the sender side is dropped.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<ChannelEvent>) {
        while let Some(event) = events.recv().await {
            if let ChannelEvent::StateChanged(state) = event {
                self.on_state_change(state).await;
            }
        }
        debug!("Supervisor event stream closed");
    }

    /// Cancels any pending reconnect and ignores further disconnects.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
