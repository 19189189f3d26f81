//! InteractiveSession: the video feed and local input for one emulator.
//!
//! The session listens to console lines.  When the video-handle reply to
//! `screenrecord webrtc start` arrives it opens the shared region and spawns
//! a poll task that pushes every new frame to a [`FrameSink`].  In the other
//! direction it turns pointer, key and rotate requests from the UI into
//! console commands.
//!
//! # Task ownership (for beginners)
//!
//! ```text
//! ┌─────────────── InteractiveSession ───────────────┐
//! │ ViewState (std Mutex, never held across .await)  │
//! │   quadrant, view size, buffer size, poll task ───┼──> poll task owns the
//! └──────────────────────────────────────────────────┘    SharedFrameBuffer
//! ```
//!
//! The poll task is the only code that touches the mapped region.  Detaching
//! aborts the task; dropping the task's future drops the buffer, and the
//! buffer's `Drop` releases the region.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use emu_core::{
    frame::{FrameError, PollOutcome, RegionProvider, SharedFrameBuffer},
    keymap::{KeyTranslator, LocalKey},
    protocol::{classify_line, ConsoleCommand, ConsoleReply, VIDEO_HANDLE_PREFIX},
    view::{map_pointer, RenderTransform, RotationQuadrant, Size},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::console_link::{ConsoleLink, LinkError};
use super::supervise_reconnect::ViewReset;

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The shared video region could not be opened.
    #[error("failed to attach video feed: {0}")]
    Attach(#[from] FrameError),
    /// The console command could not be written.
    #[error("failed to send console command: {0}")]
    Send(#[from] LinkError),
}

/// Presentation surface for decoded frames.
///
/// `present` receives a slice that is only valid for the duration of the
/// call.  Implementations copy what they need.
pub trait FrameSink: Send + Sync {
    fn present(&self, pixels: &[u32], width: u32, height: u32);
    fn request_repaint(&self);
}

/// Serializable snapshot of the session for status displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub attached_handle: Option<String>,
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub view_width: u32,
    pub view_height: u32,
    pub rotation_degrees: u32,
}

#[derive(Default)]
struct ViewState {
    quadrant: RotationQuadrant,
    view: Size,
    buffer: Option<Size>,
    handle: Option<String>,
    poll_task: Option<JoinHandle<()>>,
}

/// Converts a producer fps into the poll period, `1000 / fps` milliseconds.
/// An fps of 0 is treated as 1.
pub fn poll_period(fps: u32) -> Duration {
    let fps = fps.max(1);
    Duration::from_millis(u64::from((1000 / fps).max(1)))
}

/// Orchestrates the video feed and input forwarding for one console.
pub struct InteractiveSession {
    link: Arc<dyn ConsoleLink>,
    regions: Arc<dyn RegionProvider>,
    sink: Arc<dyn FrameSink>,
    handle_prefix: String,
    state: Mutex<ViewState>,
}

impl InteractiveSession {
    /// Creates a detached session drawing into a `view`-sized surface.
    pub fn new(
        link: Arc<dyn ConsoleLink>,
        regions: Arc<dyn RegionProvider>,
        sink: Arc<dyn FrameSink>,
        view: Size,
    ) -> Self {
        Self {
            link,
            regions,
            sink,
            handle_prefix: VIDEO_HANDLE_PREFIX.to_string(),
            state: Mutex::new(ViewState { view, ..ViewState::default() }),
        }
    }

    /// Overrides the prefix that marks a video-handle line.
    pub fn with_handle_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.handle_prefix = prefix.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles one console line received while authorized.
    ///
    /// A video-handle line attaches the feed; `KO:` replies are logged; all
    /// other lines are ignored here.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Attach`] if the announced region cannot be
    /// opened.  The session stays detached in that case.
    pub fn on_message(&self, line: &str) -> Result<(), SessionError> {
        match classify_line(line, &self.handle_prefix) {
            ConsoleReply::VideoHandle(handle) => self.attach(handle),
            ConsoleReply::Ko(reason) => {
                warn!("Console rejected command: {reason}");
                Ok(())
            }
            ConsoleReply::Ok => Ok(()),
            ConsoleReply::Other(text) => {
                debug!(line = text, "Ignoring console line");
                Ok(())
            }
        }
    }

    /// Opens `handle` and starts polling it at the producer's frame rate.
    ///
    /// Any previous feed is detached first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Attach`] if the region cannot be opened.
    pub fn attach(&self, handle: &str) -> Result<(), SessionError> {
        self.detach();

        let buffer = SharedFrameBuffer::open(self.regions.as_ref(), handle).map_err(|e| {
            error!("Could not attach video feed '{handle}': {e}");
            SessionError::Attach(e)
        })?;

        let (width, height) = buffer.dimensions();
        let period = poll_period(buffer.fps());
        info!(handle, width, height, ?period, "Video feed attached");

        let sink = Arc::clone(&self.sink);
        let task = tokio::spawn(poll_frames(buffer, sink, period));

        let mut state = self.state();
        state.buffer = Some(Size::new(width, height));
        state.handle = Some(handle.to_string());
        state.poll_task = Some(task);
        Ok(())
    }

    /// Stops polling and releases the region.  The sink keeps showing the
    /// last frame it was given.
    pub fn detach(&self) {
        let task = {
            let mut state = self.state();
            state.buffer = None;
            if let Some(handle) = state.handle.take() {
                info!(%handle, "Video feed detached");
            }
            state.poll_task.take()
        };
        if let Some(task) = task {
            task.abort();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.state().poll_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Sends a pointer event at view coordinates `(x, y)` with a
    /// [`buttons`](emu_core::protocol::buttons) mask.
    ///
    /// Returns `false` without sending if no feed is attached, since device
    /// coordinates are unknown then.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Send`] if the console write fails.
    pub async fn forward_pointer(&self, x: i32, y: i32, buttons: u32) -> Result<bool, SessionError> {
        let mapped = {
            let state = self.state();
            state.buffer.and_then(|buffer| map_pointer(buffer, state.view, x, y))
        };

        let Some((dx, dy)) = mapped else {
            debug!(x, y, "Dropping pointer event: no video feed attached");
            return Ok(false);
        };

        let command = ConsoleCommand::Mouse { x: dx, y: dy, buttons };
        self.link.send(&command.to_string()).await?;
        Ok(true)
    }

    /// Sends a key press or release.  Keys without a device code are ignored
    /// and return `false`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Send`] if the console write fails.
    pub async fn forward_key(&self, key: LocalKey, is_press: bool) -> Result<bool, SessionError> {
        let command = KeyTranslator::translate(key, is_press);
        if command.is_empty() {
            debug!(%key, "No device key code; ignoring");
            return Ok(false);
        }
        self.link.send(&command).await?;
        Ok(true)
    }

    /// Advances the display rotation by 90° and tells the device to rotate.
    ///
    /// The local quadrant changes even if the send fails; the device sends no
    /// acknowledgement either way.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Send`] if the console write fails.
    pub async fn rotate(&self) -> Result<RotationQuadrant, SessionError> {
        let quadrant = {
            let mut state = self.state();
            state.quadrant = state.quadrant.next();
            state.quadrant
        };
        info!(rotation = %quadrant, "Rotating view");
        self.link.send(&ConsoleCommand::Rotate.to_string()).await?;
        Ok(quadrant)
    }

    pub fn quadrant(&self) -> RotationQuadrant {
        self.state().quadrant
    }

    /// Updates the surface size used for pointer mapping and rendering.
    pub fn resize_view(&self, view: Size) {
        self.state().view = view;
    }

    pub fn view_size(&self) -> Size {
        self.state().view
    }

    /// Frame size of the attached feed.
    pub fn buffer_size(&self) -> Option<Size> {
        self.state().buffer
    }

    /// The transform for drawing the current feed into the view, or `None`
    /// while detached.
    pub fn render_transform(&self) -> Option<RenderTransform> {
        let state = self.state();
        state
            .buffer
            .and_then(|buffer| RenderTransform::for_view(state.quadrant, state.view, buffer))
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state();
        let buffer = state.buffer.unwrap_or_default();
        SessionStatus {
            attached_handle: state.handle.clone(),
            buffer_width: buffer.width,
            buffer_height: buffer.height,
            view_width: state.view.width,
            view_height: state.view.height,
            rotation_degrees: state.quadrant.degrees(),
        }
    }

    /// Detaches and asks the emulator to stop sharing frames.
    pub async fn shutdown(&self) {
        self.detach();
        if let Err(e) = self.link.send(&ConsoleCommand::ScreenShareStop.to_string()).await {
            debug!("Could not stop video stream: {e}");
        }
    }
}

impl ViewReset for InteractiveSession {
    fn reset_view(&self) {
        self.detach();
    }
}

impl Drop for InteractiveSession {
    fn drop(&mut self) {
        if let Some(task) = self.state().poll_task.take() {
            task.abort();
        }
    }
}

/// Fixed-rate poll loop.  Owns `buffer` and ends on the first read error.
async fn poll_frames(mut buffer: SharedFrameBuffer, sink: Arc<dyn FrameSink>, period: Duration) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match buffer.poll() {
            Ok(PollOutcome::FrameChanged(frame)) => {
                sink.present(frame.pixels, frame.width, frame.height);
                sink.request_repaint();
            }
            Ok(PollOutcome::FrameUnchanged) => {}
            Err(e) => {
                warn!(handle = buffer.handle(), "Stopping video poll: {e}");
                break;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::frame_sink::mock::MockFrameSink;
    use async_trait::async_trait;
    use emu_core::frame::memory::InMemoryRegionProvider;
    use emu_core::protocol::buttons;

    const HANDLE: &str = "videmulator5554";

    // ── Recording link ────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingLink {
        sent: std::sync::Mutex<Vec<String>>,
        should_fail: bool,
    }

    impl RecordingLink {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConsoleLink for RecordingLink {
        fn connect(&self) {}

        async fn send(&self, message: &str) -> Result<(), LinkError> {
            if self.should_fail {
                return Err(LinkError::NotConnected);
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct Fixture {
        link: Arc<RecordingLink>,
        regions: InMemoryRegionProvider,
        sink: Arc<MockFrameSink>,
        session: InteractiveSession,
    }

    fn fixture(view: Size) -> Fixture {
        let link = Arc::new(RecordingLink::default());
        let regions = InMemoryRegionProvider::new();
        let sink = Arc::new(MockFrameSink::new());
        let session = InteractiveSession::new(
            link.clone(),
            Arc::new(regions.clone()),
            sink.clone(),
            view,
        );
        Fixture { link, regions, sink, session }
    }

    // ── Pure helpers ──────────────────────────────────────────────────────────

    #[test]
    fn test_poll_period_is_thousand_over_fps() {
        assert_eq!(poll_period(60), Duration::from_millis(16));
        assert_eq!(poll_period(30), Duration::from_millis(33));
    }

    #[test]
    fn test_poll_period_treats_zero_fps_as_one() {
        assert_eq!(poll_period(0), Duration::from_millis(1000));
    }

    #[test]
    fn test_poll_period_never_zero() {
        assert_eq!(poll_period(5000), Duration::from_millis(1));
    }

    // ── Attachment ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_handle_line_attaches_feed() {
        // Arrange
        let f = fixture(Size::new(360, 640));
        f.regions.create(HANDLE, 1080, 1920, 60);

        // Act
        f.session.on_message(HANDLE).unwrap();

        // Assert
        assert!(f.session.is_attached());
        assert_eq!(f.session.buffer_size(), Some(Size::new(1080, 1920)));
        assert_eq!(f.session.status().attached_handle.as_deref(), Some(HANDLE));
    }

    #[tokio::test]
    async fn test_other_lines_do_not_attach() {
        let f = fixture(Size::new(360, 640));

        f.session.on_message("OK").unwrap();
        f.session.on_message("KO: unknown command").unwrap();
        f.session.on_message("Android Console: type 'help'").unwrap();

        assert!(!f.session.is_attached());
    }

    #[tokio::test]
    async fn test_missing_region_fails_attach() {
        let f = fixture(Size::new(360, 640));

        let result = f.session.on_message("videmulator9999");

        assert!(matches!(result, Err(SessionError::Attach(FrameError::ResourceUnavailable { .. }))));
        assert!(!f.session.is_attached());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_task_presents_new_frames_only() {
        // Arrange
        let f = fixture(Size::new(2, 2));
        f.regions.create(HANDLE, 2, 1, 10);
        f.regions.publish_frame(HANDLE, &[0xFF11_2233, 0xFF44_5566], 1);
        f.session.attach(HANDLE).unwrap();

        // Act – three ticks at 100 ms with no new frame after the first
        tokio::time::sleep(Duration::from_millis(250)).await;

        // Assert
        let presented = f.sink.presented();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].pixels, vec![0xFF11_2233, 0xFF44_5566]);
        assert_eq!((presented[0].width, presented[0].height), (2, 1));
        assert_eq!(f.sink.repaint_count(), 1);

        // Act – a new frame is picked up on the next tick
        f.regions.publish_frame(HANDLE, &[1, 2], 2);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Assert
        assert_eq!(f.sink.presented().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_releases_region() {
        // Arrange
        let f = fixture(Size::new(2, 2));
        f.regions.create(HANDLE, 1, 1, 60);
        f.session.attach(HANDLE).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Act
        f.session.reset_view();
        tokio::time::sleep(Duration::from_millis(1)).await;

        // Assert – probe close plus the polled region
        assert!(!f.session.is_attached());
        assert_eq!(f.session.buffer_size(), None);
        assert_eq!(f.regions.close_count(HANDLE), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reattach_replaces_previous_feed() {
        let f = fixture(Size::new(2, 2));
        f.regions.create(HANDLE, 1, 1, 60);
        f.regions.create("videmulator5556", 2, 2, 60);

        f.session.attach(HANDLE).unwrap();
        f.session.attach("videmulator5556").unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(f.session.buffer_size(), Some(Size::new(2, 2)));
        assert_eq!(f.regions.close_count(HANDLE), 2);
    }

    // ── Input forwarding ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_pointer_is_scaled_to_device_pixels() {
        // Arrange
        let f = fixture(Size::new(360, 640));
        f.regions.create(HANDLE, 1080, 1920, 60);
        f.session.attach(HANDLE).unwrap();

        // Act
        let sent = f.session.forward_pointer(180, 320, buttons::LEFT).await.unwrap();

        // Assert
        assert!(sent);
        assert_eq!(f.link.sent(), vec!["event mouse 540 960 0 1".to_string()]);
    }

    #[tokio::test]
    async fn test_pointer_without_feed_is_dropped() {
        let f = fixture(Size::new(360, 640));

        let sent = f.session.forward_pointer(10, 10, buttons::LEFT).await.unwrap();

        assert!(!sent);
        assert!(f.link.sent().is_empty());
    }

    #[tokio::test]
    async fn test_pointer_uses_resized_view() {
        let f = fixture(Size::new(360, 640));
        f.regions.create(HANDLE, 1080, 1920, 60);
        f.session.attach(HANDLE).unwrap();

        f.session.resize_view(Size::new(1080, 1920));
        f.session.forward_pointer(5, 7, buttons::NONE).await.unwrap();

        assert_eq!(f.link.sent(), vec!["event mouse 5 7 0 0".to_string()]);
    }

    #[tokio::test]
    async fn test_key_press_and_release_are_forwarded() {
        let f = fixture(Size::new(1, 1));

        f.session.forward_key(LocalKey::KeyA, true).await.unwrap();
        f.session.forward_key(LocalKey::KeyA, false).await.unwrap();

        assert_eq!(
            f.link.sent(),
            vec!["event send EV_KEY:30:1".to_string(), "event send EV_KEY:30:0".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unmapped_key_sends_nothing() {
        let f = fixture(Size::new(1, 1));

        let sent = f.session.forward_key(LocalKey::PrintScreen, true).await.unwrap();

        assert!(!sent);
        assert!(f.link.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let link = Arc::new(RecordingLink { should_fail: true, ..Default::default() });
        let session = InteractiveSession::new(
            link,
            Arc::new(InMemoryRegionProvider::new()),
            Arc::new(MockFrameSink::new()),
            Size::new(1, 1),
        );

        let result = session.forward_key(LocalKey::Enter, true).await;

        assert!(matches!(result, Err(SessionError::Send(LinkError::NotConnected))));
    }

    // ── Rotation ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_rotate_advances_quadrant_and_sends_rotate() {
        // Arrange
        let f = fixture(Size::new(300, 500));

        // Act
        let q1 = f.session.rotate().await.unwrap();
        let q2 = f.session.rotate().await.unwrap();

        // Assert
        assert_eq!(q1.index(), 1);
        assert_eq!(q2.index(), 2);
        assert_eq!(f.link.sent(), vec!["rotate".to_string(), "rotate".to_string()]);
    }

    #[tokio::test]
    async fn test_four_rotations_wrap_to_upright() {
        let f = fixture(Size::new(300, 500));
        for _ in 0..4 {
            f.session.rotate().await.unwrap();
        }
        assert_eq!(f.session.quadrant(), RotationQuadrant::UPRIGHT);
    }

    #[tokio::test]
    async fn test_render_transform_follows_rotation() {
        // Arrange
        let f = fixture(Size::new(500, 300));
        f.regions.create(HANDLE, 100, 150, 60);
        f.session.attach(HANDLE).unwrap();

        // Act
        f.session.rotate().await.unwrap();
        let t = f.session.render_transform().unwrap();

        // Assert
        assert!((t.scale_x - 500.0 / 150.0).abs() < 1e-9);
        assert!((t.scale_y - 3.0).abs() < 1e-9);
        assert_eq!(t.rotation_degrees, 90);
    }

    #[tokio::test]
    async fn test_render_transform_absent_while_detached() {
        let f = fixture(Size::new(500, 300));
        assert!(f.session.render_transform().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_sends_stop() {
        let f = fixture(Size::new(1, 1));

        f.session.shutdown().await;

        assert_eq!(f.link.sent(), vec!["screenrecord webrtc stop".to_string()]);
    }
}
