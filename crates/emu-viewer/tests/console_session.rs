//! End-to-end tests of the control channel against a scripted console.
//!
//! Each test binds a `TcpListener` on an ephemeral loopback port and plays the
//! emulator's side of the conversation by hand.

use std::sync::Arc;
use std::time::Duration;

use emu_core::protocol::{ChannelEvent, ConnectionState};
use emu_viewer::application::console_link::ConsoleLink;
use emu_viewer::application::supervise_reconnect::ReconnectSupervisor;
use emu_viewer::infrastructure::network::{ControlChannel, ControlChannelConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn listener() -> (TcpListener, ControlChannel) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let channel = ControlChannel::new(ControlChannelConfig {
        console_addr: listener.local_addr().unwrap(),
        ..Default::default()
    });
    (listener, channel)
}

async fn next_event(rx: &mut UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a channel event")
        .expect("channel event stream ended")
}

async fn read_line(reader: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    timeout(WAIT, reader.read_line(&mut line))
        .await
        .expect("timed out waiting for a client line")
        .unwrap();
    line.trim_end().to_string()
}

fn auth_banner(token_path: &str) -> String {
    format!(
        "Android Console: Authentication required\r\n\
         Android Console: type 'auth <auth_token>' to authenticate\r\n\
         Android Console: you can find your <auth_token> in\r\n\
         '{token_path}'\r\n\
         OK\r\n"
    )
}

fn state(s: ConnectionState) -> ChannelEvent {
    ChannelEvent::StateChanged(s)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_auth_challenge_is_answered_with_token_file_contents() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join(".emulator_console_auth_token");
    std::fs::write(&token_path, "s3cr3t\n").unwrap();
    let (listener, channel) = listener().await;
    let (_, mut rx) = channel.subscribe();

    // Act
    channel.connect();
    let (stream, _) = listener.accept().await.unwrap();
    let mut console = BufReader::new(stream);
    console
        .get_mut()
        .write_all(auth_banner(&token_path.display().to_string()).as_bytes())
        .await
        .unwrap();

    // Assert
    assert_eq!(read_line(&mut console).await, "auth s3cr3t");
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connecting));
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connected));
    assert!(channel.is_authorized());
}

#[tokio::test]
async fn test_greeting_is_withheld_and_later_lines_are_delivered() {
    // Arrange
    let (listener, channel) = listener().await;
    let (_, mut rx) = channel.subscribe();
    channel.connect();
    let (stream, _) = listener.accept().await.unwrap();
    let mut console = BufReader::new(stream);

    // Act – no-auth greeting, then a reply split across two writes
    console
        .get_mut()
        .write_all(b"Android Console: type 'help' for a list of commands\r\nOK\r\nvidem")
        .await
        .unwrap();
    console.get_mut().write_all(b"ulator5554\r\n").await.unwrap();

    // Assert
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connecting));
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connected));
    assert_eq!(
        next_event(&mut rx).await,
        ChannelEvent::MessageReceived("videmulator5554".to_string())
    );
}

#[tokio::test]
async fn test_send_writes_newline_terminated_command() {
    // Arrange
    let (listener, channel) = listener().await;
    let (_, mut rx) = channel.subscribe();
    channel.connect();
    let (stream, _) = listener.accept().await.unwrap();
    let mut console = BufReader::new(stream);
    console.get_mut().write_all(b"OK\r\n").await.unwrap();
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connecting));
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connected));

    // Act
    channel.send("rotate").await.unwrap();

    // Assert
    assert_eq!(read_line(&mut console).await, "rotate");
}

#[tokio::test]
async fn test_unreadable_token_file_disconnects() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no_such_token");
    let (listener, channel) = listener().await;
    let (_, mut rx) = channel.subscribe();

    // Act
    channel.connect();
    let (mut stream, _) = listener.accept().await.unwrap();
    stream
        .write_all(auth_banner(&missing.display().to_string()).as_bytes())
        .await
        .unwrap();

    // Assert
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connecting));
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Disconnected));
    assert!(!channel.is_authorized());
}

#[tokio::test]
async fn test_console_hangup_publishes_disconnected() {
    // Arrange
    let (listener, channel) = listener().await;
    let (_, mut rx) = channel.subscribe();
    channel.connect();
    let (mut stream, _) = listener.accept().await.unwrap();
    stream.write_all(b"OK\r\n").await.unwrap();
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connecting));
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Connected));

    // Act
    drop(stream);

    // Assert
    assert_eq!(next_event(&mut rx).await, state(ConnectionState::Disconnected));
    assert!(matches!(
        channel.send("rotate").await,
        Err(emu_viewer::infrastructure::network::ChannelError::NotConnected)
    ));
}

#[tokio::test]
async fn test_supervisor_reconnects_and_starts_video() {
    // Arrange
    let (listener, channel) = listener().await;
    let link: Arc<dyn ConsoleLink> = Arc::new(channel.clone());
    let supervisor = Arc::new(
        ReconnectSupervisor::new(link).with_delay(Duration::from_millis(50)),
    );
    let (_, events) = channel.subscribe();
    tokio::spawn(Arc::clone(&supervisor).run(events));

    // Act – first connection is dropped straight away
    channel.connect();
    let (first, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    drop(first);

    let (second, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let mut console = BufReader::new(second);
    console.get_mut().write_all(b"OK\r\n").await.unwrap();

    // Assert
    assert_eq!(read_line(&mut console).await, "screenrecord webrtc start");
    supervisor.stop();
}
