//! The application layer's view of the console control channel.
//!
//! Use cases talk to the console through [`ConsoleLink`] rather than the
//! concrete `ControlChannel`, so they can be tested without a socket.

use async_trait::async_trait;
use thiserror::Error;

/// Failure to deliver a console command.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No socket is open.
    #[error("console is not connected")]
    NotConnected,
    /// The write failed; the connection is probably going down.
    #[error("console write failed: {0}")]
    Write(String),
}

/// Commands the use cases need from the control channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsoleLink: Send + Sync {
    /// Starts a new connect attempt.  Returns immediately; the outcome is
    /// reported through the channel's state notifications.
    fn connect(&self);

    /// Writes one command line.  The newline is appended by the channel.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if nothing is connected or the write fails.
    async fn send(&self, message: &str) -> Result<(), LinkError>;
}
