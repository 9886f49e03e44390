use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for print device errors.
pub trait PrintDeviceError: Debug + Error + Send + Sync {}

/// One open session against a physical printer. Consumed by
/// [`close`](DeviceSession::close); sessions are never reused across jobs.
#[async_trait]
pub trait DeviceSession: Send {
    /// The error type for the session.
    type Error: PrintDeviceError;

    /// Writes one text line.
    async fn write_line(&mut self, line: &str) -> Result<(), Self::Error>;

    /// Feeds the given number of blank lines.
    async fn feed(&mut self, lines: u8) -> Result<(), Self::Error>;

    /// Cuts the paper.
    async fn cut(&mut self) -> Result<(), Self::Error>;

    /// Closes the session.
    async fn close(self) -> Result<(), Self::Error>;
}

/// A trait representing a printer that can open device sessions.
#[async_trait]
pub trait PrintDevice: Clone + Send + Sync + 'static {
    /// The error type for the device.
    type Error: PrintDeviceError;

    /// The session type opened by the device.
    type Session: DeviceSession<Error = Self::Error>;

    /// Opens a fresh session.
    async fn open(&self) -> Result<Self::Session, Self::Error>;
}
