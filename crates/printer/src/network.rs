use crate::device::{DeviceSession, PrintDevice, PrintDeviceError};

use async_trait::async_trait;
use thiserror::Error as ThisError;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

// ESC/POS control sequences.
const INITIALIZE: &[u8] = &[0x1B, 0x40]; // ESC @
const FEED_LINES: &[u8] = &[0x1B, 0x64]; // ESC d n
const FULL_CUT: &[u8] = &[0x1D, 0x56, 0x00]; // GS V 0

/// Errors that can occur in this crate.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Failed to connect to the printer.
    #[error("failed to connect to printer: {0}")]
    Connect(std::io::Error),

    /// Failed to write to the printer.
    #[error("failed to write to printer: {0}")]
    Write(std::io::Error),

    /// Failed to close the printer connection.
    #[error("failed to close printer connection: {0}")]
    Close(std::io::Error),
}

impl PrintDeviceError for Error {}

/// A network-attached ESC/POS line printer.
#[derive(Clone, Debug)]
pub struct NetworkDevice {
    host: String,
    port: u16,
}

impl NetworkDevice {
    /// Creates a new `NetworkDevice` for the given host and port.
    #[must_use]
    pub const fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }
}

/// An open TCP session to the printer.
#[derive(Debug)]
pub struct NetworkSession {
    stream: TcpStream,
}

#[async_trait]
impl PrintDevice for NetworkDevice {
    type Error = Error;

    type Session = NetworkSession;

    async fn open(&self) -> Result<Self::Session, Self::Error> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(Error::Connect)?;

        let mut session = NetworkSession { stream };
        session.write_all(INITIALIZE).await?;

        Ok(session)
    }
}

impl NetworkSession {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.stream.write_all(bytes).await.map_err(Error::Write)
    }
}

#[async_trait]
impl DeviceSession for NetworkSession {
    type Error = Error;

    async fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.write_all(line.as_bytes()).await?;
        self.write_all(b"\n").await
    }

    async fn feed(&mut self, lines: u8) -> Result<(), Self::Error> {
        self.write_all(&[FEED_LINES[0], FEED_LINES[1], lines]).await
    }

    async fn cut(&mut self) -> Result<(), Self::Error> {
        self.write_all(FULL_CUT).await
    }

    async fn close(mut self) -> Result<(), Self::Error> {
        self.stream.flush().await.map_err(Error::Close)?;
        self.stream.shutdown().await.map_err(Error::Close)
    }
}
