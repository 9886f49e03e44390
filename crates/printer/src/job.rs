use crate::device::{DeviceSession, PrintDevice};
use crate::format::format_receipt;

use tracing::{info, warn};

const FEED_AFTER_JOB: u8 = 3;

/// One formatted, ready-to-send rendering of a message. Owned by a single
/// print worker for the duration of one device session.
#[derive(Clone, Debug)]
pub struct PrintJob {
    /// Submitter email, for logging.
    pub email: String,

    /// The rendered lines, header and separator included.
    pub lines: Vec<String>,
}

impl PrintJob {
    /// Renders a message into a job for the given line width.
    #[must_use]
    pub fn new(email: &str, message: &str, received_at: &str, line_width: usize) -> Self {
        Self {
            email: email.to_string(),
            lines: format_receipt(email, message, received_at, line_width),
        }
    }
}

/// Drives a job through one device session.
///
/// The session is closed on every exit path. If a write fails after a
/// successful open, the close is still attempted; a close failure during that
/// cleanup is logged rather than propagated so the original error surfaces.
pub async fn run_print_job<D>(device: &D, job: &PrintJob) -> Result<(), D::Error>
where
    D: PrintDevice,
{
    // Open failure: nothing was written, nothing to clean up.
    let mut session = device.open().await?;

    let result = write_job(&mut session, job).await;

    match result {
        Ok(()) => {
            session.close().await?;
            info!(email = %job.email, "printed message");
            Ok(())
        }
        Err(error) => {
            if let Err(close_error) = session.close().await {
                warn!(error = %close_error, "failed to close device after error");
            }
            Err(error)
        }
    }
}

async fn write_job<S>(session: &mut S, job: &PrintJob) -> Result<(), S::Error>
where
    S: DeviceSession,
{
    for line in &job.lines {
        session.write_line(line).await?;
    }
    session.feed(FEED_AFTER_JOB).await?;
    session.cut().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{PrintDevice, PrintDeviceError};

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use thiserror::Error;

    #[derive(Clone, Debug, Error)]
    enum FakeError {
        #[error("open refused")]
        Open,
        #[error("write refused")]
        Write,
        #[error("close refused")]
        Close,
    }

    impl PrintDeviceError for FakeError {}

    #[derive(Clone, Debug, PartialEq)]
    enum Op {
        Open,
        WriteLine(String),
        Feed(u8),
        Cut,
        Close,
    }

    #[derive(Clone, Default)]
    struct FakeDevice {
        ops: Arc<Mutex<Vec<Op>>>,
        fail_open: bool,
        fail_write_at: Option<usize>,
        fail_close: bool,
    }

    struct FakeSession {
        ops: Arc<Mutex<Vec<Op>>>,
        fail_write_at: Option<usize>,
        fail_close: bool,
        writes: usize,
    }

    #[async_trait]
    impl PrintDevice for FakeDevice {
        type Error = FakeError;
        type Session = FakeSession;

        async fn open(&self) -> Result<Self::Session, Self::Error> {
            if self.fail_open {
                return Err(FakeError::Open);
            }
            self.ops.lock().unwrap().push(Op::Open);
            Ok(FakeSession {
                ops: self.ops.clone(),
                fail_write_at: self.fail_write_at,
                fail_close: self.fail_close,
                writes: 0,
            })
        }
    }

    #[async_trait]
    impl DeviceSession for FakeSession {
        type Error = FakeError;

        async fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
            if self.fail_write_at == Some(self.writes) {
                return Err(FakeError::Write);
            }
            self.writes += 1;
            self.ops.lock().unwrap().push(Op::WriteLine(line.to_string()));
            Ok(())
        }

        async fn feed(&mut self, lines: u8) -> Result<(), Self::Error> {
            self.ops.lock().unwrap().push(Op::Feed(lines));
            Ok(())
        }

        async fn cut(&mut self) -> Result<(), Self::Error> {
            self.ops.lock().unwrap().push(Op::Cut);
            Ok(())
        }

        async fn close(self) -> Result<(), Self::Error> {
            if self.fail_close {
                return Err(FakeError::Close);
            }
            self.ops.lock().unwrap().push(Op::Close);
            Ok(())
        }
    }

    fn job() -> PrintJob {
        PrintJob::new("a@b.c", "hello", "now", 42)
    }

    #[tokio::test]
    async fn test_success_writes_feeds_cuts_and_closes() {
        let device = FakeDevice::default();

        run_print_job(&device, &job()).await.unwrap();

        let ops = device.ops.lock().unwrap().clone();
        assert_eq!(ops.first(), Some(&Op::Open));
        assert_eq!(
            &ops[ops.len() - 3..],
            &[Op::Feed(3), Op::Cut, Op::Close]
        );
    }

    #[tokio::test]
    async fn test_open_failure_writes_nothing() {
        let device = FakeDevice {
            fail_open: true,
            ..FakeDevice::default()
        };

        assert!(matches!(
            run_print_job(&device, &job()).await,
            Err(FakeError::Open)
        ));
        assert!(device.ops.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_still_closes() {
        let device = FakeDevice {
            fail_write_at: Some(2),
            ..FakeDevice::default()
        };

        assert!(matches!(
            run_print_job(&device, &job()).await,
            Err(FakeError::Write)
        ));
        assert_eq!(device.ops.lock().unwrap().last(), Some(&Op::Close));
    }

    #[tokio::test]
    async fn test_close_failure_during_cleanup_keeps_original_error() {
        let device = FakeDevice {
            fail_write_at: Some(0),
            fail_close: true,
            ..FakeDevice::default()
        };

        // The write error wins; the failing close is only logged.
        assert!(matches!(
            run_print_job(&device, &job()).await,
            Err(FakeError::Write)
        ));
    }
}
