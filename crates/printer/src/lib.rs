//! Receipt formatting and the print device session protocol.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod device;
mod format;
mod job;
mod network;

pub use device::{DeviceSession, PrintDevice, PrintDeviceError};
pub use format::format_receipt;
pub use job::{PrintJob, run_print_job};
pub use network::{Error, NetworkDevice, NetworkSession};
