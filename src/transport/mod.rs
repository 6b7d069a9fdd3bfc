//! Transport Module
//!
//! The bulk-transfer channel the protocol layer runs on.
//!
//! ## Implementations
//! - `UsbTransport`: a claimed interface on the real board (nusb)
//! - `MockTransport`: scripted reads and recorded writes for tests
//!
//! Every operation in `session` takes the transport by `&mut`, so the
//! protocol code never owns or discovers the device itself.

use std::time::Duration;

use crate::error::Result;

mod mock;
mod usb;

pub use mock::{MockRead, MockTransport};
pub use usb::UsbTransport;

/// Blocking bulk-transfer channel
pub trait Transport {
    /// Write `data` to bulk-out `endpoint`
    ///
    /// Blocks until the transfer completes or `timeout` elapses
    /// (`None` waits forever). Returns the number of bytes written.
    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Option<Duration>) -> Result<usize>;

    /// Read up to `buf.len()` bytes from bulk-in `endpoint` into `buf`
    ///
    /// Returns the number of bytes received.
    fn read_bulk(&mut self, endpoint: u8, buf: &mut [u8], timeout: Option<Duration>)
        -> Result<usize>;
}
