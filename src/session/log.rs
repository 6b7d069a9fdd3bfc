//! Log Poller
//!
//! Single bounded read from the diagnostic endpoint.

use std::time::Duration;

use crate::buffer::TransferBuffer;
use crate::error::Result;
use crate::transport::Transport;

/// Polls the board's log endpoint
#[derive(Debug, Clone)]
pub struct LogPoller {
    endpoint: u8,
    timeout: Option<Duration>,
}

impl LogPoller {
    pub fn new(endpoint: u8) -> Self {
        Self {
            endpoint,
            timeout: None,
        }
    }

    /// Set the per-read timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read once from the log endpoint
    ///
    /// Returns `Ok(None)` when the board had nothing to say. The buffer is
    /// zeroed before returning, whatever the outcome.
    pub fn poll<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        buf: &mut TransferBuffer,
    ) -> Result<Option<String>> {
        let read = transport.read_bulk(self.endpoint, buf.as_mut_slice(), self.timeout);
        buf.terminate();

        let outcome = match read {
            Ok(n) => {
                buf.set_filled(n);
                if buf.is_blank() {
                    Ok(None)
                } else {
                    tracing::debug!(filled = buf.filled(), "Log message received");
                    Ok(Some(buf.text().into_owned()))
                }
            }
            Err(e) => {
                tracing::warn!("Log read failed: {}", e);
                Err(e)
            }
        };

        buf.clear();
        outcome
    }
}
