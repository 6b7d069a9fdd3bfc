//! Descriptor Uploader
//!
//! Sends one descriptor as two bulk writes on the OUT endpoint: the
//! SetDescriptor sub-command frame, then the raw descriptor bytes.
//!
//! ## Partial failure
//! The two writes are not atomic. If the frame goes out and the payload
//! write fails, the board is left waiting for bytes that never arrive. The
//! wire protocol has no rollback, so the error is only reported.

use std::time::Duration;

use crate::error::Result;
use crate::protocol::{encode_sub_command, SubCommand};
use crate::transport::Transport;

/// Uploads descriptors to the board
#[derive(Debug, Clone)]
pub struct DescriptorUploader {
    /// Bulk-out endpoint for frame and payload
    endpoint: u8,

    /// Largest payload accepted (the transfer buffer size)
    capacity: usize,

    /// Per-write timeout (`None` blocks forever)
    timeout: Option<Duration>,
}

impl DescriptorUploader {
    pub fn new(endpoint: u8, capacity: usize) -> Self {
        Self {
            endpoint,
            capacity,
            timeout: None,
        }
    }

    /// Set the per-write timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload `payload` as descriptor `kind` number `index`
    ///
    /// The frame is encoded before anything is written, so a bad index or
    /// length fails with `PreconditionViolation` and no transfer happens.
    /// No retry is attempted on a transport failure.
    pub fn upload<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        kind: SubCommand,
        index: u8,
        payload: &[u8],
    ) -> Result<()> {
        let frame = encode_sub_command(kind, index, payload.len(), self.capacity)?;

        tracing::debug!(
            kind = kind.name(),
            index,
            len = payload.len(),
            "Sending SetDescriptor frame {:02x?}",
            frame.as_bytes()
        );

        if let Err(e) = transport.write_bulk(self.endpoint, frame.as_bytes(), self.timeout) {
            tracing::warn!("{} descriptor {}: frame not sent: {}", kind.name(), index, e);
            return Err(e);
        }

        if let Err(e) = transport.write_bulk(self.endpoint, payload, self.timeout) {
            tracing::warn!(
                "{} descriptor {}: frame sent but payload failed, device still expects {} bytes: {}",
                kind.name(),
                index,
                payload.len(),
                e
            );
            return Err(e);
        }

        Ok(())
    }
}
