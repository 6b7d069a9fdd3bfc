//! Transfer buffer
//!
//! A fixed-capacity byte buffer reused across exchanges. It is allocated once
//! by the controller and zeroed between uses, so a response never carries
//! bytes from the previous one.

use std::borrow::Cow;

use bytes::BytesMut;

use crate::error::{HydraError, Result};

/// Reusable buffer for outgoing payloads and incoming responses
#[derive(Debug)]
pub struct TransferBuffer {
    /// Always exactly `capacity` bytes long
    data: BytesMut,

    /// Bytes written by the last read or load
    filled: usize,
}

impl TransferBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(HydraError::Config(
                "transfer buffer capacity must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            data: BytesMut::zeroed(capacity),
            filled: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes reported by the last transfer into this buffer
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub(crate) fn set_filled(&mut self, filled: usize) {
        self.filled = filled.min(self.capacity());
    }

    /// Zero every byte
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.filled = 0;
    }

    /// Replace the contents with `payload`
    ///
    /// At most `capacity - 1` bytes are copied so the final byte stays a
    /// terminator. Returns the number of bytes copied.
    pub fn load(&mut self, payload: &[u8]) -> usize {
        self.clear();
        let n = payload.len().min(self.capacity() - 1);
        self.data[..n].copy_from_slice(&payload[..n]);
        self.filled = n;
        n
    }

    /// Force a NUL into the last byte
    pub fn terminate(&mut self) {
        let last = self.capacity() - 1;
        self.data[last] = 0;
    }

    /// True while the first byte is zero (nothing received yet)
    pub fn is_blank(&self) -> bool {
        self.data[0] == 0
    }

    /// Text up to the first NUL, lossily decoded
    pub fn text(&self) -> Cow<'_, str> {
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.data.len());
        String::from_utf8_lossy(&self.data[..end])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
