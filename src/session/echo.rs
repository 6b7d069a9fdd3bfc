//! Echo Session
//!
//! Sends the transfer buffer to the board and polls the IN endpoint until
//! the board answers (plain echo or the ROT13 "cipher" mode).
//!
//! ## States
//! ```text
//! Sending ──write ok──▶ AwaitingResponse ──first byte != 0──▶ Complete
//!    │                        │   ▲
//!    └──write failed──▶ Failed│   │ empty or failed read
//!                             └───┘
//! ```
//!
//! A failed read does not end the loop; the board is known to drop the odd
//! IN transfer. With `PollBound::Unbounded` a board that never answers
//! blocks the caller forever, exactly like the legacy host tool. Use
//! `Attempts` or `Deadline` to get `DeviceUnresponsive` instead.

use std::time::{Duration, Instant};

use crate::buffer::TransferBuffer;
use crate::config::PollBound;
use crate::error::{HydraError, Result};
use crate::transport::Transport;

/// Counters from a completed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoOutcome {
    /// Bytes handed to the transport in the send step
    pub sent: usize,

    /// Reads issued before the response arrived (including failed ones)
    pub reads: usize,

    /// Reads that reported a transport failure
    pub failed_reads: usize,
}

/// Send-then-poll exchange
#[derive(Debug, Clone)]
pub struct EchoSession {
    endpoint_out: u8,
    endpoint_in: u8,
    bound: PollBound,
    timeout: Option<Duration>,
}

impl EchoSession {
    pub fn new(endpoint_out: u8, endpoint_in: u8) -> Self {
        Self {
            endpoint_out,
            endpoint_in,
            bound: PollBound::Unbounded,
            timeout: None,
        }
    }

    /// Bound the polling loop. `Attempts(0)` still issues one read.
    pub fn with_bound(mut self, bound: PollBound) -> Self {
        self.bound = bound;
        self
    }

    /// Set the per-transfer timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send the whole of `buf`, then poll until a response lands in it
    ///
    /// On success `buf` holds the response, NUL-terminated at its last byte.
    /// A send failure is returned without reading.
    pub fn exchange<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        buf: &mut TransferBuffer,
    ) -> Result<EchoOutcome> {
        // Sending
        let sent = match transport.write_bulk(self.endpoint_out, buf.as_slice(), self.timeout) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Echo payload not sent: {}", e);
                return Err(e);
            }
        };
        tracing::debug!(sent, "Echo payload sent, awaiting response");

        // AwaitingResponse
        let started = Instant::now();
        let mut reads = 0;
        let mut failed_reads = 0;

        loop {
            buf.clear();
            reads += 1;

            match transport.read_bulk(self.endpoint_in, buf.as_mut_slice(), self.read_timeout(started)) {
                Ok(n) => buf.set_filled(n),
                Err(e) => {
                    failed_reads += 1;
                    tracing::warn!(attempt = reads, "Echo read failed: {}", e);
                }
            }
            buf.terminate();

            if !buf.is_blank() {
                tracing::debug!(reads, failed_reads, filled = buf.filled(), "Echo response received");
                return Ok(EchoOutcome {
                    sent,
                    reads,
                    failed_reads,
                });
            }

            if self.exhausted(reads, started) {
                tracing::warn!(reads, "Giving up on echo response");
                return Err(HydraError::DeviceUnresponsive { attempts: reads });
            }
        }
    }

    fn exhausted(&self, reads: usize, started: Instant) -> bool {
        match self.bound {
            PollBound::Unbounded => false,
            PollBound::Attempts(max) => reads >= max,
            PollBound::Deadline(limit) => started.elapsed() >= limit,
        }
    }

    /// Per-read timeout; under a deadline it never outlives the deadline
    fn read_timeout(&self, started: Instant) -> Option<Duration> {
        match self.bound {
            PollBound::Deadline(limit) => {
                let remaining = limit.saturating_sub(started.elapsed());
                Some(self.timeout.map_or(remaining, |t| t.min(remaining)))
            }
            _ => self.timeout,
        }
    }
}
