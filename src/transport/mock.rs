//! Mock Transport
//!
//! In-memory stand-in for the board. Reads are served from per-endpoint
//! scripts, writes are recorded. Clones share state, so a test can keep one
//! clone for inspection after handing the other to a controller.
//!
//! When a script runs dry the mock can echo the last payload written to an
//! OUT endpoint back on an IN endpoint, optionally transformed (the board's
//! ROT13 mode). Otherwise an unscripted read returns zero bytes.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::{HydraError, Result};
use super::Transport;

type Transform = Box<dyn Fn(&[u8]) -> Vec<u8> + Send>;

/// One scripted outcome of a bulk read
#[derive(Debug, Clone)]
pub enum MockRead {
    /// Copy these bytes into the caller's buffer
    Data(Bytes),

    /// Complete with zero bytes
    Empty,

    /// Fail with this reason
    Fail(String),
}

struct Echo {
    endpoint_out: u8,
    endpoint_in: u8,
    transform: Option<Transform>,
    pending: Option<Bytes>,
}

#[derive(Default)]
struct MockState {
    /// Successful writes, in order
    writes: Vec<(u8, Bytes)>,

    /// Number of write calls, including failed ones
    write_attempts: usize,

    /// Write call indexes (0-based) that fail
    failing_writes: HashSet<usize>,

    /// Scripted reads per endpoint
    reads: HashMap<u8, VecDeque<MockRead>>,

    /// Read calls per endpoint
    read_counts: HashMap<u8, usize>,

    /// Timeout passed to every call, in call order
    timeouts: Vec<Option<Duration>>,

    echo: Option<Echo>,
}

/// Scripted, recording transport
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Queue a read outcome on `endpoint`
    pub fn push_read(&self, endpoint: u8, read: MockRead) {
        self.state
            .lock()
            .reads
            .entry(endpoint)
            .or_default()
            .push_back(read);
    }

    /// Queue a read returning `data` on `endpoint`
    pub fn push_data(&self, endpoint: u8, data: impl Into<Bytes>) {
        self.push_read(endpoint, MockRead::Data(data.into()));
    }

    /// Queue a failing read on `endpoint`
    pub fn push_failure(&self, endpoint: u8, reason: &str) {
        self.push_read(endpoint, MockRead::Fail(reason.to_string()));
    }

    /// Make the write call with this 0-based index fail
    pub fn fail_write(&self, call: usize) {
        self.state.lock().failing_writes.insert(call);
    }

    /// Echo every payload written to `endpoint_out` back on `endpoint_in`
    pub fn echo(&self, endpoint_out: u8, endpoint_in: u8) {
        self.set_echo(endpoint_out, endpoint_in, None);
    }

    /// Like [`MockTransport::echo`], applying `transform` to the payload
    pub fn echo_with<F>(&self, endpoint_out: u8, endpoint_in: u8, transform: F)
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + 'static,
    {
        self.set_echo(endpoint_out, endpoint_in, Some(Box::new(transform)));
    }

    fn set_echo(&self, endpoint_out: u8, endpoint_in: u8, transform: Option<Transform>) {
        self.state.lock().echo = Some(Echo {
            endpoint_out,
            endpoint_in,
            transform,
            pending: None,
        });
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// All successful writes as (endpoint, bytes)
    pub fn writes(&self) -> Vec<(u8, Bytes)> {
        self.state.lock().writes.clone()
    }

    /// Number of write calls, including failed ones
    pub fn write_attempts(&self) -> usize {
        self.state.lock().write_attempts
    }

    /// Number of read calls made against `endpoint`
    pub fn read_count(&self, endpoint: u8) -> usize {
        self.state
            .lock()
            .read_counts
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    /// Timeouts passed to every call, in call order
    pub fn timeouts(&self) -> Vec<Option<Duration>> {
        self.state.lock().timeouts.clone()
    }
}

impl Transport for MockTransport {
    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Option<Duration>) -> Result<usize> {
        let mut state = self.state.lock();
        state.timeouts.push(timeout);

        let call = state.write_attempts;
        state.write_attempts += 1;
        if state.failing_writes.contains(&call) {
            return Err(HydraError::TransportWrite {
                endpoint,
                reason: "scripted failure".to_string(),
            });
        }

        let payload = Bytes::copy_from_slice(data);
        if let Some(echo) = state.echo.as_mut() {
            if echo.endpoint_out == endpoint {
                echo.pending = Some(match &echo.transform {
                    Some(transform) => Bytes::from(transform(data)),
                    None => payload.clone(),
                });
            }
        }
        state.writes.push((endpoint, payload));

        Ok(data.len())
    }

    fn read_bulk(
        &mut self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize> {
        let mut state = self.state.lock();
        state.timeouts.push(timeout);
        *state.read_counts.entry(endpoint).or_default() += 1;

        let scripted = state.reads.get_mut(&endpoint).and_then(VecDeque::pop_front);
        let read = match scripted {
            Some(read) => read,
            None => match state.echo.as_mut() {
                Some(echo) if echo.endpoint_in == endpoint => {
                    echo.pending.take().map(MockRead::Data).unwrap_or(MockRead::Empty)
                }
                _ => MockRead::Empty,
            },
        };

        match read {
            MockRead::Data(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            MockRead::Empty => Ok(0),
            MockRead::Fail(reason) => Err(HydraError::TransportRead { endpoint, reason }),
        }
    }
}
