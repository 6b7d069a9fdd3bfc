//! Configuration for the host controller
//!
//! Centralized configuration with sensible defaults. The defaults match the
//! HydraDancer firmware: VID/PID 0x1337:0x1337, one bulk-out endpoint, one
//! bulk-in endpoint for echo responses and one bulk-in endpoint for log text.

use std::time::Duration;

use crate::error::{HydraError, Result};

/// Direction bit of a USB endpoint address (set for IN endpoints)
pub const ENDPOINT_DIR_IN: u8 = 0x80;

/// Main configuration for a controller instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Discovery
    // -------------------------------------------------------------------------
    /// USB vendor ID of the board
    pub vendor_id: u16,

    /// USB product ID of the board
    pub product_id: u16,

    /// Interface number to claim (kernel driver is detached first)
    pub interface: u8,

    // -------------------------------------------------------------------------
    // Endpoints
    // -------------------------------------------------------------------------
    /// Bulk-out endpoint for commands, descriptors and echo payloads
    pub endpoint_out: u8,

    /// Bulk-in endpoint for echo responses
    pub endpoint_in: u8,

    /// Bulk-in endpoint dedicated to diagnostic log text
    pub endpoint_log: u8,

    // -------------------------------------------------------------------------
    // Buffers
    // -------------------------------------------------------------------------
    /// Capacity of the transfer buffer (bytes). Shared with the firmware:
    /// echo payloads are sent at this size and descriptors may not exceed it.
    pub transfer_capacity: usize,

    /// Capacity of the buffer used for log polls (bytes)
    pub log_capacity: usize,

    // -------------------------------------------------------------------------
    // Timing
    // -------------------------------------------------------------------------
    /// Per-transfer timeout handed to the transport. `None` blocks forever.
    pub transfer_timeout: Option<Duration>,

    /// How long the echo exchange keeps polling for a response
    pub echo_poll: PollBound,

    /// Sleep between two polls when following the log
    pub log_interval: Duration,
}

/// Bound applied to the echo response polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollBound {
    /// Poll until a response arrives, however long that takes
    Unbounded,

    /// Give up after this many reads
    ///
    /// Only bounds anything if each read can return, so `Config::validate`
    /// requires a `transfer_timeout` alongside it.
    Attempts(usize),

    /// Give up once this much time has elapsed since the first read
    Deadline(Duration),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vendor_id: 0x1337,
            product_id: 0x1337,
            interface: 0,
            endpoint_out: 0x01,
            endpoint_in: 0x81,
            endpoint_log: 0x87,
            transfer_capacity: 512,
            log_capacity: 4096,
            transfer_timeout: None,
            echo_poll: PollBound::Unbounded,
            log_interval: Duration::from_millis(10),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config for values the protocol cannot work with
    pub fn validate(&self) -> Result<()> {
        for (name, capacity) in [
            ("transfer_capacity", self.transfer_capacity),
            ("log_capacity", self.log_capacity),
        ] {
            if capacity == 0 {
                return Err(HydraError::Config(format!("{name} must be non-zero")));
            }
            if capacity > u16::MAX as usize {
                return Err(HydraError::Config(format!(
                    "{name} {capacity} exceeds {}",
                    u16::MAX
                )));
            }
        }

        if self.endpoint_out & ENDPOINT_DIR_IN != 0 {
            return Err(HydraError::Config(format!(
                "endpoint_out 0x{:02x} is an IN endpoint",
                self.endpoint_out
            )));
        }
        for (name, endpoint) in [
            ("endpoint_in", self.endpoint_in),
            ("endpoint_log", self.endpoint_log),
        ] {
            if endpoint & ENDPOINT_DIR_IN == 0 {
                return Err(HydraError::Config(format!(
                    "{name} 0x{endpoint:02x} is not an IN endpoint"
                )));
            }
        }

        if self.echo_poll == PollBound::Attempts(0) {
            return Err(HydraError::Config(
                "echo_poll attempts must be at least 1".to_string(),
            ));
        }
        if matches!(self.echo_poll, PollBound::Attempts(_)) && self.transfer_timeout.is_none() {
            return Err(HydraError::Config(
                "echo_poll attempts need a transfer_timeout, a silent board would block the first read"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the vendor and product ID used to find the board
    pub fn device(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.config.vendor_id = vendor_id;
        self.config.product_id = product_id;
        self
    }

    /// Set the interface number to claim
    pub fn interface(mut self, interface: u8) -> Self {
        self.config.interface = interface;
        self
    }

    /// Set the bulk-out endpoint
    pub fn endpoint_out(mut self, endpoint: u8) -> Self {
        self.config.endpoint_out = endpoint;
        self
    }

    /// Set the echo bulk-in endpoint
    pub fn endpoint_in(mut self, endpoint: u8) -> Self {
        self.config.endpoint_in = endpoint;
        self
    }

    /// Set the log bulk-in endpoint
    pub fn endpoint_log(mut self, endpoint: u8) -> Self {
        self.config.endpoint_log = endpoint;
        self
    }

    /// Set the transfer buffer capacity (in bytes)
    pub fn transfer_capacity(mut self, capacity: usize) -> Self {
        self.config.transfer_capacity = capacity;
        self
    }

    /// Set the log buffer capacity (in bytes)
    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.config.log_capacity = capacity;
        self
    }

    /// Set the per-transfer timeout (`None` blocks forever)
    pub fn transfer_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.transfer_timeout = timeout;
        self
    }

    /// Set the echo polling bound
    pub fn echo_poll(mut self, bound: PollBound) -> Self {
        self.config.echo_poll = bound;
        self
    }

    /// Set the interval between log polls when following
    pub fn log_interval(mut self, interval: Duration) -> Self {
        self.config.log_interval = interval;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
