//! Controller Module
//!
//! The host-side controller that coordinates all components.
//!
//! ## Responsibilities
//! - Own the transport and the two reusable buffers (transfer and log)
//! - Send mode commands
//! - Program descriptors, one at a time or as a full set
//! - Run echo (ROT13) exchanges
//! - Poll the diagnostic log once or until told to stop

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::buffer::TransferBuffer;
use crate::config::Config;
use crate::descriptors::DescriptorSet;
use crate::error::{HydraError, Result};
use crate::protocol::{encode_command, encode_sub_command, CommandType, DescriptorIndex, SubCommand};
use crate::session::{DescriptorUploader, EchoSession, LogPoller};
use crate::transport::{Transport, UsbTransport};

/// A descriptor that could not be uploaded
#[derive(Debug)]
pub struct UploadFailure {
    pub kind: SubCommand,
    pub index: DescriptorIndex,
    pub error: HydraError,
}

/// Result of programming a full descriptor set
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Descriptors fully sent (frame and payload)
    pub uploaded: usize,

    /// Descriptors that hit a transport failure, in upload order
    pub failures: Vec<UploadFailure>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Host controller for one board
///
/// ## Concurrency Model: single owner
///
/// Every operation takes `&mut self` and blocks until the transport returns,
/// so at most one exchange is in flight and the buffers are never shared.
/// To drive the board from several threads, wrap the controller in a mutex
/// or give it to one owning thread.
pub struct Controller<T: Transport> {
    /// Controller configuration
    config: Config,

    /// Bulk-transfer channel to the board
    transport: T,

    /// Buffer for echo payloads and responses
    transfer_buf: TransferBuffer,

    /// Buffer for log polls
    log_buf: TransferBuffer,

    uploader: DescriptorUploader,
    echo: EchoSession,
    log: LogPoller,
}

impl Controller<UsbTransport> {
    /// Find the board described by `config`, claim its interface and wrap it
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = UsbTransport::open(&config)?;
        Self::new(config, transport)
    }
}

impl<T: Transport> Controller<T> {
    /// Wrap an already opened transport
    pub fn new(config: Config, transport: T) -> Result<Self> {
        config.validate()?;

        let transfer_buf = TransferBuffer::new(config.transfer_capacity)?;
        let log_buf = TransferBuffer::new(config.log_capacity)?;

        let uploader = DescriptorUploader::new(config.endpoint_out, config.transfer_capacity)
            .with_timeout(config.transfer_timeout);
        let echo = EchoSession::new(config.endpoint_out, config.endpoint_in)
            .with_bound(config.echo_poll)
            .with_timeout(config.transfer_timeout);
        let log = LogPoller::new(config.endpoint_log).with_timeout(config.transfer_timeout);

        Ok(Self {
            config,
            transport,
            transfer_buf,
            log_buf,
            uploader,
            echo,
            log,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give the transport back (releases nothing by itself)
    pub fn into_transport(self) -> T {
        self.transport
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Send a bare one-byte command frame
    pub fn send_command(&mut self, command: CommandType) -> Result<()> {
        let frame = encode_command(command);
        tracing::debug!("Sending {:?} frame {:02x?}", command, frame.as_bytes());
        self.transport
            .write_bulk(self.config.endpoint_out, frame.as_bytes(), self.config.transfer_timeout)?;
        Ok(())
    }

    // =========================================================================
    // Descriptors
    // =========================================================================

    /// Upload a single descriptor
    pub fn set_descriptor(&mut self, kind: SubCommand, index: u8, payload: &[u8]) -> Result<()> {
        self.uploader.upload(&mut self.transport, kind, index, payload)
    }

    /// Upload every descriptor of `set` in programming order
    ///
    /// All frames are validated first, so a bad descriptor fails the call
    /// before anything is sent. Transport failures are collected in the
    /// report and the remaining descriptors are still uploaded.
    pub fn program_descriptors(&mut self, set: &DescriptorSet) -> Result<UploadReport> {
        let entries = set.entries();
        for entry in &entries {
            encode_sub_command(
                entry.kind,
                entry.index.get(),
                entry.bytes.len(),
                self.config.transfer_capacity,
            )?;
        }

        let mut report = UploadReport::default();
        for entry in entries {
            tracing::info!(
                "Sending {} descriptor {} ({} bytes)",
                entry.kind.name(),
                entry.index.get(),
                entry.bytes.len()
            );
            match self
                .uploader
                .upload(&mut self.transport, entry.kind, entry.index.get(), entry.bytes)
            {
                Ok(()) => report.uploaded += 1,
                Err(error) => report.failures.push(UploadFailure {
                    kind: entry.kind,
                    index: entry.index,
                    error,
                }),
            }
        }

        if !report.is_complete() {
            tracing::warn!(
                "{} of {} descriptors failed to upload",
                report.failures.len(),
                report.uploaded + report.failures.len()
            );
        }
        Ok(report)
    }

    // =========================================================================
    // Echo
    // =========================================================================

    /// Send `message` and return the board's answer
    ///
    /// The message is cut to `transfer_capacity - 1` bytes; the whole buffer
    /// goes out, zero padded.
    pub fn echo(&mut self, message: &[u8]) -> Result<String> {
        let loaded = self.transfer_buf.load(message);
        if loaded < message.len() {
            tracing::warn!("Echo message truncated from {} to {} bytes", message.len(), loaded);
        }

        let outcome = self.echo.exchange(&mut self.transport, &mut self.transfer_buf)?;
        let response = self.transfer_buf.text().into_owned();
        tracing::debug!(?outcome, "Echo complete");

        self.transfer_buf.clear();
        Ok(response)
    }

    // =========================================================================
    // Log
    // =========================================================================

    /// Poll the log endpoint once
    pub fn poll_log(&mut self) -> Result<Option<String>> {
        self.log.poll(&mut self.transport, &mut self.log_buf)
    }

    /// Collect whatever the board has logged
    ///
    /// The first IN transfer after the log endpoint sat idle comes back
    /// empty even when text is waiting, so two polls are made. Failures are
    /// logged and skipped.
    pub fn log_once(&mut self) -> Vec<String> {
        (0..2).filter_map(|_| self.poll_log().ok().flatten()).collect()
    }

    /// Poll the log every `log_interval` until `stop` is raised
    ///
    /// Every non-empty message goes to `sink`. Read failures are logged and
    /// polling carries on. Returns the number of messages delivered.
    pub fn follow_log<F>(&mut self, stop: &AtomicBool, mut sink: F) -> usize
    where
        F: FnMut(&str),
    {
        let mut delivered = 0;
        while !stop.load(Ordering::Relaxed) {
            if let Ok(Some(text)) = self.poll_log() {
                sink(&text);
                delivered += 1;
            }
            thread::sleep(self.config.log_interval);
        }
        delivered
    }
}
