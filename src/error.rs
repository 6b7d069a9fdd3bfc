//! Error types for the HydraDancer host controller
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using HydraError
pub type Result<T> = std::result::Result<T, HydraError>;

/// Unified error type for host controller operations
#[derive(Debug, Error)]
pub enum HydraError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Device Errors
    // -------------------------------------------------------------------------
    #[error("USB error: {0}")]
    Usb(String),

    #[error("USB device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Bulk write to endpoint 0x{endpoint:02x} failed: {reason}")]
    TransportWrite { endpoint: u8, reason: String },

    #[error("Bulk read from endpoint 0x{endpoint:02x} failed: {reason}")]
    TransportRead { endpoint: u8, reason: String },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Bad index or length handed to the frame codec. Nothing was sent.
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Device unresponsive after {attempts} reads")]
    DeviceUnresponsive { attempts: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HydraError {
    /// True for failures reported by the transport collaborator.
    ///
    /// These are tolerated by the descriptor upload sequence and the log loop.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            HydraError::TransportWrite { .. } | HydraError::TransportRead { .. }
        )
    }
}
