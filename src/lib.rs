//! # HydraDancer host controller
//!
//! Host-side driver for the HydraDancer board's BBIO command protocol:
//! - Fixed-layout command and SetDescriptor frames
//! - Descriptor upload (frame, then raw descriptor bytes)
//! - Echo / ROT13 exchange with send-then-poll semantics
//! - Best-effort polling of the board's log endpoint
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CLI / Interactive Menu                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Controller                             │
//! │          (owns transport + transfer/log buffers)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!       ┌───────────────┼────────────────┐
//!       ▼               ▼                ▼
//! ┌───────────┐  ┌─────────────┐  ┌────────────┐
//! │Descriptor │  │ EchoSession │  │ LogPoller  │
//! │ Uploader  │  │ (send/poll) │  │ (one read) │
//! └─────┬─────┘  └──────┬──────┘  └─────┬──────┘
//!       │   FrameCodec  │               │
//!       └───────────────┼───────────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │   Transport   │
//!               │ (nusb / mock) │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod buffer;
pub mod protocol;
pub mod transport;
pub mod session;
pub mod descriptors;
pub mod controller;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HydraError, Result};
pub use config::{Config, PollBound};
pub use buffer::TransferBuffer;
pub use controller::{Controller, UploadFailure, UploadReport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the host controller
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
