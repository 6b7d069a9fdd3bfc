//! Session Module
//!
//! The request/response patterns built on top of the frame codec.
//!
//! ## Patterns
//! - `DescriptorUploader`: fire-and-forget frame + descriptor bytes
//! - `EchoSession`: send, then poll until the board answers
//! - `LogPoller`: one best-effort read of the log endpoint
//!
//! All of them borrow the transport and the transfer buffer for one
//! exchange only; neither is shared between concurrent callers.

mod descriptor;
mod echo;
mod log;

pub use descriptor::DescriptorUploader;
pub use echo::{EchoOutcome, EchoSession};
pub use log::LogPoller;
pub use crate::config::PollBound;
