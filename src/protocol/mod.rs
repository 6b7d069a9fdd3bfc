//! Protocol Module
//!
//! Defines the BBIO command protocol spoken over the bulk-out endpoint.
//!
//! ## Frame Format
//!
//! ### Command
//! ```text
//! ┌──────────┐
//! │ Cmd (1)  │
//! └──────────┘
//! ```
//!
//! ### SetDescriptor Sub-command
//! ```text
//! ┌──────────┬──────────┬───────────┬──────────┬───────────┐
//! │ Cmd (1)  │ Sub (1)  │ Index (1) │ LenLo(1) │ LenHi (1) │
//! └──────────┴──────────┴───────────┴──────────┴───────────┘
//! ```
//!
//! ### Commands
//! - 0x00: MAIN           - return to main mode
//! - 0x01: IDENTIFY       - identify mode
//! - 0x02: SET_DESCRIPTOR - followed by a sub-command
//!
//! ### Sub-commands
//! - 0x01: DEVICE
//! - 0x02: CONFIG
//! - 0x03: INTERFACE
//! - 0x04: ENDPOINT
//! - 0x05: STRING

mod command;
mod codec;

pub use command::{Command, CommandType, DescriptorIndex, SubCommand};
pub use codec::{
    decode_frame, encode, encode_command, encode_sub_command, Frame, COMMAND_FRAME_SIZE,
    MAX_DESCRIPTOR_LENGTH, SUB_COMMAND_FRAME_SIZE,
};
