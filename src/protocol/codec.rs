//! Protocol codec
//!
//! Encoding and decoding functions for BBIO frames.
//!
//! ## Wire Format
//!
//! ### Command Frame
//! ```text
//! ┌──────────┐
//! │ Cmd (1)  │
//! └──────────┘
//! ```
//!
//! ### Sub-command Frame (SetDescriptor only)
//! ```text
//! ┌──────────┬──────────┬───────────┬──────────┬───────────┐
//! │ Cmd (1)  │ Sub (1)  │ Index (1) │ LenLo(1) │ LenHi (1) │
//! └──────────┴──────────┴───────────┴──────────┴───────────┘
//! ```
//!
//! The descriptor bytes are not part of the frame; they follow as a
//! separate bulk write.

use crate::error::{HydraError, Result};
use super::{Command, CommandType, DescriptorIndex, SubCommand};

/// Size of a bare command frame
pub const COMMAND_FRAME_SIZE: usize = 1;

/// Size of a SetDescriptor sub-command frame
pub const SUB_COMMAND_FRAME_SIZE: usize = 5;

/// Largest length the 16-bit length field can carry
pub const MAX_DESCRIPTOR_LENGTH: usize = u16::MAX as usize;

/// An encoded frame, held inline (no allocation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; SUB_COMMAND_FRAME_SIZE],
    len: usize,
}

impl Frame {
    /// The bytes to put on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a bare command
///
/// Format: cmd (1)
pub fn encode_command(command: CommandType) -> Frame {
    let mut bytes = [0u8; SUB_COMMAND_FRAME_SIZE];
    bytes[0] = command as u8;
    Frame {
        bytes,
        len: COMMAND_FRAME_SIZE,
    }
}

/// Encode a SetDescriptor sub-command frame
///
/// Format: cmd (1) + sub (1) + index (1) + length (2, little-endian)
///
/// Fails with `PreconditionViolation` when `index > 16`, when `length` does
/// not fit 16 bits, or when `length` exceeds the transfer `capacity`.
pub fn encode_sub_command(
    kind: SubCommand,
    index: u8,
    length: usize,
    capacity: usize,
) -> Result<Frame> {
    let index = DescriptorIndex::new(index)?;
    check_length(length, capacity)?;

    let [low, high] = (length as u16).to_le_bytes();
    Ok(Frame {
        bytes: [
            CommandType::SetDescriptor as u8,
            kind as u8,
            index.get(),
            low,
            high,
        ],
        len: SUB_COMMAND_FRAME_SIZE,
    })
}

/// Encode any command into its frame
pub fn encode(command: &Command, capacity: usize) -> Result<Frame> {
    match *command {
        Command::Main | Command::Identify => Ok(encode_command(command.command_type())),
        Command::SetDescriptor {
            kind,
            index,
            length,
        } => encode_sub_command(kind, index.get(), length, capacity),
    }
}

fn check_length(length: usize, capacity: usize) -> Result<()> {
    if length > MAX_DESCRIPTOR_LENGTH {
        return Err(HydraError::PreconditionViolation(format!(
            "descriptor length {} > {}",
            length, MAX_DESCRIPTOR_LENGTH
        )));
    }
    if length > capacity {
        return Err(HydraError::PreconditionViolation(format!(
            "descriptor length {} exceeds transfer capacity {}",
            length, capacity
        )));
    }
    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a frame back into a command
///
/// Reads frames the way the firmware would, which lets tests check what a
/// session actually put on the wire. A one-byte `SetDescriptor` header has
/// no command representation and is rejected.
pub fn decode_frame(bytes: &[u8]) -> Result<Command> {
    match bytes {
        [cmd] => match *cmd {
            0x00 => Ok(Command::Main),
            0x01 => Ok(Command::Identify),
            0x02 => Err(HydraError::Protocol(
                "SetDescriptor frame without sub-command".to_string(),
            )),
            other => Err(unknown_command(other)),
        },
        [cmd, sub, index, low, high] => {
            if *cmd != CommandType::SetDescriptor as u8 {
                return Err(HydraError::Protocol(format!(
                    "5-byte frame with command 0x{:02x}",
                    cmd
                )));
            }
            let kind = decode_sub_command(*sub)?;
            let index = DescriptorIndex::new(*index)
                .map_err(|e| HydraError::Protocol(e.to_string()))?;
            let length = u16::from_le_bytes([*low, *high]) as usize;
            Ok(Command::SetDescriptor {
                kind,
                index,
                length,
            })
        }
        _ => Err(HydraError::Protocol(format!(
            "Invalid frame length: {} bytes",
            bytes.len()
        ))),
    }
}

fn decode_sub_command(byte: u8) -> Result<SubCommand> {
    SubCommand::ALL
        .into_iter()
        .find(|kind| *kind as u8 == byte)
        .ok_or_else(|| HydraError::Protocol(format!("Unknown sub-command: 0x{:02x}", byte)))
}

fn unknown_command(byte: u8) -> HydraError {
    HydraError::Protocol(format!("Unknown command type: 0x{:02x}", byte))
}
