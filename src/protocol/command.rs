//! Command definitions
//!
//! BBIO commands and the descriptor sub-commands that only exist under
//! `SetDescriptor`.

use crate::error::{HydraError, Result};

/// Command types (first byte of every frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    Main = 0x00,
    Identify = 0x01,
    SetDescriptor = 0x02,
}

impl CommandType {
    pub const ALL: [CommandType; 3] = [
        CommandType::Main,
        CommandType::Identify,
        CommandType::SetDescriptor,
    ];
}

/// Descriptor kinds accepted by `SetDescriptor` (second byte of the frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SubCommand {
    Device = 0x01,
    Config = 0x02,
    Interface = 0x03,
    Endpoint = 0x04,
    String = 0x05,
}

impl SubCommand {
    /// All sub-commands, in the order a full descriptor set is programmed
    pub const ALL: [SubCommand; 5] = [
        SubCommand::Device,
        SubCommand::Config,
        SubCommand::Interface,
        SubCommand::Endpoint,
        SubCommand::String,
    ];

    /// Human readable name for logs
    pub fn name(self) -> &'static str {
        match self {
            SubCommand::Device => "device",
            SubCommand::Config => "config",
            SubCommand::Interface => "interface",
            SubCommand::Endpoint => "endpoint",
            SubCommand::String => "string",
        }
    }
}

/// Which instance of a descriptor kind is being set
///
/// The firmware keeps at most 17 slots per kind (0..=16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DescriptorIndex(u8);

impl DescriptorIndex {
    /// Highest index the firmware accepts
    pub const MAX: u8 = 16;

    /// Create an index, rejecting anything above [`DescriptorIndex::MAX`]
    pub fn new(index: u8) -> Result<Self> {
        if index > Self::MAX {
            return Err(HydraError::PreconditionViolation(format!(
                "descriptor index {} > {}",
                index,
                Self::MAX
            )));
        }
        Ok(Self(index))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// A command ready to be framed
///
/// The sub-command fields only exist on `SetDescriptor`, so a sub-command
/// paired with any other command cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Return the board to its main mode
    Main,

    /// Ask the board to identify itself
    Identify,

    /// Announce a descriptor of `length` bytes that follows as its own write
    SetDescriptor {
        kind: SubCommand,
        index: DescriptorIndex,
        length: usize,
    },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Main => CommandType::Main,
            Command::Identify => CommandType::Identify,
            Command::SetDescriptor { .. } => CommandType::SetDescriptor,
        }
    }
}
