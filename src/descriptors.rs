//! Descriptor sets
//!
//! Raw USB descriptors the board presents to its target once programmed,
//! plus the built-in keyboard profile.
//!
//! BBIO can only program device, config, interface, endpoint and string
//! descriptors. There is no sub-command for the HID class descriptor (0x21)
//! or the report descriptor, so the keyboard profile is not a complete HID
//! keyboard by itself: a host will only bind a HID driver if the firmware
//! supplies those on its own.

use crate::protocol::{DescriptorIndex, SubCommand};

/// bDescriptorType of a string descriptor
const STRING_DESCRIPTOR_TYPE: u8 = 0x03;

/// US English, the only language the keyboard profile ships
pub const LANGID_EN_US: u16 = 0x0409;

const KEYBOARD_DEVICE: [u8; 18] = [
    0x12, 0x01, // bLength, bDescriptorType
    0x00, 0x02, // bcdUSB 2.00
    0x00, 0x00, 0x00, // class defined per interface
    0x40, // bMaxPacketSize0
    0x37, 0x13, // idVendor
    0x38, 0x13, // idProduct
    0x00, 0x01, // bcdDevice 1.00
    0x01, 0x02, 0x03, // iManufacturer, iProduct, iSerialNumber
    0x01, // bNumConfigurations
];

// wTotalLength covers what BBIO can upload: config + interface + endpoint.
// It leaves out the 9-byte HID class descriptor, which no sub-command carries.
const KEYBOARD_CONFIG: [u8; 9] = [0x09, 0x02, 0x19, 0x00, 0x01, 0x01, 0x00, 0xA0, 0x32];

// HID, boot subclass, keyboard protocol
const KEYBOARD_INTERFACE: [u8; 9] = [0x09, 0x04, 0x00, 0x00, 0x01, 0x03, 0x01, 0x01, 0x00];

// Interrupt IN 0x81, 8 bytes, 10 ms
const KEYBOARD_ENDPOINT: [u8; 7] = [0x07, 0x05, 0x81, 0x03, 0x08, 0x00, 0x0A];

/// One descriptor ready for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorEntry<'a> {
    pub kind: SubCommand,
    pub index: DescriptorIndex,
    pub bytes: &'a [u8],
}

/// A full set of descriptors for one emulated device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSet {
    pub device: Vec<u8>,
    pub config: Vec<u8>,
    pub interface: Vec<u8>,
    pub endpoint: Vec<u8>,

    /// String descriptors by index (index 0 is the language table)
    pub strings: Vec<(DescriptorIndex, Vec<u8>)>,
}

impl DescriptorSet {
    /// Boot keyboard interface, endpoint and strings
    ///
    /// Lacks the HID class and report descriptors (see module docs).
    pub fn keyboard() -> Self {
        let strings = [
            language_descriptor(&[LANGID_EN_US]),
            string_descriptor("HydraDancer"),
            string_descriptor("HydraDancer Keyboard"),
            string_descriptor("0001"),
        ]
        .into_iter()
        .zip(0u8..)
        .map(|(bytes, i)| (DescriptorIndex::new(i).unwrap_or_default(), bytes))
        .collect();

        Self {
            device: KEYBOARD_DEVICE.to_vec(),
            config: KEYBOARD_CONFIG.to_vec(),
            interface: KEYBOARD_INTERFACE.to_vec(),
            endpoint: KEYBOARD_ENDPOINT.to_vec(),
            strings,
        }
    }

    /// Descriptors in programming order: device, config, interface,
    /// endpoint, then strings by index
    pub fn entries(&self) -> Vec<DescriptorEntry<'_>> {
        let fixed = [
            (SubCommand::Device, &self.device),
            (SubCommand::Config, &self.config),
            (SubCommand::Interface, &self.interface),
            (SubCommand::Endpoint, &self.endpoint),
        ];

        let mut strings: Vec<_> = self.strings.iter().collect();
        strings.sort_by_key(|(index, _)| *index);

        fixed
            .into_iter()
            .map(|(kind, bytes)| DescriptorEntry {
                kind,
                index: DescriptorIndex::default(),
                bytes,
            })
            .chain(strings.into_iter().map(|(index, bytes)| DescriptorEntry {
                kind: SubCommand::String,
                index: *index,
                bytes,
            }))
            .collect()
    }
}

/// Build a string descriptor (UTF-16LE, at most 126 code units)
pub fn string_descriptor(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().take(126).collect();
    encode_string_units(&units)
}

/// Build string descriptor 0 listing supported language IDs
pub fn language_descriptor(lang_ids: &[u16]) -> Vec<u8> {
    encode_string_units(&lang_ids[..lang_ids.len().min(126)])
}

fn encode_string_units(units: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(2 + units.len() * 2);
    bytes.push((2 + units.len() * 2) as u8);
    bytes.push(STRING_DESCRIPTOR_TYPE);
    for unit in units {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}
