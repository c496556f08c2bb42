use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("not a valid even-length hex string: {0:?}")]
    InvalidHex(String),
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
}

/// Outbound device opcodes. The set is closed; each opcode is a fixed
/// two-byte write to the custom service write characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Power off the sensor stream.
    Off,
    /// Enable the high-rate sensor stream.
    Sensor,
    /// Firmware update entry point; function unknown upstream.
    FirmwareUpdate,
    /// Trigger on-device calibration.
    Calibrate,
    KeepAlive,
    /// Unknown settings opcode observed in the vendor service.
    Setting,
    LpmEnable,
    LpmDisable,
    /// Enable VR mode (higher report rate).
    VrMode,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::Off,
        Command::Sensor,
        Command::FirmwareUpdate,
        Command::Calibrate,
        Command::KeepAlive,
        Command::Setting,
        Command::LpmEnable,
        Command::LpmDisable,
        Command::VrMode,
    ];

    /// Canonical hex spelling of the opcode as the vendor service defines it.
    pub fn hex(self) -> &'static str {
        match self {
            Command::Off => "0000",
            Command::Sensor => "0100",
            Command::FirmwareUpdate => "0200",
            Command::Calibrate => "0300",
            Command::KeepAlive => "0400",
            Command::Setting => "0500",
            Command::LpmEnable => "0600",
            Command::LpmDisable => "0700",
            Command::VrMode => "0800",
        }
    }

    /// The two bytes written to the device, in the hex string's
    /// left-to-right pair order.
    pub fn encode(self) -> [u8; 2] {
        match self {
            Command::Off => [0x00, 0x00],
            Command::Sensor => [0x01, 0x00],
            Command::FirmwareUpdate => [0x02, 0x00],
            Command::Calibrate => [0x03, 0x00],
            Command::KeepAlive => [0x04, 0x00],
            Command::Setting => [0x05, 0x00],
            Command::LpmEnable => [0x06, 0x00],
            Command::LpmDisable => [0x07, 0x00],
            Command::VrMode => [0x08, 0x00],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Off => "off",
            Command::Sensor => "sensor",
            Command::FirmwareUpdate => "firmware-update",
            Command::Calibrate => "calibrate",
            Command::KeepAlive => "keep-alive",
            Command::Setting => "setting",
            Command::LpmEnable => "lpm-enable",
            Command::LpmDisable => "lpm-disable",
            Command::VrMode => "vr-mode",
        }
    }
}

impl FromStr for Command {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| EncodeError::UnknownCommand(s.to_string()))
    }
}

/// Decode an even-length hex string into bytes, one byte per character
/// pair in left-to-right order. Arbitrary payloads are allowed, not just
/// the known opcode set.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, EncodeError> {
    let bytes = text.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(EncodeError::InvalidHex(text.to_string()));
    }
    bytes
        .chunks_exact(2)
        .map(|pair| {
            let hi = hex_nibble(pair[0]);
            let lo = hex_nibble(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
                _ => Err(EncodeError::InvalidHex(text.to_string())),
            }
        })
        .collect()
}

fn hex_nibble(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
