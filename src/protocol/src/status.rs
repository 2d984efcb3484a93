//! Status catalog: the closed set of status bytes carried in response
//! payloads. Two values drive engine control flow: [`Status::Success`]
//! (ordinary frame) and [`Status::NoCountLabel`] (stream terminator).

use std::fmt;

use crate::frame::ParseError;

/// Response status byte, first byte of every response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// Command executed, frame carries its ordinary payload
    Success = 0x00,
    /// A command parameter was out of range
    WrongParameter = 0x01,
    /// The reader could not execute the command
    ExecutionFailed = 0x02,
    /// Opcode not supported by this firmware
    UnsupportedCommand = 0x03,
    /// Antenna missing or mismatched
    AntennaError = 0x05,
    /// No more tags: terminator for streaming replies
    NoCountLabel = 0x09,
    /// Tag rejected the access password
    AccessPasswordError = 0x0A,
    /// Tag rejected the kill password
    KillPasswordError = 0x0B,
    /// Module suspended itself above the temperature threshold
    OverTemperature = 0x0E,
}

impl TryFrom<u8> for Status {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Success),
            0x01 => Ok(Self::WrongParameter),
            0x02 => Ok(Self::ExecutionFailed),
            0x03 => Ok(Self::UnsupportedCommand),
            0x05 => Ok(Self::AntennaError),
            0x09 => Ok(Self::NoCountLabel),
            0x0A => Ok(Self::AccessPasswordError),
            0x0B => Ok(Self::KillPasswordError),
            0x0E => Ok(Self::OverTemperature),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Specialization of [`Status`] used by inventory frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InventoryStatus {
    /// Frame carries one tag
    Success = 0x00,
    /// Antenna missing during the inventory round
    AntennaError = 0x05,
    /// No more tags: end of the inventory stream
    NoCountLabel = 0x09,
}

impl TryFrom<u8> for InventoryStatus {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Success),
            0x05 => Ok(Self::AntennaError),
            0x09 => Ok(Self::NoCountLabel),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
