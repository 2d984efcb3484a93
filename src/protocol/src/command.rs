//! Command catalog: the closed set of opcodes the reader firmware accepts.

use std::fmt;

use crate::frame::ParseError;

/// 16-bit opcodes, transmitted big-endian in the frame prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CommandRequest {
    /// Start or continue a continuous ISO 18000-6C inventory
    InventoryIsoContinue = 0x0001,
    /// Stop a running inventory
    InventoryStop = 0x0002,
    /// Get or set the EPC output range used during inventory
    InventoryRange = 0x0003,
    /// Initialize the RFID module
    ModuleInit = 0x0050,
    /// Reboot the reader
    Reboot = 0x0052,
    /// Set transmit power
    SetPower = 0x0053,
    /// Get or set the active RFID protocol
    SetGetRfidProtocol = 0x0059,
    /// Get or set per-antenna power
    SetGetAntennaPower = 0x0063,
    /// Query hardware and firmware versions
    GetDeviceInfo = 0x0068,
    /// Write the complete parameter block
    SetAllParam = 0x0071,
    /// Read the complete parameter block
    GetAllParam = 0x0072,
    /// Release or close the relay output
    ReleaseCloseRelay = 0x0077,
    /// Get or set the local network configuration
    SetGetNetwork = 0x0079,
    /// Get or set the remote server configuration
    SetGetRemoteNetwork = 0x007A,
    /// Set the over-temperature protection threshold
    SetMaxTemperature = 0x007B,
    /// Read the module temperature
    GetCurrentTemperature = 0x007C,
    /// Get or set relay/buzzer output parameters
    SetGetOutputParameters = 0x007D,
    /// Get or set the mask-inventory permission filter
    SetGetPermission = 0x007E,
    /// Read ISO tag memory
    ReadIsoTag = 0x0084,
    /// Write ISO tag memory
    WriteIsoTag = 0x0085,
    /// Lock an ISO tag memory bank
    LockIsoTag = 0x0086,
    /// Kill an ISO tag
    KillIsoTag = 0x0087,
    /// Restrict subsequent tag commands to a matching EPC pattern
    SelectMask = 0x0098,
}

impl CommandRequest {
    /// The raw 16-bit opcode.
    #[must_use]
    pub fn value(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for CommandRequest {
    type Error = ParseError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::InventoryIsoContinue),
            0x0002 => Ok(Self::InventoryStop),
            0x0003 => Ok(Self::InventoryRange),
            0x0050 => Ok(Self::ModuleInit),
            0x0052 => Ok(Self::Reboot),
            0x0053 => Ok(Self::SetPower),
            0x0059 => Ok(Self::SetGetRfidProtocol),
            0x0063 => Ok(Self::SetGetAntennaPower),
            0x0068 => Ok(Self::GetDeviceInfo),
            0x0071 => Ok(Self::SetAllParam),
            0x0072 => Ok(Self::GetAllParam),
            0x0077 => Ok(Self::ReleaseCloseRelay),
            0x0079 => Ok(Self::SetGetNetwork),
            0x007A => Ok(Self::SetGetRemoteNetwork),
            0x007B => Ok(Self::SetMaxTemperature),
            0x007C => Ok(Self::GetCurrentTemperature),
            0x007D => Ok(Self::SetGetOutputParameters),
            0x007E => Ok(Self::SetGetPermission),
            0x0084 => Ok(Self::ReadIsoTag),
            0x0085 => Ok(Self::WriteIsoTag),
            0x0086 => Ok(Self::LockIsoTag),
            0x0087 => Ok(Self::KillIsoTag),
            0x0098 => Ok(Self::SelectMask),
            other => Err(ParseError::UnknownOpcode(other)),
        }
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({:#06x})", self.value())
    }
}

/// Selector byte prefixing combined get/set commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandOption {
    /// Read the current value
    Get = 0x01,
    /// Write a new value
    Set = 0x02,
}

impl CommandOption {
    /// The raw selector byte.
    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_values_are_pinned() {
        assert_eq!(CommandRequest::GetDeviceInfo.value(), 0x0068);
        assert_eq!(CommandRequest::InventoryIsoContinue.value(), 0x0001);
        assert_eq!(CommandRequest::InventoryStop.value(), 0x0002);
        assert_eq!(CommandOption::Get.value(), 0x01);
        assert_eq!(CommandOption::Set.value(), 0x02);
    }

    #[test]
    fn try_from_round_trips_every_opcode() {
        let all = [
            CommandRequest::InventoryIsoContinue,
            CommandRequest::InventoryStop,
            CommandRequest::InventoryRange,
            CommandRequest::ModuleInit,
            CommandRequest::Reboot,
            CommandRequest::SetPower,
            CommandRequest::SetGetRfidProtocol,
            CommandRequest::SetGetAntennaPower,
            CommandRequest::GetDeviceInfo,
            CommandRequest::SetAllParam,
            CommandRequest::GetAllParam,
            CommandRequest::ReleaseCloseRelay,
            CommandRequest::SetGetNetwork,
            CommandRequest::SetGetRemoteNetwork,
            CommandRequest::SetMaxTemperature,
            CommandRequest::GetCurrentTemperature,
            CommandRequest::SetGetOutputParameters,
            CommandRequest::SetGetPermission,
            CommandRequest::ReadIsoTag,
            CommandRequest::WriteIsoTag,
            CommandRequest::LockIsoTag,
            CommandRequest::KillIsoTag,
            CommandRequest::SelectMask,
        ];
        for request in all {
            assert_eq!(CommandRequest::try_from(request.value()), Ok(request));
        }
        assert_eq!(
            CommandRequest::try_from(0x1234),
            Err(ParseError::UnknownOpcode(0x1234))
        );
    }
}
