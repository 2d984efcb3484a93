//! Structured setting payloads and their companion enumerations.
//!
//! Every structure that travels inside a frame payload encodes to command
//! data with `to_command_data` and, where the reader returns the same
//! structure, decodes from a response body with `from_body`. Response-body
//! decoders tolerate extra trailing bytes; the firmware is known to append
//! reserved fields on some models.

use std::fmt;
use std::net::Ipv4Addr;

use crate::frame::ParseError;

/// Serial line rate catalog with its firmware byte mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BaudRate {
    /// 9600 bps
    Bps9600 = 0x00,
    /// 19200 bps
    Bps19200 = 0x01,
    /// 38400 bps
    Bps38400 = 0x02,
    /// 57600 bps
    Bps57600 = 0x03,
    /// 115200 bps
    Bps115200 = 0x04,
}

impl BaudRate {
    /// Line rate in bits per second.
    #[must_use]
    pub fn to_int(self) -> u32 {
        match self {
            Self::Bps9600 => 9_600,
            Self::Bps19200 => 19_200,
            Self::Bps38400 => 38_400,
            Self::Bps57600 => 57_600,
            Self::Bps115200 => 115_200,
        }
    }

    /// Catalog entry for a bits-per-second value.
    #[must_use]
    pub fn from_int(baud: u32) -> Option<Self> {
        match baud {
            9_600 => Some(Self::Bps9600),
            19_200 => Some(Self::Bps19200),
            38_400 => Some(Self::Bps38400),
            57_600 => Some(Self::Bps57600),
            115_200 => Some(Self::Bps115200),
            _ => None,
        }
    }
}

impl TryFrom<u8> for BaudRate {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Bps9600),
            0x01 => Ok(Self::Bps19200),
            0x02 => Ok(Self::Bps38400),
            0x03 => Ok(Self::Bps57600),
            0x04 => Ok(Self::Bps115200),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.to_int())
    }
}

/// Reader work mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkMode {
    /// Reader answers inventory commands from the host
    AnswerMode = 0x00,
    /// Reader inventories continuously and pushes tags
    ActiveMode = 0x01,
    /// Reader inventories while the trigger input is asserted
    TriggerMode = 0x02,
}

impl TryFrom<u8> for WorkMode {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::AnswerMode),
            0x01 => Ok(Self::ActiveMode),
            0x02 => Ok(Self::TriggerMode),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

/// Air protocol selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RfidProtocol {
    /// ISO 18000-6C / EPC Gen2
    Iso18000_6c = 0x00,
    /// GB/T 29768 national standard
    GbT29768 = 0x01,
}

impl TryFrom<u8> for RfidProtocol {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Iso18000_6c),
            0x01 => Ok(Self::GbT29768),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

/// Tag data output interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputInterface {
    /// Wiegand lines
    Wiegand = 0x00,
    /// RS-232 serial
    Rs232 = 0x01,
    /// RS-485 serial
    Rs485 = 0x02,
    /// USB endpoint pair
    Usb = 0x03,
    /// TCP/IP socket
    TcpIp = 0x04,
}

impl TryFrom<u8> for OutputInterface {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Wiegand),
            0x01 => Ok(Self::Rs232),
            0x02 => Ok(Self::Rs485),
            0x03 => Ok(Self::Usb),
            0x04 => Ok(Self::TcpIp),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

/// Wiegand frame variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WiegandProtocol {
    /// 26-bit Wiegand
    Wg26 = 0x00,
    /// 34-bit Wiegand
    Wg34 = 0x01,
}

impl TryFrom<u8> for WiegandProtocol {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Wg26),
            0x01 => Ok(Self::Wg34),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

/// Byte order of EPC data on the Wiegand lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WiegandByteFirstType {
    /// Least significant byte first
    LowByteFirst = 0x00,
    /// Most significant byte first
    HighByteFirst = 0x01,
}

impl TryFrom<u8> for WiegandByteFirstType {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::LowByteFirst),
            0x01 => Ok(Self::HighByteFirst),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

/// ISO 18000-6C session selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Session {
    /// Session S0
    Session0 = 0x00,
    /// Session S1
    Session1 = 0x01,
    /// Session S2
    Session2 = 0x02,
    /// Session S3
    Session3 = 0x03,
}

impl TryFrom<u8> for Session {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Session0),
            0x01 => Ok(Self::Session1),
            0x02 => Ok(Self::Session2),
            0x03 => Ok(Self::Session3),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

/// Tag memory banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemoryBank {
    /// Reserved memory bank (passwords)
    Reserved = 0x00,
    /// EPC memory bank
    Epc = 0x01,
    /// TID memory bank
    Tid = 0x02,
    /// User memory bank
    User = 0x03,
}

impl TryFrom<u8> for MemoryBank {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Reserved),
            0x01 => Ok(Self::Epc),
            0x02 => Ok(Self::Tid),
            0x03 => Ok(Self::User),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for MemoryBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => write!(f, "Reserved"),
            Self::Epc => write!(f, "EPC"),
            Self::Tid => write!(f, "TID"),
            Self::User => write!(f, "User"),
        }
    }
}

/// Lockable regions of tag memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LockMemoryBank {
    /// Kill password in reserved memory
    KillPassword = 0x00,
    /// Access password in reserved memory
    AccessPassword = 0x01,
    /// EPC memory bank
    Epc = 0x02,
    /// TID memory bank
    Tid = 0x03,
    /// User memory bank
    User = 0x04,
}

/// Lock state applied to a [`LockMemoryBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LockAction {
    /// Writable without a password
    Open = 0x00,
    /// Writable only with the access password
    Lock = 0x01,
    /// Permanently writable, can never be locked again
    PermanentOpen = 0x02,
    /// Permanently locked, can never be unlocked again
    PermanentLock = 0x03,
}

/// What terminates an answer-mode inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StopAfter {
    /// Stop after a number of 10 ms time units (0 = run until stopped)
    Time = 0x00,
    /// Stop after a number of inventory cycles
    Number = 0x01,
}

/// Regulatory frequency region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Region {
    /// FCC 902–928 MHz
    Usa = 0x01,
    /// ETSI 865–868 MHz
    Europe = 0x02,
    /// China band 1, 840–845 MHz
    China1 = 0x03,
    /// China band 2, 920–925 MHz
    China2 = 0x04,
    /// Korea 917–923 MHz
    Korea = 0x05,
    /// Malaysia 919–923 MHz
    Malaysia = 0x06,
}

impl TryFrom<u8> for Region {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Usa),
            0x02 => Ok(Self::Europe),
            0x03 => Ok(Self::China1),
            0x04 => Ok(Self::China2),
            0x05 => Ok(Self::Korea),
            0x06 => Ok(Self::Malaysia),
            other => Err(ParseError::UnknownStatus(other)),
        }
    }
}

/// Wiegand output block inside [`ReaderSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiegand {
    /// Whether the Wiegand output is enabled
    pub is_open: bool,
    /// Byte order on the wire
    pub byte_first_type: WiegandByteFirstType,
    /// Frame variant
    pub protocol: WiegandProtocol,
}

/// Antenna enable mask: eight booleans packed into one byte, LSB = antenna 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct Antenna {
    pub ant_1: bool,
    pub ant_2: bool,
    pub ant_3: bool,
    pub ant_4: bool,
    pub ant_5: bool,
    pub ant_6: bool,
    pub ant_7: bool,
    pub ant_8: bool,
}

impl Antenna {
    /// Mask with only antenna 1 enabled, the single-antenna default.
    #[must_use]
    pub fn one() -> Self {
        Self {
            ant_1: true,
            ..Self::default()
        }
    }

    /// Pack into the wire byte.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        let bits = [
            self.ant_1, self.ant_2, self.ant_3, self.ant_4, self.ant_5, self.ant_6, self.ant_7,
            self.ant_8,
        ];
        bits.iter()
            .enumerate()
            .fold(0u8, |acc, (i, &on)| acc | (u8::from(on) << i))
    }

    /// Unpack from the wire byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self {
            ant_1: byte & 0x01 != 0,
            ant_2: byte & 0x02 != 0,
            ant_3: byte & 0x04 != 0,
            ant_4: byte & 0x08 != 0,
            ant_5: byte & 0x10 != 0,
            ant_6: byte & 0x20 != 0,
            ant_7: byte & 0x40 != 0,
            ant_8: byte & 0x80 != 0,
        }
    }
}

/// Frequency block: region selector plus a band expressed as two 16-bit
/// values scaled to tenths of MHz (920.5 MHz encodes as 9205).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frequency {
    /// Regulatory region
    pub region: Region,
    /// Lower band edge in MHz
    pub min_frequency: f32,
    /// Upper band edge in MHz
    pub max_frequency: f32,
}

impl Frequency {
    fn scale(mhz: f32) -> u16 {
        (mhz * 10.0).round() as u16
    }

    fn unscale(raw: u16) -> f32 {
        f32::from(raw) / 10.0
    }

    /// Encode as `region | min(2 BE) | max(2 BE)`.
    #[must_use]
    pub fn to_command_data(self) -> Vec<u8> {
        let mut data = vec![self.region as u8];
        data.extend_from_slice(&Self::scale(self.min_frequency).to_be_bytes());
        data.extend_from_slice(&Self::scale(self.max_frequency).to_be_bytes());
        data
    }

    /// Decode from five payload bytes.
    ///
    /// # Errors
    /// [`ParseError::Short`] on a truncated buffer, [`ParseError::UnknownStatus`]
    /// on an unknown region selector.
    pub fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < 5 {
            return Err(ParseError::Short {
                needed: 5,
                got: body.len(),
            });
        }
        Ok(Self {
            region: Region::try_from(body[0])?,
            min_frequency: Self::unscale(u16::from_be_bytes([body[1], body[2]])),
            max_frequency: Self::unscale(u16::from_be_bytes([body[3], body[4]])),
        })
    }
}

/// The reader's complete parameter block, as carried by the get/set
/// all-params commands. Encodes to exactly [`ReaderSettings::WIRE_LEN`]
/// bytes; `from_body(to_command_data())` preserves every field.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSettings {
    /// Reader address on a shared bus
    pub address: u8,
    /// Air protocol
    pub rfid_protocol: RfidProtocol,
    /// Work mode
    pub work_mode: WorkMode,
    /// Output interface for tag data
    pub output_interface: OutputInterface,
    /// Serial line rate
    pub baud_rate: BaudRate,
    /// Wiegand output block
    pub wiegand: Wiegand,
    /// Antenna enable mask
    pub antenna: Antenna,
    /// Frequency block
    pub frequency: Frequency,
    /// Transmit power, 0–33 dBm
    pub power: u8,
    /// Memory bank pushed over the output interface
    pub output_memory_bank: MemoryBank,
    /// Anticollision Q value
    pub q_value: u8,
    /// ISO 18000-6C session
    pub session: Session,
    /// Output window start address, in words
    pub output_start_address: u8,
    /// Output window length, in bytes
    pub output_length: u8,
    /// Duplicate-filter time, in units of 10 ms
    pub filter_time: u8,
    /// Trigger hold time, in units of 10 ms
    pub trigger_time: u8,
    /// Buzzer on successful reads
    pub buzzer: bool,
    /// Pause between inventory rounds, in ms
    pub inventory_interval: u16,
}

impl ReaderSettings {
    /// Encoded parameter block length.
    pub const WIRE_LEN: usize = 25;

    /// Encode to command data for the set-all-params command.
    #[must_use]
    pub fn to_command_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::WIRE_LEN);
        data.push(self.address);
        data.push(self.rfid_protocol as u8);
        data.push(self.work_mode as u8);
        data.push(self.output_interface as u8);
        data.push(self.baud_rate as u8);
        data.push(u8::from(self.wiegand.is_open));
        data.push(self.wiegand.byte_first_type as u8);
        data.push(self.wiegand.protocol as u8);
        data.push(self.antenna.to_byte());
        data.extend_from_slice(&self.frequency.to_command_data());
        data.push(self.power);
        data.push(self.output_memory_bank as u8);
        data.push(self.q_value);
        data.push(self.session as u8);
        data.push(self.output_start_address);
        data.push(self.output_length);
        data.push(self.filter_time);
        data.push(self.trigger_time);
        data.push(u8::from(self.buzzer));
        data.extend_from_slice(&self.inventory_interval.to_be_bytes());
        data
    }

    /// Decode from a response body.
    ///
    /// # Errors
    /// [`ParseError::Short`] when fewer than [`Self::WIRE_LEN`] bytes are
    /// present, [`ParseError::UnknownStatus`] on an out-of-catalog byte.
    pub fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < Self::WIRE_LEN {
            return Err(ParseError::Short {
                needed: Self::WIRE_LEN,
                got: body.len(),
            });
        }
        Ok(Self {
            address: body[0],
            rfid_protocol: RfidProtocol::try_from(body[1])?,
            work_mode: WorkMode::try_from(body[2])?,
            output_interface: OutputInterface::try_from(body[3])?,
            baud_rate: BaudRate::try_from(body[4])?,
            wiegand: Wiegand {
                is_open: body[5] != 0,
                byte_first_type: WiegandByteFirstType::try_from(body[6])?,
                protocol: WiegandProtocol::try_from(body[7])?,
            },
            antenna: Antenna::from_byte(body[8]),
            frequency: Frequency::from_body(&body[9..14])?,
            power: body[14],
            output_memory_bank: MemoryBank::try_from(body[15])?,
            q_value: body[16],
            session: Session::try_from(body[17])?,
            output_start_address: body[18],
            output_length: body[19],
            filter_time: body[20],
            trigger_time: body[21],
            buzzer: body[22] != 0,
            inventory_interval: u16::from_be_bytes([body[23], body[24]]),
        })
    }
}

/// Local network configuration: `ip(4) | port(2 BE) | netmask(4) | gateway(4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSettings {
    /// Reader IP address
    pub ip: Ipv4Addr,
    /// Listening port
    pub port: u16,
    /// Subnet mask
    pub netmask: Ipv4Addr,
    /// Default gateway
    pub gateway: Ipv4Addr,
}

impl NetworkSettings {
    const WIRE_LEN: usize = 14;

    /// Encode to command data (without the get/set selector).
    #[must_use]
    pub fn to_command_data(self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::WIRE_LEN);
        data.extend_from_slice(&self.ip.octets());
        data.extend_from_slice(&self.port.to_be_bytes());
        data.extend_from_slice(&self.netmask.octets());
        data.extend_from_slice(&self.gateway.octets());
        data
    }

    /// Decode from a response body.
    ///
    /// # Errors
    /// [`ParseError::Short`] on a truncated buffer.
    pub fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < Self::WIRE_LEN {
            return Err(ParseError::Short {
                needed: Self::WIRE_LEN,
                got: body.len(),
            });
        }
        Ok(Self {
            ip: Ipv4Addr::new(body[0], body[1], body[2], body[3]),
            port: u16::from_be_bytes([body[4], body[5]]),
            netmask: Ipv4Addr::new(body[6], body[7], body[8], body[9]),
            gateway: Ipv4Addr::new(body[10], body[11], body[12], body[13]),
        })
    }
}

/// Remote server configuration: `enabled(1) | ip(4) | port(2 BE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteNetworkSettings {
    /// Whether the reader pushes tags to the remote server
    pub enabled: bool,
    /// Server IP address
    pub ip: Ipv4Addr,
    /// Server port
    pub port: u16,
}

impl RemoteNetworkSettings {
    const WIRE_LEN: usize = 7;

    /// Encode to command data (without the get/set selector).
    #[must_use]
    pub fn to_command_data(self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::WIRE_LEN);
        data.push(u8::from(self.enabled));
        data.extend_from_slice(&self.ip.octets());
        data.extend_from_slice(&self.port.to_be_bytes());
        data
    }

    /// Decode from a response body.
    ///
    /// # Errors
    /// [`ParseError::Short`] on a truncated buffer.
    pub fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < Self::WIRE_LEN {
            return Err(ParseError::Short {
                needed: Self::WIRE_LEN,
                got: body.len(),
            });
        }
        Ok(Self {
            enabled: body[0] != 0,
            ip: Ipv4Addr::new(body[1], body[2], body[3], body[4]),
            port: u16::from_be_bytes([body[5], body[6]]),
        })
    }
}

/// Relay and buzzer output block: `relay_open(1) | valid_time(1) | buzzer(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputControl {
    /// Relay released (true) or closed (false)
    pub relay_open: bool,
    /// Relay hold time when closing, in units of 10 ms
    pub relay_valid_time: u8,
    /// Buzzer enabled
    pub buzzer_open: bool,
}

impl OutputControl {
    const WIRE_LEN: usize = 3;

    /// Encode to command data (without the get/set selector).
    #[must_use]
    pub fn to_command_data(self) -> Vec<u8> {
        vec![
            u8::from(self.relay_open),
            self.relay_valid_time,
            u8::from(self.buzzer_open),
        ]
    }

    /// Decode from a response body.
    ///
    /// # Errors
    /// [`ParseError::Short`] on a truncated buffer.
    pub fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < Self::WIRE_LEN {
            return Err(ParseError::Short {
                needed: Self::WIRE_LEN,
                got: body.len(),
            });
        }
        Ok(Self {
            relay_open: body[0] != 0,
            relay_valid_time: body[1],
            buzzer_open: body[2] != 0,
        })
    }
}

/// Standing EPC filter applied to inventory:
/// `enabled(1) | start_address(2 BE) | length_bits(1) | mask(even-padded)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskInventoryPermission {
    /// Whether the filter is active
    pub enabled: bool,
    /// Match start address, in bytes from the start of EPC memory
    pub start_address: u16,
    /// Match pattern; odd lengths are zero-padded on the wire
    pub mask: Vec<u8>,
}

impl MaskInventoryPermission {
    /// Encode to command data (without the get/set selector).
    ///
    /// The length field counts bits of the unpadded mask.
    #[must_use]
    pub fn to_command_data(&self) -> Vec<u8> {
        let mut data = vec![u8::from(self.enabled)];
        data.extend_from_slice(&self.start_address.to_be_bytes());
        data.push((self.mask.len() * 8) as u8);
        data.extend_from_slice(&self.mask);
        if self.mask.len() % 2 != 0 {
            data.push(0x00);
        }
        data
    }

    /// Decode from a response body.
    ///
    /// # Errors
    /// [`ParseError::Short`] on a truncated buffer.
    pub fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < 4 {
            return Err(ParseError::Short {
                needed: 4,
                got: body.len(),
            });
        }
        let mask_len = usize::from(body[3]) / 8;
        if body.len() < 4 + mask_len {
            return Err(ParseError::Short {
                needed: 4 + mask_len,
                got: body.len(),
            });
        }
        Ok(Self {
            enabled: body[0] != 0,
            start_address: u16::from_be_bytes([body[1], body[2]]),
            mask: body[4..4 + mask_len].to_vec(),
        })
    }
}

/// Answer-mode inventory bound: stop after a time or a cycle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerModeInventoryParameter {
    /// Counting type
    pub stop_after: StopAfter,
    /// Time units or cycle count, per `stop_after`
    pub value: u32,
}

impl AnswerModeInventoryParameter {
    /// Bound that keeps the inventory running until explicitly stopped.
    #[must_use]
    pub fn until_stopped() -> Self {
        Self {
            stop_after: StopAfter::Time,
            value: 0,
        }
    }

    /// Encode as `stop_after(1) | value(4 BE)`.
    #[must_use]
    pub fn to_command_data(self) -> Vec<u8> {
        let mut data = vec![self.stop_after as u8];
        data.extend_from_slice(&self.value.to_be_bytes());
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> ReaderSettings {
        ReaderSettings {
            address: 0,
            rfid_protocol: RfidProtocol::Iso18000_6c,
            work_mode: WorkMode::ActiveMode,
            output_interface: OutputInterface::Usb,
            baud_rate: BaudRate::Bps115200,
            wiegand: Wiegand {
                is_open: false,
                byte_first_type: WiegandByteFirstType::LowByteFirst,
                protocol: WiegandProtocol::Wg26,
            },
            antenna: Antenna::one(),
            frequency: Frequency {
                region: Region::Malaysia,
                min_frequency: 919.5,
                max_frequency: 922.5,
            },
            power: 30,
            output_memory_bank: MemoryBank::Epc,
            q_value: 4,
            session: Session::Session0,
            output_start_address: 0,
            output_length: 12,
            filter_time: 0,
            trigger_time: 3,
            buzzer: true,
            inventory_interval: 100,
        }
    }

    #[test]
    fn reader_settings_round_trip() {
        let settings = sample_settings();
        let data = settings.to_command_data();
        assert_eq!(data.len(), ReaderSettings::WIRE_LEN);
        assert_eq!(ReaderSettings::from_body(&data).unwrap(), settings);
    }

    #[test]
    fn reader_settings_round_trip_all_enums() {
        let mut settings = sample_settings();
        settings.rfid_protocol = RfidProtocol::GbT29768;
        settings.work_mode = WorkMode::TriggerMode;
        settings.output_interface = OutputInterface::Rs485;
        settings.baud_rate = BaudRate::Bps9600;
        settings.wiegand = Wiegand {
            is_open: true,
            byte_first_type: WiegandByteFirstType::HighByteFirst,
            protocol: WiegandProtocol::Wg34,
        };
        settings.session = Session::Session3;
        settings.output_memory_bank = MemoryBank::Tid;
        settings.frequency = Frequency {
            region: Region::Europe,
            min_frequency: 865.1,
            max_frequency: 867.9,
        };
        settings.power = 33;
        settings.inventory_interval = 0xABCD;
        let data = settings.to_command_data();
        assert_eq!(ReaderSettings::from_body(&data).unwrap(), settings);
    }

    #[test]
    fn reader_settings_decode_tolerates_trailing_bytes() {
        let settings = sample_settings();
        let mut data = settings.to_command_data();
        data.extend_from_slice(&[0x00, 0x00, 0x00]);
        assert_eq!(ReaderSettings::from_body(&data).unwrap(), settings);
    }

    #[test]
    fn reader_settings_decode_rejects_short_body() {
        let data = sample_settings().to_command_data();
        assert!(matches!(
            ReaderSettings::from_body(&data[..ReaderSettings::WIRE_LEN - 1]),
            Err(ParseError::Short { .. })
        ));
    }

    #[test]
    fn antenna_mask_packs_lsb_first() {
        assert_eq!(Antenna::one().to_byte(), 0x01);
        let mask = Antenna {
            ant_1: true,
            ant_3: true,
            ant_8: true,
            ..Antenna::default()
        };
        assert_eq!(mask.to_byte(), 0b1000_0101);
        assert_eq!(Antenna::from_byte(0b1000_0101), mask);
        for byte in [0x00, 0x01, 0x55, 0xAA, 0xFF] {
            assert_eq!(Antenna::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn frequency_scales_to_tenths_of_mhz() {
        let frequency = Frequency {
            region: Region::Malaysia,
            min_frequency: 920.5,
            max_frequency: 922.5,
        };
        let data = frequency.to_command_data();
        assert_eq!(data, vec![0x06, 0x23, 0xF5, 0x24, 0x09]);
        assert_eq!(Frequency::from_body(&data).unwrap(), frequency);
    }

    #[test]
    fn baud_rate_integer_mapping() {
        assert_eq!(BaudRate::Bps115200.to_int(), 115_200);
        assert_eq!(BaudRate::from_int(9_600), Some(BaudRate::Bps9600));
        assert_eq!(BaudRate::from_int(12_345), None);
        for rate in [
            BaudRate::Bps9600,
            BaudRate::Bps19200,
            BaudRate::Bps38400,
            BaudRate::Bps57600,
            BaudRate::Bps115200,
        ] {
            assert_eq!(BaudRate::from_int(rate.to_int()), Some(rate));
        }
    }

    #[test]
    fn network_settings_round_trip() {
        let settings = NetworkSettings {
            ip: Ipv4Addr::new(192, 168, 1, 178),
            port: 6000,
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
        };
        assert_eq!(
            NetworkSettings::from_body(&settings.to_command_data()).unwrap(),
            settings
        );
    }

    #[test]
    fn remote_network_settings_round_trip() {
        let settings = RemoteNetworkSettings {
            enabled: true,
            ip: Ipv4Addr::new(10, 0, 0, 2),
            port: 9090,
        };
        assert_eq!(
            RemoteNetworkSettings::from_body(&settings.to_command_data()).unwrap(),
            settings
        );
    }

    #[test]
    fn output_control_round_trip() {
        let control = OutputControl {
            relay_open: false,
            relay_valid_time: 10,
            buzzer_open: true,
        };
        assert_eq!(
            OutputControl::from_body(&control.to_command_data()).unwrap(),
            control
        );
    }

    #[test]
    fn mask_permission_pads_odd_mask() {
        let permission = MaskInventoryPermission {
            enabled: true,
            start_address: 2,
            mask: vec![0xAA, 0xBB, 0xCC],
        };
        let data = permission.to_command_data();
        // length field counts bits of the unpadded mask
        assert_eq!(data[3], 24);
        // one zero pad byte keeps the pattern even-length on the wire
        assert_eq!(&data[4..], &[0xAA, 0xBB, 0xCC, 0x00]);
        assert_eq!(MaskInventoryPermission::from_body(&data).unwrap(), permission);
    }

    #[test]
    fn answer_mode_parameter_encodes_value_big_endian() {
        let parameter = AnswerModeInventoryParameter {
            stop_after: StopAfter::Number,
            value: 2,
        };
        assert_eq!(parameter.to_command_data(), vec![0x01, 0, 0, 0, 2]);
        assert_eq!(
            AnswerModeInventoryParameter::until_stopped().to_command_data(),
            vec![0x00, 0, 0, 0, 0]
        );
    }
}
