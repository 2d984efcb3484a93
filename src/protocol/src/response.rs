//! Typed response parsing.
//!
//! Every response payload begins with a one-byte [`Status`] followed by
//! opcode-specific fields. Parsers keep the raw frame around and tolerate
//! extra trailing bytes; some firmware revisions append reserved fields to
//! setter acknowledgments.

use std::fmt;

use crate::command::CommandRequest;
use crate::frame::{Frame, ParseError};
use crate::reader_settings::{
    MaskInventoryPermission, NetworkSettings, OutputControl, ReaderSettings, RemoteNetworkSettings,
    RfidProtocol,
};
use crate::status::{InventoryStatus, Status};

/// A response whose frames stream until a terminator status arrives.
pub trait StreamedResponse: Sized {
    /// Parse one frame of the stream.
    ///
    /// # Errors
    /// Any [`ParseError`] from the payload parser.
    fn from_frame(frame: &Frame) -> Result<Self, ParseError>;

    /// Whether this frame ends the stream.
    fn is_terminator(&self) -> bool;
}

fn status_of(frame: &Frame) -> Result<Status, ParseError> {
    let byte = frame
        .payload
        .first()
        .copied()
        .ok_or(ParseError::Short { needed: 1, got: 0 })?;
    Status::try_from(byte)
}

/// Generic response: opcode, status, and the body after the status byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Opcode the frame answered
    pub request: CommandRequest,
    /// Status byte
    pub status: Status,
    /// Body after the status byte
    pub payload: Vec<u8>,
    /// The verified frame bytes
    pub raw: Vec<u8>,
}

impl Response {
    /// Parse a generic response from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError::UnknownOpcode`], [`ParseError::UnknownStatus`] or
    /// [`ParseError::Short`] on an empty payload.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        Ok(Self {
            request: frame.request()?,
            status: status_of(frame)?,
            payload: frame.body().to_vec(),
            raw: frame.raw.clone(),
        })
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.request, self.status)
    }
}

/// A `major.minor` version pair as reported by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Hardware and firmware identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Hardware revision
    pub hardware_version: Version,
    /// Firmware revision
    pub firmware_version: Version,
}

/// Reply to [`CommandRequest::GetDeviceInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDeviceInfo {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub device_info: Option<DeviceInfo>,
}

impl ResponseDeviceInfo {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or truncated body.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let body = frame.body();
        let device_info = if status == Status::Success {
            if body.len() < 4 {
                return Err(ParseError::Short {
                    needed: 4,
                    got: body.len(),
                });
            }
            Some(DeviceInfo {
                hardware_version: Version {
                    major: body[0],
                    minor: body[1],
                },
                firmware_version: Version {
                    major: body[2],
                    minor: body[3],
                },
            })
        } else {
            None
        };
        Ok(Self {
            status,
            device_info,
        })
    }
}

/// Reply to a get of [`CommandRequest::SetGetRfidProtocol`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseGetRfidProtocol {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub protocol: Option<RfidProtocol>,
}

impl ResponseGetRfidProtocol {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or protocol byte.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let protocol = match (status, frame.body().first()) {
            (Status::Success, Some(&byte)) => Some(RfidProtocol::try_from(byte)?),
            _ => None,
        };
        Ok(Self { status, protocol })
    }
}

/// Reply to [`CommandRequest::GetAllParam`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseReaderSettings {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub settings: Option<ReaderSettings>,
}

impl ResponseReaderSettings {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or malformed parameter block.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let settings = if status == Status::Success {
            Some(ReaderSettings::from_body(frame.body())?)
        } else {
            None
        };
        Ok(Self { status, settings })
    }
}

/// Reply to a get of [`CommandRequest::SetGetNetwork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseNetworkSettings {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub settings: Option<NetworkSettings>,
}

impl ResponseNetworkSettings {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or truncated body.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let settings = if status == Status::Success {
            Some(NetworkSettings::from_body(frame.body())?)
        } else {
            None
        };
        Ok(Self { status, settings })
    }
}

/// Reply to a get of [`CommandRequest::SetGetRemoteNetwork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRemoteNetworkSettings {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub settings: Option<RemoteNetworkSettings>,
}

impl ResponseRemoteNetworkSettings {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or truncated body.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let settings = if status == Status::Success {
            Some(RemoteNetworkSettings::from_body(frame.body())?)
        } else {
            None
        };
        Ok(Self { status, settings })
    }
}

/// Reply to [`CommandRequest::GetCurrentTemperature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCurrentTemperature {
    /// Status byte
    pub status: Status,
    /// Module temperature in °C, present on [`Status::Success`]
    pub temperature: Option<i8>,
}

impl ResponseCurrentTemperature {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status byte.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let temperature = match (status, frame.body().first()) {
            (Status::Success, Some(&byte)) => Some(byte as i8),
            _ => None,
        };
        Ok(Self {
            status,
            temperature,
        })
    }
}

/// Per-antenna power block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AntennaPower {
    /// Whether per-antenna power control is enabled
    pub enabled: bool,
    /// Power per antenna in dBm, antenna 1 first
    pub power: [u8; 8],
}

/// Reply to a get of [`CommandRequest::SetGetAntennaPower`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseGetAntennaPower {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub antenna_power: Option<AntennaPower>,
}

impl ResponseGetAntennaPower {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or truncated body.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let body = frame.body();
        let antenna_power = if status == Status::Success {
            if body.len() < 9 {
                return Err(ParseError::Short {
                    needed: 9,
                    got: body.len(),
                });
            }
            let mut power = [0u8; 8];
            power.copy_from_slice(&body[1..9]);
            Some(AntennaPower {
                enabled: body[0] != 0,
                power,
            })
        } else {
            None
        };
        Ok(Self {
            status,
            antenna_power,
        })
    }
}

/// Reply to a get of [`CommandRequest::SetGetOutputParameters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOutputControl {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub output_control: Option<OutputControl>,
}

impl ResponseOutputControl {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or truncated body.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let output_control = if status == Status::Success {
            Some(OutputControl::from_body(frame.body())?)
        } else {
            None
        };
        Ok(Self {
            status,
            output_control,
        })
    }
}

/// Reply to a get of [`CommandRequest::SetGetPermission`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMaskInventoryPermission {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub permission: Option<MaskInventoryPermission>,
}

impl ResponseMaskInventoryPermission {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or truncated body.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let permission = if status == Status::Success {
            Some(MaskInventoryPermission::from_body(frame.body())?)
        } else {
            None
        };
        Ok(Self { status, permission })
    }
}

/// EPC output window reported by [`CommandRequest::InventoryRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryRange {
    /// Window start, in bytes
    pub start_address: u8,
    /// Window length in bytes, 0 = whole EPC
    pub length: u8,
}

/// Reply to a get of [`CommandRequest::InventoryRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInventoryRange {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub range: Option<InventoryRange>,
}

impl ResponseInventoryRange {
    /// Parse from a decoded frame.
    ///
    /// # Errors
    /// [`ParseError`] on an invalid status or truncated body.
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let body = frame.body();
        let range = if status == Status::Success {
            if body.len() < 2 {
                return Err(ParseError::Short {
                    needed: 2,
                    got: body.len(),
                });
            }
            Some(InventoryRange {
                start_address: body[0],
                length: body[1],
            })
        } else {
            None
        };
        Ok(Self { status, range })
    }
}

/// Identity fields common to every tag-bearing frame:
/// `antenna(1) | crc(2 BE) | pc(2 BE) | epc_len(1) | epc(epc_len)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagData {
    /// Antenna the tag answered on, 1-based
    pub antenna: u8,
    /// CRC-16 from the tag backscatter
    pub crc: [u8; 2],
    /// Protocol control word
    pub pc: [u8; 2],
    /// Electronic Product Code bytes
    pub epc: Vec<u8>,
}

impl TagData {
    /// Parse the identity fields, returning the remaining body bytes.
    fn parse(body: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        if body.len() < 6 {
            return Err(ParseError::Short {
                needed: 6,
                got: body.len(),
            });
        }
        let epc_len = usize::from(body[5]);
        if body.len() < 6 + epc_len {
            return Err(ParseError::Short {
                needed: 6 + epc_len,
                got: body.len(),
            });
        }
        let tag = Self {
            antenna: body[0],
            crc: [body[1], body[2]],
            pc: [body[3], body[4]],
            epc: body[6..6 + epc_len].to_vec(),
        };
        Ok((tag, &body[6 + epc_len..]))
    }
}

impl fmt::Display for TagData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EPC {} (antenna {})",
            hex::encode_upper(&self.epc),
            self.antenna
        )
    }
}

/// One tag sighting from an inventory frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryTag {
    /// Antenna the tag answered on, 1-based
    pub antenna: u8,
    /// CRC-16 from the tag backscatter
    pub crc: [u8; 2],
    /// Protocol control word
    pub pc: [u8; 2],
    /// Electronic Product Code bytes
    pub epc: Vec<u8>,
    /// Raw RSSI byte as reported by the reader
    pub rssi: u8,
}

impl fmt::Display for InventoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EPC {} (antenna {}, rssi {})",
            hex::encode_upper(&self.epc),
            self.antenna,
            self.rssi
        )
    }
}

/// One frame of an inventory stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInventory {
    /// Inventory status byte
    pub status: InventoryStatus,
    /// Present on [`InventoryStatus::Success`]
    pub tag: Option<InventoryTag>,
}

impl StreamedResponse for ResponseInventory {
    fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let byte = frame
            .payload
            .first()
            .copied()
            .ok_or(ParseError::Short { needed: 1, got: 0 })?;
        let status = InventoryStatus::try_from(byte)?;
        let tag = if status == InventoryStatus::Success {
            let (tag, rest) = TagData::parse(frame.body())?;
            let rssi = rest.first().copied().ok_or(ParseError::Short {
                needed: frame.body().len() + 1,
                got: frame.body().len(),
            })?;
            Some(InventoryTag {
                antenna: tag.antenna,
                crc: tag.crc,
                pc: tag.pc,
                epc: tag.epc,
                rssi,
            })
        } else {
            None
        };
        Ok(Self { status, tag })
    }

    fn is_terminator(&self) -> bool {
        self.status == InventoryStatus::NoCountLabel
    }
}

/// One frame of a read-memory stream: tag identity plus the words read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseReadMemory {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub tag: Option<TagData>,
    /// Data words read from the tag, empty unless successful
    pub data: Vec<u8>,
}

impl StreamedResponse for ResponseReadMemory {
    fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let (tag, data) = if status == Status::Success {
            let (tag, rest) = TagData::parse(frame.body())?;
            let word_count = usize::from(rest.first().copied().ok_or(ParseError::Short {
                needed: 1,
                got: 0,
            })?);
            let byte_count = word_count * 2;
            if rest.len() < 1 + byte_count {
                return Err(ParseError::Short {
                    needed: 1 + byte_count,
                    got: rest.len(),
                });
            }
            (Some(tag), rest[1..1 + byte_count].to_vec())
        } else {
            (None, Vec::new())
        };
        Ok(Self { status, tag, data })
    }

    fn is_terminator(&self) -> bool {
        self.status == Status::NoCountLabel
    }
}

/// One frame of a write-memory stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseWriteMemory {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub tag: Option<TagData>,
}

impl StreamedResponse for ResponseWriteMemory {
    fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let tag = if status == Status::Success {
            Some(TagData::parse(frame.body())?.0)
        } else {
            None
        };
        Ok(Self { status, tag })
    }

    fn is_terminator(&self) -> bool {
        self.status == Status::NoCountLabel
    }
}

/// One frame of a lock-memory stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLockMemory {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub tag: Option<TagData>,
}

impl StreamedResponse for ResponseLockMemory {
    fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let tag = if status == Status::Success {
            Some(TagData::parse(frame.body())?.0)
        } else {
            None
        };
        Ok(Self { status, tag })
    }

    fn is_terminator(&self) -> bool {
        self.status == Status::NoCountLabel
    }
}

/// One frame of a kill-tag stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseKillTag {
    /// Status byte
    pub status: Status,
    /// Present on [`Status::Success`]
    pub tag: Option<TagData>,
}

impl StreamedResponse for ResponseKillTag {
    fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let status = status_of(frame)?;
        let tag = if status == Status::Success {
            Some(TagData::parse(frame.body())?.0)
        } else {
            None
        };
        Ok(Self { status, tag })
    }

    fn is_terminator(&self) -> bool {
        self.status == Status::NoCountLabel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{checksum, HEADER};

    fn build_frame(opcode: u16, payload: &[u8]) -> Frame {
        let mut bytes = vec![HEADER, 0x00];
        bytes.extend_from_slice(&opcode.to_be_bytes());
        bytes.push(payload.len() as u8);
        bytes.extend_from_slice(payload);
        let ck = checksum(&bytes);
        bytes.extend_from_slice(&ck.to_le_bytes());
        Frame::decode(&bytes).unwrap()
    }

    fn inventory_payload(epc: &[u8], rssi: u8) -> Vec<u8> {
        let mut payload = vec![0x00, 0x01, 0x34, 0x12, 0x30, 0x00];
        payload.push(epc.len() as u8);
        payload.extend_from_slice(epc);
        payload.push(rssi);
        payload
    }

    #[test]
    fn generic_response_parses_status_and_body() {
        let frame = build_frame(0x0053, &[0x00, 0xAB]);
        let response = Response::from_frame(&frame).unwrap();
        assert_eq!(response.request, CommandRequest::SetPower);
        assert_eq!(response.status, Status::Success);
        assert_eq!(response.payload, vec![0xAB]);
        assert_eq!(response.raw, frame.raw);
    }

    #[test]
    fn device_info_parses_versions() {
        let frame = build_frame(0x0068, &[0x00, 0x01, 0x02, 0x03, 0x04]);
        let response = ResponseDeviceInfo::from_frame(&frame).unwrap();
        assert_eq!(response.status, Status::Success);
        let info = response.device_info.unwrap();
        assert_eq!(info.hardware_version.to_string(), "1.2");
        assert_eq!(info.firmware_version.to_string(), "3.4");
    }

    #[test]
    fn device_info_tolerates_trailing_bytes() {
        let frame = build_frame(0x0068, &[0x00, 0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB]);
        let response = ResponseDeviceInfo::from_frame(&frame).unwrap();
        assert!(response.device_info.is_some());
    }

    #[test]
    fn failed_device_info_has_no_payload() {
        let frame = build_frame(0x0068, &[0x02]);
        let response = ResponseDeviceInfo::from_frame(&frame).unwrap();
        assert_eq!(response.status, Status::ExecutionFailed);
        assert_eq!(response.device_info, None);
    }

    #[test]
    fn inventory_success_frame_carries_tag() {
        let epc = [0xE2, 0x00, 0x47, 0x0F, 0x5C, 0x60];
        let frame = build_frame(0x0001, &inventory_payload(&epc, 0xC5));
        let response = ResponseInventory::from_frame(&frame).unwrap();
        assert_eq!(response.status, InventoryStatus::Success);
        assert!(!response.is_terminator());
        let tag = response.tag.unwrap();
        assert_eq!(tag.antenna, 0x01);
        assert_eq!(tag.crc, [0x34, 0x12]);
        assert_eq!(tag.pc, [0x30, 0x00]);
        assert_eq!(tag.epc, epc);
        assert_eq!(tag.rssi, 0xC5);
    }

    #[test]
    fn inventory_terminator_frame_has_no_tag() {
        let frame = build_frame(0x0001, &[InventoryStatus::NoCountLabel as u8]);
        let response = ResponseInventory::from_frame(&frame).unwrap();
        assert_eq!(response.status, InventoryStatus::NoCountLabel);
        assert_eq!(response.tag, None);
        assert!(response.is_terminator());
    }

    #[test]
    fn inventory_truncated_epc_is_rejected() {
        let mut payload = inventory_payload(&[0x11, 0x22, 0x33, 0x44], 0xC0);
        payload[6] = 0x0C; // claim a 12-byte EPC
        let frame = build_frame(0x0001, &payload);
        assert!(matches!(
            ResponseInventory::from_frame(&frame),
            Err(ParseError::Short { .. })
        ));
    }

    #[test]
    fn read_memory_frame_carries_words() {
        let mut payload = vec![0x00, 0x01, 0x34, 0x12, 0x30, 0x00, 0x02, 0xAA, 0xBB];
        payload.push(0x02); // two words
        payload.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        let frame = build_frame(0x0084, &payload);
        let response = ResponseReadMemory::from_frame(&frame).unwrap();
        assert_eq!(response.status, Status::Success);
        assert_eq!(response.tag.unwrap().epc, vec![0xAA, 0xBB]);
        assert_eq!(response.data, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn write_memory_terminator() {
        let frame = build_frame(0x0085, &[Status::NoCountLabel as u8]);
        let response = ResponseWriteMemory::from_frame(&frame).unwrap();
        assert!(response.is_terminator());
        assert_eq!(response.tag, None);
    }

    #[test]
    fn tag_status_errors_propagate_verbatim() {
        let frame = build_frame(0x0086, &[Status::AccessPasswordError as u8]);
        let response = ResponseLockMemory::from_frame(&frame).unwrap();
        assert_eq!(response.status, Status::AccessPasswordError);
        assert!(!response.is_terminator());

        let frame = build_frame(0x0087, &[Status::KillPasswordError as u8]);
        let response = ResponseKillTag::from_frame(&frame).unwrap();
        assert_eq!(response.status, Status::KillPasswordError);
    }
}
