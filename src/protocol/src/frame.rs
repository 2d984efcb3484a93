//! Frame encoding and decoding.
//!
//! One frame on the wire, in both directions:
//!
//! ```text
//! HEADER(1) | ADDRESS(1) | OPCODE(2, BE) | LENGTH(1) | PAYLOAD(LENGTH) | CHECKSUM(2, LE)
//! ```
//!
//! The checksum covers HEADER through PAYLOAD inclusive and must match the
//! firmware's CRC routine bit-exactly.

use thiserror::Error;

use crate::command::CommandRequest;

/// Fixed sentinel byte opening every frame.
pub const HEADER: u8 = 0xCF;

/// Reader address used when none is specified.
pub const DEFAULT_ADDRESS: u8 = 0x00;

/// Fixed-size prefix: header, address, opcode (2), length.
pub const PREFIX_LEN: usize = 5;

/// Trailing checksum size.
pub const CHECKSUM_LEN: usize = 2;

/// LENGTH is a single byte; larger payloads are unrepresentable.
pub const MAX_PAYLOAD_LEN: usize = 0xFF;

/// Errors produced while decoding a response frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// First byte of the buffer is not the frame sentinel
    #[error("bad frame header: {0:#04x}")]
    BadHeader(u8),

    /// Buffer ends before the declared frame length
    #[error("short frame: need {needed} bytes, got {got}")]
    Short {
        /// Declared total frame length
        needed: usize,
        /// Bytes actually available
        got: usize,
    },

    /// Received checksum does not match the computed one
    #[error("checksum mismatch: computed {computed:#06x}, received {received:#06x}")]
    BadChecksum {
        /// Checksum computed over the received bytes
        computed: u16,
        /// Checksum carried by the frame
        received: u16,
    },

    /// Opcode is not part of the command catalog
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),

    /// Status byte is not part of the status catalog
    #[error("unknown status: {0:#04x}")]
    UnknownStatus(u8),
}

/// CRC-16/MCRF4XX over `data`: init `0xFFFF`, reflected polynomial `0x8408`,
/// no final xor. This is the routine the reader firmware uses.
#[must_use]
pub fn checksum(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 0x0001 == 0 {
                crc >>= 1;
            } else {
                crc = (crc >> 1) ^ 0x8408;
            }
        }
    }
    crc
}

/// Declared total frame length derived from a buffer holding at least the
/// fixed prefix. `None` if the buffer is shorter than the prefix.
#[must_use]
pub fn declared_frame_len(buffer: &[u8]) -> Option<usize> {
    if buffer.len() < PREFIX_LEN {
        return None;
    }
    Some(PREFIX_LEN + usize::from(buffer[4]) + CHECKSUM_LEN)
}

/// An outgoing request: opcode plus optional payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command opcode
    pub request: CommandRequest,
    /// Destination reader address
    pub address: u8,
    /// Payload bytes, at most [`MAX_PAYLOAD_LEN`]
    pub data: Vec<u8>,
}

impl Command {
    /// Command without payload, addressed to [`DEFAULT_ADDRESS`].
    #[must_use]
    pub fn new(request: CommandRequest) -> Self {
        Self::with_data(request, Vec::new())
    }

    /// Command with payload, addressed to [`DEFAULT_ADDRESS`].
    ///
    /// The caller validates the payload length; the engine rejects
    /// oversized arguments before a `Command` is ever built.
    #[must_use]
    pub fn with_data(request: CommandRequest, data: Vec<u8>) -> Self {
        debug_assert!(data.len() <= MAX_PAYLOAD_LEN);
        Self {
            request,
            address: DEFAULT_ADDRESS,
            data,
        }
    }

    /// Serialize to wire bytes, checksum included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let opcode = self.request.value().to_be_bytes();
        let mut out = Vec::with_capacity(PREFIX_LEN + self.data.len() + CHECKSUM_LEN);
        out.push(HEADER);
        out.push(self.address);
        out.extend_from_slice(&opcode);
        out.push(self.data.len() as u8);
        out.extend_from_slice(&self.data);
        let ck = checksum(&out);
        out.extend_from_slice(&ck.to_le_bytes());
        out
    }
}

/// One parsed response frame. `payload` starts with the status byte;
/// `raw` keeps the exact bytes the checksum was verified over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Responding reader address
    pub address: u8,
    /// Raw 16-bit opcode as received
    pub opcode: u16,
    /// Payload bytes (status byte first)
    pub payload: Vec<u8>,
    /// The verified frame bytes
    pub raw: Vec<u8>,
}

impl Frame {
    /// Decode one frame from `buffer`.
    ///
    /// Verification order: header sentinel, declared length, checksum.
    /// Trailing bytes beyond the declared frame length are ignored.
    ///
    /// # Errors
    /// [`ParseError::BadHeader`] when the buffer is empty or does not open
    /// with the sentinel, [`ParseError::Short`] when the declared length
    /// exceeds the buffer, [`ParseError::BadChecksum`] on checksum mismatch.
    pub fn decode(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.is_empty() || buffer[0] != HEADER {
            return Err(ParseError::BadHeader(buffer.first().copied().unwrap_or(0)));
        }

        let total = declared_frame_len(buffer).ok_or(ParseError::Short {
            needed: PREFIX_LEN + CHECKSUM_LEN,
            got: buffer.len(),
        })?;
        if buffer.len() < total {
            return Err(ParseError::Short {
                needed: total,
                got: buffer.len(),
            });
        }

        let frame = &buffer[..total];
        let computed = checksum(&frame[..total - CHECKSUM_LEN]);
        let received = u16::from_le_bytes([frame[total - 2], frame[total - 1]]);
        if computed != received {
            return Err(ParseError::BadChecksum { computed, received });
        }

        Ok(Self {
            address: frame[1],
            opcode: u16::from_be_bytes([frame[2], frame[3]]),
            payload: frame[PREFIX_LEN..total - CHECKSUM_LEN].to_vec(),
            raw: frame.to_vec(),
        })
    }

    /// The opcode resolved against the command catalog.
    ///
    /// # Errors
    /// [`ParseError::UnknownOpcode`] for opcodes outside the catalog.
    pub fn request(&self) -> Result<CommandRequest, ParseError> {
        CommandRequest::try_from(self.opcode)
    }

    /// Payload bytes after the status byte.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        if self.payload.is_empty() {
            &[]
        } else {
            &self.payload[1..]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_frame(opcode: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![HEADER, DEFAULT_ADDRESS];
        out.extend_from_slice(&opcode.to_be_bytes());
        out.push(payload.len() as u8);
        out.extend_from_slice(payload);
        let ck = checksum(&out);
        out.extend_from_slice(&ck.to_le_bytes());
        out
    }

    #[test]
    fn checksum_known_vector() {
        // CRC-16/MCRF4XX check value for "123456789"
        assert_eq!(checksum(b"123456789"), 0x6F91);
        assert_eq!(checksum(&[]), 0xFFFF);
    }

    #[test]
    fn serialize_get_device_info() {
        let cmd = Command::new(CommandRequest::GetDeviceInfo);
        let bytes = cmd.serialize();
        assert_eq!(&bytes[..5], &[HEADER, 0x00, 0x00, 0x68, 0x00]);
        assert_eq!(bytes.len(), 7);
        let ck = checksum(&bytes[..5]);
        assert_eq!(&bytes[5..], &ck.to_le_bytes());
    }

    #[test]
    fn decode_round_trips_serialize() {
        let cmd = Command::with_data(CommandRequest::SetPower, vec![0x1E, 0x00]);
        let bytes = cmd.serialize();
        let frame = Frame::decode(&bytes).unwrap();
        assert_eq!(frame.address, DEFAULT_ADDRESS);
        assert_eq!(frame.opcode, CommandRequest::SetPower.value());
        assert_eq!(frame.payload, vec![0x1E, 0x00]);
        assert_eq!(frame.raw, bytes);
    }

    #[test]
    fn decode_rejects_bad_header() {
        assert_eq!(Frame::decode(&[]), Err(ParseError::BadHeader(0)));
        let mut bytes = build_frame(0x0068, &[0x00]);
        bytes[0] = 0xFF;
        assert_eq!(Frame::decode(&bytes), Err(ParseError::BadHeader(0xFF)));
    }

    #[test]
    fn decode_rejects_short_frame() {
        let bytes = build_frame(0x0068, &[0x00, 0x01, 0x02]);
        assert!(matches!(
            Frame::decode(&bytes[..bytes.len() - 3]),
            Err(ParseError::Short { .. })
        ));
        assert!(matches!(
            Frame::decode(&bytes[..3]),
            Err(ParseError::Short { .. })
        ));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let mut bytes = build_frame(0x0068, &[0x00]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            Frame::decode(&bytes),
            Err(ParseError::BadChecksum { .. })
        ));
    }

    #[test]
    fn any_single_byte_flip_is_detected() {
        let bytes = build_frame(0x0001, &[0x00, 0x12, 0x34, 0x56]);
        for index in 0..bytes.len() - CHECKSUM_LEN {
            for bit in 0..8 {
                let mut corrupted = bytes.clone();
                corrupted[index] ^= 1 << bit;
                let result = Frame::decode(&corrupted);
                assert!(result.is_err(), "flip at byte {index} bit {bit} accepted");
            }
        }
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut bytes = build_frame(0x0068, &[0x00, 0xAA]);
        let expected = Frame::decode(&bytes).unwrap();
        bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(Frame::decode(&bytes).unwrap(), expected);
    }

    #[test]
    fn declared_len_needs_full_prefix() {
        assert_eq!(declared_frame_len(&[HEADER, 0, 0]), None);
        assert_eq!(declared_frame_len(&[HEADER, 0, 0, 0x68, 10]), Some(17));
    }
}
