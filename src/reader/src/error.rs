//! Error types for transports and the protocol engine.

use std::io;

use protocol::command::CommandRequest;
use protocol::frame::ParseError;
use thiserror::Error;

/// Failures of the underlying byte channel.
///
/// `Timeout` is recoverable: the engine retries or yields a quiet tick.
/// `Disconnected` and `Io` abort the current operation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The peer is gone: unplugged device, closed socket, vanished port
    #[error("transport disconnected")]
    Disconnected,

    /// No data arrived within the configured timeout
    #[error("transport read timed out")]
    Timeout,

    /// Any other I/O failure
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<serialport::Error> for TransportError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Self::Disconnected,
            serialport::ErrorKind::Io(io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Self::Timeout
            }
            _ => Self::Io(io::Error::other(err.to_string())),
        }
    }
}

impl From<rusb::Error> for TransportError {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Timeout => Self::Timeout,
            rusb::Error::NoDevice | rusb::Error::Pipe => Self::Disconnected,
            other => Self::Io(io::Error::other(other.to_string())),
        }
    }
}

/// Engine-level failures surfaced to the caller.
///
/// A response carrying a non-success status is a valid return, not an
/// error; callers inspect `status` themselves.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The byte channel failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A received frame could not be decoded
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// No frame answered the expected opcode within the retry ceiling
    #[error("no response for {expected} after {attempts} attempts")]
    OpcodeMismatch {
        /// Opcode the engine was waiting for
        expected: CommandRequest,
        /// Attempts consumed before giving up
        attempts: usize,
    },

    /// A streaming operation is already in flight on this reader
    #[error("reader is busy with a streaming operation")]
    Busy,

    /// An argument failed validation before any I/O
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The streaming operation was ended by `stop_inventory`
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenient result alias for engine operations.
pub type Result<T> = std::result::Result<T, ReaderError>;
