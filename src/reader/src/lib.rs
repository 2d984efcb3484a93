//! Transport layer and protocol engine for CF-family UHF RFID readers.
//!
//! The [`transport`] module provides the three interchangeable byte
//! channels (serial, USB bulk endpoints, TCP) together with device
//! scanning helpers. The [`reader`] module drives the wire protocol over
//! one of them: request/response correlation for one-shot commands and
//! lazy streaming for inventory and tag memory operations.

/// Error taxonomy shared by transports and the engine
pub mod error;

/// The protocol engine: request correlation and streaming replies
pub mod reader;

/// Byte-level duplex channels and scanning helpers
pub mod transport;
