//! Byte-level duplex channels: serial line, USB bulk endpoint pair, TCP
//! socket, plus scanning helpers for the first two.
//!
//! The three variants share a write path but differ in how frames are
//! reassembled: serial and TCP are length-driven (the engine asks for the
//! 5-byte prefix, then the declared body), USB is packet-driven (one read
//! returns one bulk packet). [`Transport::framing`] tells the engine which
//! rule applies. A timeout or short read yields a possibly-empty buffer
//! and is never fatal.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info};
use protocol::reader_settings::BaudRate;
use serialport::SerialPort;

use crate::error::TransportError;

/// USB vendor ID of the reader.
pub const VENDOR_ID: u16 = 0x0483;

/// USB product ID of the reader.
pub const PRODUCT_ID: u16 = 0x5750;

/// Fallback bulk packet size when the descriptor cannot be read.
const DEFAULT_MAX_PACKET_SIZE: usize = 64;

/// How the connection is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    /// Serial line, 8-N-1
    Serial,
    /// USB bulk endpoint pair
    Usb,
    /// TCP socket
    TcpIp,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "Serial"),
            Self::Usb => write!(f, "USB"),
            Self::TcpIp => write!(f, "TCP/IP"),
        }
    }
}

/// Frame reassembly rule of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Reads deliver the requested number of bytes (or fewer on timeout)
    LengthDriven,
    /// Reads deliver one opaque packet up to the endpoint packet size
    PacketDriven,
}

/// Serial transport: 8 data bits, no parity, one stop bit.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    port_name: String,
    baud_rate: BaudRate,
    timeout: Duration,
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port_name", &self.port_name)
            .field("baud_rate", &self.baud_rate)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SerialTransport {
    /// Open a serial port at the given rate.
    ///
    /// # Errors
    /// [`TransportError`] when the port cannot be opened or configured.
    pub fn connect(
        port_name: &str,
        baud_rate: BaudRate,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, baud_rate.to_int())
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()?;
        info!("opened serial port {port_name} at {baud_rate}");
        Ok(Self {
            port,
            port_name: port_name.to_string(),
            baud_rate,
            timeout,
        })
    }

    /// Candidate serial ports on this machine.
    ///
    /// # Errors
    /// [`TransportError`] when enumeration itself fails.
    pub fn scan() -> Result<Vec<String>, TransportError> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    /// Reopen the port, optionally with new parameters.
    ///
    /// # Errors
    /// [`TransportError`] when the port cannot be reopened.
    pub fn reconnect(
        &mut self,
        port_name: Option<&str>,
        baud_rate: Option<BaudRate>,
        timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        let port_name = port_name.unwrap_or(&self.port_name).to_string();
        let baud_rate = baud_rate.unwrap_or(self.baud_rate);
        let timeout = timeout.unwrap_or(self.timeout);
        *self = Self::connect(&port_name, baud_rate, timeout)?;
        Ok(())
    }

    /// Read up to `length` bytes, blocking until they arrive or the
    /// configured timeout elapses. Returns what arrived, possibly nothing.
    fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; length];
        let mut filled = 0;
        while filled < length {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    break;
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    /// Drop everything pending in both directions.
    fn clear_buffer(&mut self) -> Result<(), TransportError> {
        self.port.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }
}

/// Bus and device number identifying one USB device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAddress {
    /// Bus number
    pub bus: u8,
    /// Device address on the bus
    pub address: u8,
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bus: {}, Address: {}", self.bus, self.address)
    }
}

/// USB transport over one bulk IN / bulk OUT endpoint pair.
pub struct UsbTransport {
    handle: rusb::DeviceHandle<rusb::GlobalContext>,
    device_address: DeviceAddress,
    ep_in: u8,
    ep_out: u8,
    max_packet_size: usize,
    timeout: Duration,
    closed: bool,
}

impl fmt::Debug for UsbTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsbTransport")
            .field("device_address", &self.device_address)
            .field("ep_in", &self.ep_in)
            .field("ep_out", &self.ep_out)
            .field("max_packet_size", &self.max_packet_size)
            .finish_non_exhaustive()
    }
}

impl UsbTransport {
    /// Devices matching the reader's vendor/product ID pair.
    ///
    /// # Errors
    /// [`TransportError`] when the bus cannot be enumerated.
    pub fn scan() -> Result<Vec<DeviceAddress>, TransportError> {
        let mut found = Vec::new();
        for device in rusb::devices()?.iter() {
            let Ok(descriptor) = device.device_descriptor() else {
                continue;
            };
            if descriptor.vendor_id() == VENDOR_ID && descriptor.product_id() == PRODUCT_ID {
                found.push(DeviceAddress {
                    bus: device.bus_number(),
                    address: device.address(),
                });
            }
        }
        Ok(found)
    }

    /// Open the device at `device_address` and claim its interface.
    ///
    /// On Linux and macOS the kernel driver is detached first and
    /// re-attached when the transport closes.
    ///
    /// # Errors
    /// [`TransportError::Disconnected`] when no device sits at that
    /// address, any other [`TransportError`] on open/claim failure.
    pub fn connect(
        device_address: DeviceAddress,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        for device in rusb::devices()?.iter() {
            if device.bus_number() != device_address.bus
                || device.address() != device_address.address
            {
                continue;
            }

            let handle = device.open()?;

            #[cfg(any(target_os = "linux", target_os = "macos"))]
            if handle.kernel_driver_active(0).unwrap_or(false) {
                handle.detach_kernel_driver(0)?;
            }

            handle.claim_interface(0)?;

            let config = device.active_config_descriptor()?;
            let mut ep_in = None;
            let mut ep_out = None;
            let mut max_packet_size = DEFAULT_MAX_PACKET_SIZE;
            for interface in config.interfaces() {
                for descriptor in interface.descriptors() {
                    for endpoint in descriptor.endpoint_descriptors() {
                        if endpoint.transfer_type() != rusb::TransferType::Bulk {
                            continue;
                        }
                        match endpoint.direction() {
                            rusb::Direction::In => {
                                ep_in = Some(endpoint.address());
                                max_packet_size = usize::from(endpoint.max_packet_size());
                            }
                            rusb::Direction::Out => ep_out = Some(endpoint.address()),
                        }
                    }
                }
            }

            let (Some(ep_in), Some(ep_out)) = (ep_in, ep_out) else {
                return Err(TransportError::Io(io::Error::other(
                    "no bulk endpoint pair on interface 0",
                )));
            };

            info!(
                "opened USB device at {device_address}, \
                 ep_in={ep_in:#04x} ep_out={ep_out:#04x} max_packet={max_packet_size}"
            );
            return Ok(Self {
                handle,
                device_address,
                ep_in,
                ep_out,
                max_packet_size,
                timeout,
                closed: false,
            });
        }
        Err(TransportError::Disconnected)
    }

    /// Close and reopen the device. After a close/reattach cycle the
    /// device address may change, so with no explicit address the bus is
    /// scanned again.
    ///
    /// # Errors
    /// [`TransportError`] when no device is found or the open fails.
    pub fn reconnect(
        &mut self,
        device_address: Option<DeviceAddress>,
    ) -> Result<(), TransportError> {
        self.close();
        let device_address = match device_address {
            Some(address) => address,
            None => Self::scan()?
                .into_iter()
                .next()
                .unwrap_or(self.device_address),
        };
        *self = Self::connect(device_address, self.timeout)?;
        Ok(())
    }

    /// Read one bulk packet. Empty on timeout.
    fn read_packet(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; self.max_packet_size];
        match self.handle.read_bulk(self.ep_in, &mut buf, self.timeout) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(rusb::Error::Timeout) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut written = 0;
        while written < data.len() {
            written += self
                .handle
                .write_bulk(self.ep_out, &data[written..], self.timeout)?;
        }
        Ok(())
    }

    /// Release the interface and hand the device back to the kernel.
    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.handle.release_interface(0);
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        let _ = self.handle.attach_kernel_driver(0);
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// TCP transport: blocking IPv4 socket with a configurable timeout.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpTransport {
    /// Connect to `host:port`.
    ///
    /// # Errors
    /// [`TransportError`] when resolution or connection fails.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, TransportError> {
        let address = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or(TransportError::Disconnected)?;
        let stream = TcpStream::connect_timeout(&address, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        info!("connected to {host}:{port}");
        Ok(Self {
            stream,
            host: host.to_string(),
            port,
            timeout,
        })
    }

    /// Drop the socket and connect again, optionally elsewhere.
    ///
    /// # Errors
    /// [`TransportError`] when the new connection fails.
    pub fn reconnect(
        &mut self,
        host: Option<&str>,
        port: Option<u16>,
        timeout: Option<Duration>,
    ) -> Result<(), TransportError> {
        let _ = self.stream.shutdown(Shutdown::Both);
        let host = host.unwrap_or(&self.host).to_string();
        let port = port.unwrap_or(self.port);
        let timeout = timeout.unwrap_or(self.timeout);
        *self = Self::connect(&host, port, timeout)?;
        Ok(())
    }

    /// One `recv` of up to `length` bytes. Empty on timeout.
    fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; length];
        match self.stream.read(&mut buf) {
            Ok(0) => Err(TransportError::Disconnected),
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e)
                if e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(data)?;
        Ok(())
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// A connected byte channel, tagged by kind.
///
/// The engine owns exactly one of these per reader and is the only code
/// that reads, writes or flushes it.
#[derive(Debug)]
pub enum Transport {
    /// Serial line
    Serial(SerialTransport),
    /// USB bulk endpoints
    Usb(UsbTransport),
    /// TCP socket
    Tcp(TcpTransport),
    /// Scripted transport for engine tests
    #[cfg(test)]
    Mock(mock::MockTransport),
}

impl Transport {
    /// The connection kind.
    #[must_use]
    pub fn connection_type(&self) -> ConnectionType {
        match self {
            Self::Serial(_) => ConnectionType::Serial,
            Self::Usb(_) => ConnectionType::Usb,
            Self::Tcp(_) => ConnectionType::TcpIp,
            #[cfg(test)]
            Self::Mock(mock) => mock.connection_type(),
        }
    }

    /// The frame reassembly rule the engine must apply.
    #[must_use]
    pub fn framing(&self) -> Framing {
        match self {
            Self::Serial(_) | Self::Tcp(_) => Framing::LengthDriven,
            Self::Usb(_) => Framing::PacketDriven,
            #[cfg(test)]
            Self::Mock(mock) => mock.framing,
        }
    }

    /// Read up to `length` bytes from a length-driven transport.
    /// On a packet-driven transport this reads one packet instead.
    ///
    /// # Errors
    /// [`TransportError`] on an unrecoverable channel failure. Timeouts
    /// return an empty buffer.
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, TransportError> {
        match self {
            Self::Serial(serial) => serial.read_bytes(length),
            Self::Tcp(tcp) => tcp.read_bytes(length),
            Self::Usb(usb) => usb.read_packet(),
            #[cfg(test)]
            Self::Mock(mock) => mock.read(length),
        }
    }

    /// Read one bulk packet from a packet-driven transport.
    ///
    /// # Errors
    /// [`TransportError`] on an unrecoverable channel failure.
    pub fn read_packet(&mut self) -> Result<Vec<u8>, TransportError> {
        match self {
            Self::Usb(usb) => usb.read_packet(),
            Self::Serial(serial) => serial.read_bytes(DEFAULT_MAX_PACKET_SIZE),
            Self::Tcp(tcp) => tcp.read_bytes(DEFAULT_MAX_PACKET_SIZE),
            #[cfg(test)]
            Self::Mock(mock) => mock.read_packet(),
        }
    }

    /// Write the whole buffer.
    ///
    /// # Errors
    /// [`TransportError`] when the write fails.
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        debug!("tx {}", hex::encode_upper(data));
        match self {
            Self::Serial(serial) => serial.write_all(data),
            Self::Usb(usb) => usb.write_all(data),
            Self::Tcp(tcp) => tcp.write_all(data),
            #[cfg(test)]
            Self::Mock(mock) => mock.write_all(data),
        }
    }

    /// Discard pending input. Serial flushes both directions; USB and TCP
    /// have no host-side buffer to flush, so this is a no-op for them.
    ///
    /// # Errors
    /// [`TransportError`] when the serial flush fails.
    pub fn clear_buffer(&mut self) -> Result<(), TransportError> {
        match self {
            Self::Serial(serial) => serial.clear_buffer(),
            Self::Usb(_) | Self::Tcp(_) => Ok(()),
            #[cfg(test)]
            Self::Mock(mock) => {
                mock.flushes += 1;
                Ok(())
            }
        }
    }

    /// Re-establish the channel with its stored parameters.
    ///
    /// # Errors
    /// [`TransportError`] when the channel cannot be reopened.
    pub fn reconnect(&mut self) -> Result<(), TransportError> {
        match self {
            Self::Serial(serial) => serial.reconnect(None, None, None),
            Self::Usb(usb) => usb.reconnect(None),
            Self::Tcp(tcp) => tcp.reconnect(None, None, None),
            #[cfg(test)]
            Self::Mock(_) => Ok(()),
        }
    }

    /// Close the channel. USB releases its interface and re-attaches the
    /// kernel driver; serial and TCP close with the handle.
    pub fn close(mut self) {
        match &mut self {
            Self::Usb(usb) => usb.close(),
            Self::Tcp(tcp) => tcp.close(),
            Self::Serial(_) => {}
            #[cfg(test)]
            Self::Mock(_) => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted transport for engine tests: queued read chunks stand in
    //! for the device, writes and flushes are recorded for assertions.

    use std::collections::VecDeque;

    use super::{ConnectionType, Framing};
    use crate::error::TransportError;

    /// One scripted read outcome.
    pub enum Step {
        /// Bytes the device "sent"; an empty chunk models a timeout tick
        Data(Vec<u8>),
        /// A hard channel failure
        Fail(TransportError),
    }

    pub struct MockTransport {
        pub framing: Framing,
        steps: VecDeque<Step>,
        cursor: usize,
        pub written: Vec<Vec<u8>>,
        pub flushes: usize,
    }

    impl std::fmt::Debug for MockTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockTransport")
                .field("framing", &self.framing)
                .field("pending_steps", &self.steps.len())
                .finish_non_exhaustive()
        }
    }

    impl MockTransport {
        pub fn length_driven() -> Self {
            Self::new(Framing::LengthDriven)
        }

        pub fn packet_driven() -> Self {
            Self::new(Framing::PacketDriven)
        }

        fn new(framing: Framing) -> Self {
            Self {
                framing,
                steps: VecDeque::new(),
                cursor: 0,
                written: Vec::new(),
                flushes: 0,
            }
        }

        pub fn connection_type(&self) -> ConnectionType {
            match self.framing {
                Framing::LengthDriven => ConnectionType::Serial,
                Framing::PacketDriven => ConnectionType::Usb,
            }
        }

        /// Queue bytes for a future read.
        pub fn push_data(&mut self, data: impl Into<Vec<u8>>) {
            self.steps.push_back(Step::Data(data.into()));
        }

        /// Queue an empty read, i.e. one timeout tick.
        pub fn push_timeout(&mut self) {
            self.steps.push_back(Step::Data(Vec::new()));
        }

        /// Queue a hard failure.
        pub fn push_failure(&mut self, error: TransportError) {
            self.steps.push_back(Step::Fail(error));
        }

        /// Length-driven read: takes up to `length` bytes from the front
        /// chunk, never crossing a chunk boundary (a chunk models what the
        /// line had buffered at that instant).
        pub fn read(&mut self, length: usize) -> Result<Vec<u8>, TransportError> {
            if matches!(self.steps.front(), Some(Step::Fail(_))) {
                let Some(Step::Fail(error)) = self.steps.pop_front() else {
                    unreachable!()
                };
                return Err(error);
            }
            let cursor = self.cursor;
            let Some(Step::Data(chunk)) = self.steps.front() else {
                return Ok(Vec::new());
            };
            let chunk_len = chunk.len();
            let take = (chunk_len - cursor).min(length);
            let out = chunk[cursor..cursor + take].to_vec();
            self.cursor += take;
            if self.cursor >= chunk_len {
                self.steps.pop_front();
                self.cursor = 0;
            }
            Ok(out)
        }

        /// Packet-driven read: one chunk is one bulk packet.
        pub fn read_packet(&mut self) -> Result<Vec<u8>, TransportError> {
            match self.steps.pop_front() {
                None => Ok(Vec::new()),
                Some(Step::Data(chunk)) => Ok(chunk),
                Some(Step::Fail(error)) => Err(error),
            }
        }

        pub fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
            self.written.push(data.to_vec());
            Ok(())
        }
    }
}
