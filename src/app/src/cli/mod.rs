//! CLI module for the RFID command-line application

use std::time::Duration;

use clap::Parser;
use colorful::{Color, Colorful};
use protocol::reader_settings::BaudRate;
use reader::error::{ReaderError, TransportError};
use reader::reader::Reader;
use reader::transport::{SerialTransport, TcpTransport, Transport, UsbTransport};

use commands::{CliArguments, Commands};

pub mod commands;
mod handlers;

/// Parse arguments, connect the requested transport and dispatch.
///
/// # Errors
/// Any [`ReaderError`] from connecting or from the executed command.
pub fn run_cli() -> Result<(), ReaderError> {
    let cli = CliArguments::parse();

    if matches!(cli.command, Commands::Scan) {
        return handlers::scan::handle();
    }

    let mut reader = connect(&cli)?;
    println!(
        "{}",
        format!("Connected over {}", reader.transport().connection_type()).color(Color::Green)
    );

    let result = match &cli.command {
        Commands::Scan => unreachable!("handled before connecting"),
        Commands::DeviceInfo => handlers::device_info::handle(&mut reader),
        Commands::Inventory(args) => handlers::inventory::handle(&mut reader, args),
        Commands::Read(args) => handlers::read::handle(&mut reader, args),
        Commands::Write(args) => handlers::write::handle(&mut reader, args),
        Commands::Lock(args) => handlers::lock::handle(&mut reader, args),
        Commands::Kill(args) => handlers::kill::handle(&mut reader, args),
        Commands::Settings => handlers::settings::handle(&mut reader),
        Commands::Power(args) => handlers::power::handle(&mut reader, args),
        Commands::RawCommand(args) => handlers::raw_command::handle(&mut reader, args),
    };

    reader.close();
    result
}

/// Open the transport selected by the connection flags: an explicit
/// serial port, an explicit TCP endpoint, or the first scanned USB reader.
fn connect(cli: &CliArguments) -> Result<Reader, ReaderError> {
    let timeout = Duration::from_millis(cli.timeout_ms);

    let transport = if let Some(port) = &cli.port {
        let baud_rate = BaudRate::from_int(cli.baud).ok_or_else(|| {
            ReaderError::InvalidArgument(format!("unsupported baud rate {}", cli.baud))
        })?;
        Transport::Serial(SerialTransport::connect(port, baud_rate, timeout)?)
    } else if let Some(endpoint) = &cli.tcp {
        let (host, port) = endpoint.rsplit_once(':').ok_or_else(|| {
            ReaderError::InvalidArgument(format!("'{endpoint}' is not host:port"))
        })?;
        let port: u16 = port.parse().map_err(|_| {
            ReaderError::InvalidArgument(format!("'{port}' is not a port number"))
        })?;
        Transport::Tcp(TcpTransport::connect(host, port, timeout)?)
    } else {
        let device = UsbTransport::scan()?.into_iter().next().ok_or_else(|| {
            eprintln!(
                "{}",
                "No USB reader found; pass --port or --tcp to use another transport."
                    .color(Color::Yellow)
            );
            ReaderError::Transport(TransportError::Disconnected)
        })?;
        Transport::Usb(UsbTransport::connect(device, timeout)?)
    };

    Ok(Reader::new(transport))
}
