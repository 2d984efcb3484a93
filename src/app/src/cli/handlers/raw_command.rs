use colorful::{Color, Colorful};
use protocol::command::CommandRequest;
use reader::error::ReaderError;
use reader::reader::Reader;

use crate::cli::commands::RawCommandArgs;

pub fn handle(reader: &mut Reader, args: &RawCommandArgs) -> Result<(), ReaderError> {
    let opcode = u16::from_str_radix(args.opcode.trim_start_matches("0x"), 16)
        .map_err(|_| {
            ReaderError::InvalidArgument(format!("'{}' is not a hex opcode", args.opcode))
        })?;
    let request = CommandRequest::try_from(opcode)
        .map_err(|_| ReaderError::InvalidArgument(format!("opcode {opcode:#06x} is not in the catalog")))?;
    let data = hex::decode(&args.data).map_err(|e| {
        ReaderError::InvalidArgument(format!("invalid hex data '{}': {e}", args.data))
    })?;

    println!(
        "{}",
        format!("Sending {request} with {} payload bytes...", data.len()).color(Color::Cyan)
    );

    let response = reader.custom(request, data)?;
    println!("{} {}", "Status:".color(Color::Green), response.status);
    if !response.payload.is_empty() {
        println!(
            "{} {}",
            "Payload:".color(Color::Green),
            hex::encode_upper(&response.payload)
        );
    }
    println!(
        "{} {}",
        "Raw:".color(Color::Blue),
        hex::encode_upper(&response.raw)
    );
    Ok(())
}
