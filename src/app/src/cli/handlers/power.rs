use colorful::{Color, Colorful};
use protocol::status::Status;
use reader::error::ReaderError;
use reader::reader::Reader;

use crate::cli::commands::PowerArgs;

pub fn handle(reader: &mut Reader, args: &PowerArgs) -> Result<(), ReaderError> {
    let response = reader.set_power(args.value)?;
    if response.status == Status::Success {
        println!(
            "{}",
            format!("Power set to {} dBm.", args.value).color(Color::Green)
        );
    } else {
        println!(
            "{}",
            format!("Reader rejected power: {}", response.status).color(Color::Red)
        );
    }
    Ok(())
}
