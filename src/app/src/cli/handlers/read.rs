use colorful::{Color, Colorful};
use protocol::status::Status;
use reader::error::ReaderError;
use reader::reader::Reader;

use super::utils::QUIET_TICK_LIMIT;
use crate::cli::commands::ReadArgs;

pub fn handle(reader: &mut Reader, args: &ReadArgs) -> Result<(), ReaderError> {
    println!(
        "{}",
        format!(
            "Reading {} words from {} bank at word {}...",
            args.words, args.bank, args.address
        )
        .color(Color::Cyan)
    );

    let stream = reader.read_memory(args.bank, args.address, args.words, args.password)?;
    let responses = stream.try_collect(QUIET_TICK_LIMIT)?;

    let mut found = 0usize;
    for response in &responses {
        if let Some(tag) = &response.tag {
            found += 1;
            println!(
                "  {}: {}",
                tag,
                hex::encode_upper(&response.data).color(Color::Blue)
            );
        } else if response.status != Status::NoCountLabel {
            println!(
                "{}",
                format!("Reader reported: {}", response.status).color(Color::Red)
            );
        }
    }

    if found == 0 {
        println!("{}", "No tags answered.".color(Color::Yellow));
    } else {
        println!(
            "{} {} {}",
            "Read".color(Color::Green),
            found.to_string().color(Color::Green).bold(),
            "tags.".color(Color::Green)
        );
    }
    Ok(())
}
