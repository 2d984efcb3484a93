use colorful::{Color, Colorful};
use reader::error::ReaderError;
use reader::reader::Reader;

use super::utils::{print_tag_outcomes, QUIET_TICK_LIMIT};
use crate::cli::commands::WriteArgs;

pub fn handle(reader: &mut Reader, args: &WriteArgs) -> Result<(), ReaderError> {
    let data = hex::decode(&args.data).map_err(|e| {
        ReaderError::InvalidArgument(format!("invalid hex data '{}': {e}", args.data))
    })?;
    println!(
        "{}",
        format!(
            "Writing {} bytes to {} bank at word {}...",
            data.len(),
            args.bank,
            args.address
        )
        .color(Color::Cyan)
    );

    let stream = reader.write_memory(args.bank, &data, args.address, 0, args.password)?;
    let responses = stream.try_collect(QUIET_TICK_LIMIT)?;

    let outcomes: Vec<_> = responses
        .into_iter()
        .map(|r| (r.status, r.tag))
        .collect();
    print_tag_outcomes(&outcomes);
    Ok(())
}
