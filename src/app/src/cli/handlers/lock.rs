use colorful::{Color, Colorful};
use reader::error::ReaderError;
use reader::reader::Reader;

use super::utils::{print_tag_outcomes, QUIET_TICK_LIMIT};
use crate::cli::commands::LockArgs;

pub fn handle(reader: &mut Reader, args: &LockArgs) -> Result<(), ReaderError> {
    println!(
        "{}",
        format!("Applying {:?} to {:?}...", args.action, args.bank).color(Color::Cyan)
    );

    let stream = reader.lock_memory(args.bank, args.action, args.password)?;
    let responses = stream.try_collect(QUIET_TICK_LIMIT)?;

    let outcomes: Vec<_> = responses
        .into_iter()
        .map(|r| (r.status, r.tag))
        .collect();
    print_tag_outcomes(&outcomes);
    Ok(())
}
