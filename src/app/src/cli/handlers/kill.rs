use colorful::{Color, Colorful};
use reader::error::ReaderError;
use reader::reader::Reader;

use super::utils::{print_tag_outcomes, QUIET_TICK_LIMIT};
use crate::cli::commands::KillArgs;

pub fn handle(reader: &mut Reader, args: &KillArgs) -> Result<(), ReaderError> {
    println!(
        "{}",
        "Killing tags in range. This cannot be undone.".color(Color::Red)
    );

    let stream = reader.kill_tag(args.password)?;
    let responses = stream.try_collect(QUIET_TICK_LIMIT)?;

    let outcomes: Vec<_> = responses
        .into_iter()
        .map(|r| (r.status, r.tag))
        .collect();
    print_tag_outcomes(&outcomes);
    Ok(())
}
