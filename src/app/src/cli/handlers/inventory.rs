use colorful::{Color, Colorful};
use log::debug;
use protocol::reader_settings::{AnswerModeInventoryParameter, StopAfter, WorkMode};
use protocol::status::InventoryStatus;
use reader::error::ReaderError;
use reader::reader::Reader;

use super::utils::QUIET_TICK_LIMIT;
use crate::cli::commands::InventoryArgs;

pub fn handle(reader: &mut Reader, args: &InventoryArgs) -> Result<(), ReaderError> {
    println!(
        "{}",
        format!("Scanning for tags ({} cycles)...", args.cycles).color(Color::Cyan)
    );

    let parameter = AnswerModeInventoryParameter {
        stop_after: StopAfter::Number,
        value: args.cycles,
    };
    let mut stream = reader.start_inventory(WorkMode::AnswerMode, Some(parameter))?;

    let mut epcs: Vec<String> = Vec::new();
    let mut sightings = 0usize;
    let mut quiet = 0usize;
    for item in stream.by_ref() {
        let Some(response) = item else {
            quiet += 1;
            if quiet >= QUIET_TICK_LIMIT {
                debug!("inventory went quiet, stopping");
                break;
            }
            continue;
        };
        quiet = 0;

        if response.status == InventoryStatus::NoCountLabel {
            break;
        }
        if let Some(tag) = response.tag {
            sightings += 1;
            let epc = hex::encode_upper(&tag.epc);
            println!("  {} rssi={}", epc.clone().color(Color::Blue), tag.rssi);
            if !epcs.contains(&epc) {
                epcs.push(epc);
            }
        }
    }
    stream.stop(WorkMode::AnswerMode)?;

    if epcs.is_empty() {
        println!("{}", "No tags found.".color(Color::Yellow));
    } else {
        println!(
            "{} {} {} ({sightings} sightings)",
            "Found".color(Color::Green),
            epcs.len().to_string().color(Color::Green).bold(),
            "distinct tags".color(Color::Green)
        );
    }
    Ok(())
}
