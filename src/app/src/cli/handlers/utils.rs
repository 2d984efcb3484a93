use colorful::{Color, Colorful};
use protocol::response::TagData;
use protocol::status::Status;

/// Consecutive quiet ticks before a streaming command gives up.
pub const QUIET_TICK_LIMIT: usize = 20;

/// Print the per-tag outcome of a write/lock/kill stream.
pub fn print_tag_outcomes(outcomes: &[(Status, Option<TagData>)]) {
    let touched: Vec<&TagData> = outcomes
        .iter()
        .filter_map(|(_, tag)| tag.as_ref())
        .collect();

    if touched.is_empty() {
        println!("{}", "No tags answered.".color(Color::Yellow));
        return;
    }

    println!(
        "{} {} {}",
        "Affected".color(Color::Green),
        touched.len().to_string().color(Color::Green).bold(),
        "tags:".color(Color::Green)
    );
    for (i, tag) in touched.iter().enumerate() {
        println!("  {}: {}", (i + 1).to_string().color(Color::Blue), tag);
    }

    for (status, _) in outcomes.iter().filter(|(s, _)| {
        *s != Status::Success && *s != Status::NoCountLabel
    }) {
        println!("{}", format!("Reader reported: {status}").color(Color::Red));
    }
}
