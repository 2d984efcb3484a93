#![warn(clippy::pedantic)]

//! CLI entry point for driving a CF-family UHF RFID reader.

mod cli;

use std::process;

use reader::error::ReaderError;

fn main() -> Result<(), ReaderError> {
    env_logger::init();

    match cli::run_cli() {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
