//! Command definitions for the RFID CLI application

use clap::{Args, Parser, Subcommand};
use protocol::reader_settings::{LockAction, LockMemoryBank, MemoryBank};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArguments {
    /// Serial port to connect through (e.g. /dev/ttyUSB0, COM3)
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(long, global = true, default_value = "115200")]
    pub baud: u32,

    /// TCP endpoint to connect through, as host:port
    #[arg(long, global = true)]
    pub tcp: Option<String>,

    /// Transport read timeout in milliseconds
    #[arg(long, global = true, default_value = "1000")]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List candidate serial ports and USB readers
    Scan,

    /// Get device information and module temperature
    DeviceInfo,

    /// Scan for RFID tags in range
    Inventory(InventoryArgs),

    /// Read data from tag memory
    Read(ReadArgs),

    /// Write data to tag memory
    Write(WriteArgs),

    /// Lock a memory bank on a tag
    Lock(LockArgs),

    /// Kill a tag permanently (irreversible)
    Kill(KillArgs),

    /// Show the reader's parameter block
    Settings,

    /// Set transmit power in dBm
    Power(PowerArgs),

    /// Send a raw catalog command to the device (advanced)
    RawCommand(RawCommandArgs),
}

#[derive(Args)]
pub struct InventoryArgs {
    /// Number of inventory cycles before the reader stops on its own
    #[arg(short, long, default_value = "10")]
    pub cycles: u32,
}

#[derive(Args)]
pub struct ReadArgs {
    /// Memory bank to read from (reserved, epc, tid, user)
    #[arg(short, long, value_parser = parse_memory_bank)]
    pub bank: MemoryBank,

    /// Starting address for the read, in words
    #[arg(short, long, default_value = "0")]
    pub address: u16,

    /// Number of words to read (1 word = 2 bytes)
    #[arg(short, long, default_value = "4")]
    pub words: u8,

    /// Access password as 8 hex digits
    #[arg(short, long, default_value = "00000000", value_parser = parse_password)]
    pub password: [u8; 4],
}

#[derive(Args)]
pub struct WriteArgs {
    /// Memory bank to write to (reserved, epc, tid, user)
    #[arg(short, long, value_parser = parse_memory_bank)]
    pub bank: MemoryBank,

    /// Starting address for the write, in words
    #[arg(short, long, default_value = "0")]
    pub address: u16,

    /// Data to write, as hex digits
    #[arg(short, long)]
    pub data: String,

    /// Access password as 8 hex digits
    #[arg(short, long, default_value = "00000000", value_parser = parse_password)]
    pub password: [u8; 4],
}

#[derive(Args)]
pub struct LockArgs {
    /// Bank to lock (kill-password, access-password, epc, tid, user)
    #[arg(short, long, value_parser = parse_lock_bank)]
    pub bank: LockMemoryBank,

    /// Lock action (open, lock, permanent-open, permanent-lock)
    #[arg(short = 'A', long, value_parser = parse_lock_action)]
    pub action: LockAction,

    /// Access password as 8 hex digits
    #[arg(short, long, default_value = "00000000", value_parser = parse_password)]
    pub password: [u8; 4],
}

#[derive(Args)]
pub struct KillArgs {
    /// Kill password as 8 hex digits; a zero password kills nothing
    #[arg(short, long, value_parser = parse_password)]
    pub password: [u8; 4],
}

#[derive(Args)]
pub struct PowerArgs {
    /// Transmit power in dBm, 0 to 33
    pub value: u8,
}

#[derive(Args)]
pub struct RawCommandArgs {
    /// Opcode as 4 hex digits (e.g. 0068)
    #[arg(short, long)]
    pub opcode: String,

    /// Payload as hex digits
    #[arg(short, long, default_value = "")]
    pub data: String,
}

fn parse_memory_bank(value: &str) -> Result<MemoryBank, String> {
    match value.to_ascii_lowercase().as_str() {
        "reserved" => Ok(MemoryBank::Reserved),
        "epc" => Ok(MemoryBank::Epc),
        "tid" => Ok(MemoryBank::Tid),
        "user" => Ok(MemoryBank::User),
        _ => Err(format!(
            "invalid memory bank '{value}' (expected reserved, epc, tid or user)"
        )),
    }
}

fn parse_lock_bank(value: &str) -> Result<LockMemoryBank, String> {
    match value.to_ascii_lowercase().as_str() {
        "kill-password" => Ok(LockMemoryBank::KillPassword),
        "access-password" => Ok(LockMemoryBank::AccessPassword),
        "epc" => Ok(LockMemoryBank::Epc),
        "tid" => Ok(LockMemoryBank::Tid),
        "user" => Ok(LockMemoryBank::User),
        _ => Err(format!(
            "invalid lock bank '{value}' \
             (expected kill-password, access-password, epc, tid or user)"
        )),
    }
}

fn parse_lock_action(value: &str) -> Result<LockAction, String> {
    match value.to_ascii_lowercase().as_str() {
        "open" => Ok(LockAction::Open),
        "lock" => Ok(LockAction::Lock),
        "permanent-open" => Ok(LockAction::PermanentOpen),
        "permanent-lock" => Ok(LockAction::PermanentLock),
        _ => Err(format!(
            "invalid lock action '{value}' \
             (expected open, lock, permanent-open or permanent-lock)"
        )),
    }
}

fn parse_password(value: &str) -> Result<[u8; 4], String> {
    let bytes =
        hex::decode(value).map_err(|e| format!("invalid hex string '{value}': {e}"))?;
    bytes
        .try_into()
        .map_err(|_| format!("password '{value}' must be exactly 8 hex digits"))
}
