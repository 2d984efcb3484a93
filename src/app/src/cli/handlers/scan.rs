use colorful::{Color, Colorful};
use reader::error::ReaderError;
use reader::transport::{SerialTransport, UsbTransport};

pub fn handle() -> Result<(), ReaderError> {
    println!("{}", "Serial ports:".color(Color::Cyan));
    let ports = SerialTransport::scan()?;
    if ports.is_empty() {
        println!("  {}", "none".color(Color::Yellow));
    } else {
        for port in ports {
            println!("  {port}");
        }
    }

    println!("{}", "USB readers:".color(Color::Cyan));
    let devices = UsbTransport::scan()?;
    if devices.is_empty() {
        println!("  {}", "none".color(Color::Yellow));
    } else {
        for device in devices {
            println!("  {device}");
        }
    }

    Ok(())
}
