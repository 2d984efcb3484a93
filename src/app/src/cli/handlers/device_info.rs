use colorful::{Color, Colorful};
use protocol::status::Status;
use reader::error::ReaderError;
use reader::reader::Reader;

pub fn handle(reader: &mut Reader) -> Result<(), ReaderError> {
    let info = reader.get_device_info()?;
    match info.device_info {
        Some(device_info) => {
            println!(
                "{} hardware v{}, firmware v{}",
                "Device:".color(Color::Green),
                device_info.hardware_version,
                device_info.firmware_version
            );
        }
        None => println!(
            "{}",
            format!("Device info failed: {}", info.status).color(Color::Red)
        ),
    }

    let temperature = reader.get_current_temperature()?;
    match temperature.temperature {
        Some(celsius) if temperature.status == Status::Success => {
            println!("{} {celsius} °C", "Temperature:".color(Color::Green));
        }
        _ => println!(
            "{}",
            format!("Temperature query failed: {}", temperature.status).color(Color::Yellow)
        ),
    }

    Ok(())
}
