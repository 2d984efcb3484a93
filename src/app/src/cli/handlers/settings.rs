use colorful::{Color, Colorful};
use reader::error::ReaderError;
use reader::reader::Reader;

pub fn handle(reader: &mut Reader) -> Result<(), ReaderError> {
    let response = reader.get_reader_settings()?;
    let Some(settings) = response.settings else {
        println!(
            "{}",
            format!("Settings query failed: {}", response.status).color(Color::Red)
        );
        return Ok(());
    };

    println!("{}", "Reader settings:".color(Color::Green));
    println!("  address:            {}", settings.address);
    println!("  protocol:           {:?}", settings.rfid_protocol);
    println!("  work mode:          {:?}", settings.work_mode);
    println!("  output interface:   {:?}", settings.output_interface);
    println!("  baud rate:          {}", settings.baud_rate);
    println!(
        "  wiegand:            open={} {:?} {:?}",
        settings.wiegand.is_open, settings.wiegand.protocol, settings.wiegand.byte_first_type
    );
    println!("  antenna mask:       {:#010b}", settings.antenna.to_byte());
    println!(
        "  frequency:          {:?} {:.1}-{:.1} MHz",
        settings.frequency.region, settings.frequency.min_frequency, settings.frequency.max_frequency
    );
    println!("  power:              {} dBm", settings.power);
    println!("  output bank:        {}", settings.output_memory_bank);
    println!("  q value:            {}", settings.q_value);
    println!("  session:            {:?}", settings.session);
    println!(
        "  output window:      word {} len {}",
        settings.output_start_address, settings.output_length
    );
    println!("  filter time:        {}", settings.filter_time);
    println!("  trigger time:       {}", settings.trigger_time);
    println!("  buzzer:             {}", settings.buzzer);
    println!("  inventory interval: {} ms", settings.inventory_interval);
    Ok(())
}
