use clap::{Parser, Subcommand};
use core::fmt::Debug;
use ds18x::{Ds18x, Ds18xError, Ds18xResult, Resolution};
use embedded_hal::delay::DelayNs;
use gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::{CdevPin, Delay};
use onewire_bus::{OneWire, PinBus, Rom};
use spin::SpinDelay;
use std::time::{Duration, Instant};

mod spin;

/// Query a DS18x temperature sensor on a GPIO 1-Wire bus
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to GPIO character device (e.g., /dev/gpiochip0)
    #[arg(short, long, default_value = "/dev/gpiochip0")]
    chip: String,
    /// GPIO line carrying the 1-Wire bus
    #[arg(short, long)]
    line: u32,
    /// ROM code of the sensor, read from the bus if omitted (single sensor only)
    #[arg(short, long)]
    rom: Option<Rom>,
    /// Resolution used for temperature reads, in bits
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(9..=12))]
    resolution: u8,
    /// The sensor is parasite powered
    #[arg(long)]
    parasite: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Get sensor aliveness
    Alive,
    /// Get sensor address
    Addr,
    /// Set resolution bits [9-12]
    Res { bits: u8 },
    /// Get temperature in Celsius
    Tempc,
    /// Get temperature in Fahrenheit
    Tempf,
    /// Exercise and time every operation
    All,
    /// Read the temperature periodically
    Watch {
        /// Seconds between reads
        #[arg(short, long, default_value_t = 10)]
        interval: u64,
    },
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Claim the GPIO line as an open-drain output, released high
    let mut chip = Chip::new(&args.chip).expect("Failed to open GPIO chip");
    let handle = chip
        .get_line(args.line)
        .expect("Failed to get GPIO line")
        .request(
            LineRequestFlags::OUTPUT | LineRequestFlags::OPEN_DRAIN,
            1,
            "ds18x",
        )
        .expect("Failed to request GPIO line");
    let pin = CdevPin::new(handle).expect("Failed to configure GPIO line");
    // time slots need microsecond accuracy, the conversion wait does not
    let mut bus = PinBus::new(pin, SpinDelay);
    let mut delay = Delay;
    let resolution = Resolution::try_from(args.resolution).expect("Invalid resolution");
    // a missing sensor is reported by each command, as the bus is queried again
    let mut sensor = match open_sensor(&mut bus, args.rom) {
        Ok(sensor) => Some(
            sensor
                .with_resolution(resolution)
                .with_parasite_power(args.parasite),
        ),
        Err(e) => {
            log::warn!("No sensor found: {:?}", e);
            None
        }
    };
    run(&mut bus, &mut delay, &mut sensor, args.command);
}

/// Creates the sensor handle, reading the ROM from the bus if none was given.
fn open_sensor<O: OneWire>(bus: &mut O, rom: Option<Rom>) -> Ds18xResult<Ds18x, O::BusError> {
    match rom {
        Some(rom) => Ok(Ds18x::new(rom)?),
        None => Ds18x::discover(bus),
    }
}

fn present<E>(sensor: &mut Option<Ds18x>) -> Ds18xResult<&mut Ds18x, E> {
    sensor.as_mut().ok_or(Ds18xError::DeviceUnavailable)
}

fn alive<O: OneWire>(bus: &mut O, sensor: Option<&Ds18x>) -> Ds18xResult<bool, O::BusError> {
    match sensor {
        Some(sensor) => sensor.is_alive(bus),
        None => Ok(false),
    }
}

/// Address of the sensor, all zeros when none was found.
fn address(sensor: Option<&Ds18x>) -> Rom {
    sensor.map_or(Rom(0), Ds18x::address)
}

fn run<O, D>(bus: &mut O, delay: &mut D, sensor: &mut Option<Ds18x>, command: Command)
where
    O: OneWire,
    O::BusError: Debug,
    D: DelayNs,
{
    match command {
        Command::Alive => match alive(bus, sensor.as_ref()) {
            Ok(alive) => log::info!("Alive: {}", alive),
            Err(e) => log::error!("Bus fault: {:?}", e),
        },
        Command::Addr => log::info!("Address: {}", address(sensor.as_ref())),
        Command::Res { bits } => {
            let worked = present(sensor).and_then(|s| s.set_resolution(bus, bits));
            if let Err(e) = &worked {
                log::error!("Failed to set resolution: {:?}", e);
            }
            log::info!("Worked: {}", worked.is_ok());
        }
        Command::Tempc => {
            match present(sensor).and_then(|s| s.temperature_celsius(bus, delay)) {
                Ok(temp) => log::info!("TempC: {}", temp),
                Err(e) => log::error!("Device error: {:?}", e),
            }
        }
        Command::Tempf => {
            match present(sensor).and_then(|s| s.temperature_fahrenheit(bus, delay)) {
                Ok(temp) => log::info!("TempF: {}", temp),
                Err(e) => log::error!("Device error: {:?}", e),
            }
        }
        Command::All => {
            let start = Instant::now();
            let mut last = start;
            let mut lap = |event: &str| {
                let now = Instant::now();
                log::debug!("{:<8} {:>10?}", event, now - last);
                last = now;
            };
            let is_alive = alive(bus, sensor.as_ref());
            lap("alive");
            log::info!("Alive           : {:?}", is_alive);
            log::info!("Addr            : {}", address(sensor.as_ref()));
            for bits in 9..=12 {
                let ok = present(sensor)
                    .and_then(|s| s.set_resolution(bus, bits))
                    .is_ok();
                lap("res");
                let temp = present(sensor).and_then(|s| s.temperature_fahrenheit(bus, delay));
                lap("temp");
                log::info!(
                    "TempF @ {:>2} bits : {:?} ({})",
                    bits,
                    temp,
                    if ok { "ok" } else { "fail" }
                );
            }
            log::info!("Total           : {:?}", start.elapsed());
        }
        Command::Watch { interval } => loop {
            match present(sensor).and_then(|s| s.read(bus, delay)) {
                Ok(reading) => log::info!(
                    "ROM: {}, Temperature: {} °C / {:.2} °F",
                    address(sensor.as_ref()),
                    reading.temperature(),
                    reading.fahrenheit()
                ),
                Err(e) => log::error!("Device error: {:?}", e),
            }
            std::thread::sleep(Duration::from_secs(interval));
        },
    }
}
