#![cfg_attr(not(test), no_std)]
//! # ds18x
//! Blocking driver for the DS18x family of 1-Wire temperature sensors
//! (DS18S20, DS18B20, DS1822, MAX31820 and MAX31826).
//!
//! A [`Ds18x`] is a handle on one sensor, identified by its ROM code. It does not own
//! the bus: every operation borrows a [`OneWire`] bus master, so several sensors can share
//! one bus and their transactions are serialized by the borrow.

use embedded_hal::delay::DelayNs;
use onewire_bus::{OneWire, OneWireCrc, Rom};

mod error;
mod reading;
pub use error::{Ds18xError, UnsupportedFamily};
pub use reading::{Family, Reading, Resolution, Temperature, celsius_to_fahrenheit};

/// Results of DS18x driver calls.
pub type Ds18xResult<T, E> = Result<T, Ds18xError<E>>;

const DS18X_READ_SCRATCH: u8 = 0xbe;
const DS18X_WRITE_SCRATCH: u8 = 0x4e;
const DS18X_COPY_SCRATCH: u8 = 0x48;
const DS18X_START_CONV: u8 = 0x44;
const DS18X_READ_POWERMODE: u8 = 0xb4;
const DS18X_RECALL_EEPROM: u8 = 0xb8;

/// Read slots polled after the nominal conversion time before giving up.
const CONVERSION_GRACE_POLLS: u32 = 10;
const CONVERSION_POLL_MS: u32 = 10;
const EEPROM_WRITE_MS: u32 = 10;

/// Alarm thresholds and resolution, written together to the scratchpad.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub t_high: i8,
    pub t_low: i8,
    pub resolution: Resolution,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            t_high: 125,
            t_low: -55,
            resolution: Resolution::default(),
        }
    }
}

/// How the sensor is powered, as reported by the Read Power Supply command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PowerSupply {
    External,
    Parasite,
}

/// A DS18x temperature sensor on a 1-Wire bus.
#[derive(Debug, Clone)]
pub struct Ds18x {
    rom: Rom,
    family: Family,
    config: Config,
    parasite: bool,
}

impl Ds18x {
    /// Creates a handle for the sensor with ROM code `rom`.
    pub fn new(rom: Rom) -> Result<Self, UnsupportedFamily> {
        Ok(Self {
            rom,
            family: Family::try_from(rom.family())?,
            config: Config::default(),
            parasite: false,
        })
    }

    /// Creates a handle for the only device on a single-drop bus.
    pub fn discover<O: OneWire>(bus: &mut O) -> Ds18xResult<Self, O::BusError> {
        let rom = bus.read_rom()?;
        log::debug!("Found {} on single-drop bus", rom);
        Ok(Self::new(rom)?)
    }

    /// Sets the resolution used by the next temperature reads.
    ///
    /// Unlike [`Ds18x::set_resolution`] this does not touch the bus; the configuration is
    /// written before every conversion. DS18S20 sensors stay at 12 bits.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.config.resolution = self.family.effective_resolution(resolution);
        self
    }

    pub fn with_t_high(mut self, temp: i8) -> Self {
        self.config.t_high = temp;
        self
    }

    pub fn with_t_low(mut self, temp: i8) -> Self {
        self.config.t_low = temp;
        self
    }

    /// Parasite powered sensors cannot signal the end of a conversion, so the driver waits
    /// the full conversion time instead of polling.
    pub fn with_parasite_power(mut self, parasite: bool) -> Self {
        self.parasite = parasite;
        self
    }

    pub fn address(&self) -> Rom {
        self.rom
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn resolution(&self) -> Resolution {
        self.config.resolution
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Worst case conversion time at the current resolution.
    pub fn conversion_time_us(&self) -> u32 {
        if self.family.has_config_register() {
            self.config.resolution.conversion_time_us()
        } else {
            Resolution::Bits12.conversion_time_us()
        }
    }

    /// Checks that the sensor answers on the bus.
    ///
    /// A missing presence pulse or an unreadable scratchpad is reported as `Ok(false)`.
    /// Only faults of the bus itself are errors.
    pub fn is_alive<O: OneWire>(&self, bus: &mut O) -> Ds18xResult<bool, O::BusError> {
        match self.read_scratchpad(bus) {
            Ok(_) => Ok(true),
            Err(Ds18xError::DeviceUnavailable | Ds18xError::InvalidCrc) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Writes a new resolution of `bits` (9 to 12) to the sensor.
    ///
    /// The scratchpad is read back, and the handle only takes the new resolution once the
    /// sensor holds it. DS18S20 sensors have no configuration register: any valid `bits`
    /// is accepted, only the alarm thresholds are written and the resolution stays 12 bits.
    pub fn set_resolution<O: OneWire>(
        &mut self,
        bus: &mut O,
        bits: u8,
    ) -> Ds18xResult<(), O::BusError> {
        let resolution =
            Resolution::try_from(bits).map_err(|_| Ds18xError::InvalidArgument(bits))?;
        let config = Config {
            resolution: self.family.effective_resolution(resolution),
            ..self.config
        };
        self.write_config(bus, &config)?;
        let scratchpad = match self.read_scratchpad(bus) {
            Ok(scratchpad) => scratchpad,
            Err(Ds18xError::InvalidCrc) => return Err(Ds18xError::DeviceUnavailable),
            Err(e) => return Err(e),
        };
        if !self.holds_config(&scratchpad, &config) {
            log::warn!("{}: configuration write not taken", self.rom);
            return Err(Ds18xError::DeviceUnavailable);
        }
        log::debug!("{}: resolution set to {} bits", self.rom, config.resolution.bits());
        self.config = config;
        Ok(())
    }

    /// Runs one conversion and reads it back.
    ///
    /// Both units can be taken from the returned [`Reading`] without a second conversion.
    pub fn read<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds18xResult<Reading, O::BusError> {
        // the sensor falls back to its EEPROM configuration after a power cycle
        self.write_config(bus, &self.config)?;
        self.convert(bus, delay)?;
        let scratchpad = self.read_scratchpad(bus)?;
        let reading = Reading::from_scratchpad(self.family, self.config.resolution, &scratchpad);
        log::trace!("{}: {} °C", self.rom, reading.temperature());
        Ok(reading)
    }

    /// Runs one conversion and returns degrees Celsius.
    pub fn temperature_celsius<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds18xResult<f32, O::BusError> {
        Ok(self.read(bus, delay)?.celsius())
    }

    /// Runs one conversion and returns degrees Fahrenheit.
    pub fn temperature_fahrenheit<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds18xResult<f32, O::BusError> {
        Ok(self.read(bus, delay)?.fahrenheit())
    }

    /// Asks the sensor whether it runs on parasite power.
    pub fn power_supply<O: OneWire>(&self, bus: &mut O) -> Ds18xResult<PowerSupply, O::BusError> {
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18X_READ_POWERMODE)?;
        Ok(if bus.read_bit()? {
            PowerSupply::External
        } else {
            PowerSupply::Parasite
        })
    }

    /// Writes the configuration and copies it to EEPROM.
    pub fn save_config<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds18xResult<(), O::BusError> {
        self.write_config(bus, &self.config)?;
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18X_COPY_SCRATCH)?;
        delay.delay_ms(EEPROM_WRITE_MS);
        Ok(())
    }

    /// Reloads the configuration from EEPROM and adopts it.
    pub fn recall_config<O: OneWire>(&mut self, bus: &mut O) -> Ds18xResult<Config, O::BusError> {
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18X_RECALL_EEPROM)?;
        let scratchpad = self.read_scratchpad(bus)?;
        self.config = Config {
            t_high: scratchpad[2] as i8,
            t_low: scratchpad[3] as i8,
            resolution: if self.family.has_config_register() {
                Resolution::from_config(scratchpad[4])
            } else {
                self.config.resolution
            },
        };
        Ok(self.config)
    }

    fn write_config<O: OneWire>(
        &self,
        bus: &mut O,
        config: &Config,
    ) -> Ds18xResult<(), O::BusError> {
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18X_WRITE_SCRATCH)?;
        bus.write_byte(config.t_high as _)?;
        bus.write_byte(config.t_low as _)?;
        if self.family.has_config_register() {
            bus.write_byte(config.resolution as _)?;
        }
        Ok(())
    }

    fn holds_config(&self, scratchpad: &[u8; 9], config: &Config) -> bool {
        scratchpad[2] as i8 == config.t_high
            && scratchpad[3] as i8 == config.t_low
            && (!self.family.has_config_register()
                || Resolution::from_config(scratchpad[4]) == config.resolution)
    }

    fn convert<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds18xResult<(), O::BusError> {
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18X_START_CONV)?;
        delay.delay_us(self.conversion_time_us());
        if self.parasite {
            return Ok(());
        }
        // the sensor answers read slots with 0 while converting
        for _ in 0..CONVERSION_GRACE_POLLS {
            if bus.read_bit()? {
                return Ok(());
            }
            delay.delay_ms(CONVERSION_POLL_MS);
        }
        log::warn!("{}: conversion did not complete", self.rom);
        Err(Ds18xError::ConversionTimeout)
    }

    fn read_scratchpad<O: OneWire>(&self, bus: &mut O) -> Ds18xResult<[u8; 9], O::BusError> {
        bus.address(Some(self.rom))?;
        bus.write_byte(DS18X_READ_SCRATCH)?;
        let mut buf = [0; 9];
        bus.read_bytes(&mut buf)?;
        // a line stuck low reads as zeros, which pass the CRC
        if buf.iter().all(|&b| b == 0) || !OneWireCrc::validate(&buf) {
            log::debug!("{}: scratchpad CRC mismatch", self.rom);
            return Err(Ds18xError::InvalidCrc);
        }
        Ok(buf)
    }
}
