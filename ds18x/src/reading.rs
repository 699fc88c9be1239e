use crate::UnsupportedFamily;
use fixed::types::I12F4;

/// Temperature in degrees Celsius, in the 1/16 °C fixed-point format of the sensor.
pub type Temperature = I12F4;

/// Sensor families sharing the DS18x command set, keyed by ROM family code.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Family {
    /// DS18S20, fixed 9-bit register extended through COUNT_REMAIN.
    Ds18s20 = 0x10,
    /// DS1822.
    Ds1822 = 0x22,
    /// DS18B20 and MAX31820.
    Ds18b20 = 0x28,
    /// MAX31826.
    Max31826 = 0x3b,
}

impl Family {
    /// Whether the scratchpad carries a configuration register selecting the resolution.
    pub fn has_config_register(&self) -> bool {
        !matches!(self, Family::Ds18s20)
    }

    /// Resolution the sensor actually converts at when `requested` is asked for.
    pub fn effective_resolution(&self, requested: Resolution) -> Resolution {
        if self.has_config_register() {
            requested
        } else {
            Resolution::Bits12
        }
    }
}

impl TryFrom<u8> for Family {
    type Error = UnsupportedFamily;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Family::*;
        match value {
            0x10 => Ok(Ds18s20),
            0x22 => Ok(Ds1822),
            0x28 => Ok(Ds18b20),
            0x3b => Ok(Max31826),
            _ => Err(UnsupportedFamily(value)),
        }
    }
}

/// Measurement resolution. The discriminant is the configuration register value.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resolution {
    Bits9 = 0x1f,
    Bits10 = 0x3f,
    Bits11 = 0x5f,
    Bits12 = 0x7f,
}

impl Default for Resolution {
    fn default() -> Self {
        Self::Bits12
    }
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::Bits9,
        Resolution::Bits10,
        Resolution::Bits11,
        Resolution::Bits12,
    ];

    pub fn bits(&self) -> u8 {
        use Resolution::*;
        match self {
            Bits9 => 9,
            Bits10 => 10,
            Bits11 => 11,
            Bits12 => 12,
        }
    }

    /// Worst case conversion time.
    pub fn conversion_time_us(&self) -> u32 {
        use Resolution::*;
        match self {
            Bits9 => 93750,
            Bits10 => 187500,
            Bits11 => 375000,
            Bits12 => 750000,
        }
    }

    /// Decodes the R1/R0 bits of a configuration register value.
    pub fn from_config(config: u8) -> Self {
        use Resolution::*;
        match (config >> 5) & 0b11 {
            0 => Bits9,
            1 => Bits10,
            2 => Bits11,
            _ => Bits12,
        }
    }

    // Low bits of the temperature register are undefined below 12 bits.
    pub(crate) fn mask(&self, raw: i16) -> i16 {
        raw & !((1 << (12 - self.bits())) - 1)
    }
}

impl TryFrom<u8> for Resolution {
    type Error = &'static str;

    /// Converts a bit count in `9..=12`.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Resolution::*;
        match value {
            9 => Ok(Bits9),
            10 => Ok(Bits10),
            11 => Ok(Bits11),
            12 => Ok(Bits12),
            _ => Err("Invalid readout resolution"),
        }
    }
}

/// Converts degrees Celsius to degrees Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// One completed conversion.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Reading {
    temperature: Temperature,
    resolution: Resolution,
}

impl Reading {
    /// Decodes a CRC-checked scratchpad.
    ///
    /// `resolution` only applies to families with a configuration register; DS18S20
    /// readings always carry 12 bits.
    pub fn from_scratchpad(family: Family, resolution: Resolution, scratchpad: &[u8; 9]) -> Self {
        let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]);
        let (bits, resolution) = if family.has_config_register() {
            (resolution.mask(raw), resolution)
        } else {
            (
                extended_ds18s20(raw, scratchpad[6], scratchpad[7]),
                Resolution::Bits12,
            )
        };
        Reading {
            temperature: Temperature::from_bits(bits),
            resolution,
        }
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn celsius(&self) -> f32 {
        self.temperature.to_num()
    }

    pub fn fahrenheit(&self) -> f32 {
        celsius_to_fahrenheit(self.celsius())
    }
}

// T = TEMP_READ - 0.25 + (COUNT_PER_C - COUNT_REMAIN) / COUNT_PER_C, with TEMP_READ the
// half degree register truncated to whole degrees. Falls back to half degrees if the
// counter is not the 16 steps per degree the datasheet specifies. Registers outside the
// sensor range wrap instead of overflowing.
fn extended_ds18s20(raw: i16, count_remain: u8, count_per_c: u8) -> i16 {
    if count_per_c != 16 || count_remain > 16 {
        return raw.wrapping_shl(3);
    }
    ((raw >> 1) << 4)
        .wrapping_sub(4)
        .wrapping_add(16 - count_remain as i16)
}
