use crate::OneWireCrc;
use core::{fmt, str::FromStr};

/// 64-bit ROM code of a 1-Wire device.
///
/// | Byte | Description |
/// |------|-------------|
/// | 0 | Family code (e.g., 0x28 for DS18B20) |
/// | 1-6 | Serial number |
/// | 7 | CRC-8 (`0b1_0001_1001` poly) of bytes 0-6 |
///
/// Bytes are numbered in bus order, i.e. byte 0 is transmitted first and is the
/// least significant byte of the inner `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rom(pub u64);

impl Rom {
    /// Builds a ROM code from bytes in bus order.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }

    /// Bytes of the ROM code in bus order.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Family code of the device.
    pub const fn family(self) -> u8 {
        self.to_bytes()[0]
    }

    /// CRC byte carried in the ROM code.
    pub const fn crc(self) -> u8 {
        self.to_bytes()[7]
    }

    /// Checks the CRC, and rejects the all-zero code that a stuck line produces.
    pub fn is_valid(self) -> bool {
        self.family() != 0 && OneWireCrc::validate(&self.to_bytes())
    }
}

impl From<u64> for Rom {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Rom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::LowerHex for Rom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Error returned when parsing a [`Rom`] from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRomError {
    /// The input does not hold exactly 16 hex digits.
    InvalidLength,
    /// The input contains a character that is neither a hex digit nor a separator.
    InvalidDigit(char),
}

impl fmt::Display for ParseRomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRomError::InvalidLength => write!(f, "ROM code must have 16 hex digits"),
            ParseRomError::InvalidDigit(c) => write!(f, "invalid character {:?} in ROM code", c),
        }
    }
}

impl core::error::Error for ParseRomError {}

impl FromStr for Rom {
    type Err = ParseRomError;

    /// Parses 16 hex digits in bus order, as printed by [`Display`](fmt::Display).
    /// `:` and `-` separators are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 8];
        let mut nibbles = 0usize;
        for c in s.chars() {
            if c == ':' || c == '-' {
                continue;
            }
            let digit = c.to_digit(16).ok_or(ParseRomError::InvalidDigit(c))? as u8;
            if nibbles == 16 {
                return Err(ParseRomError::InvalidLength);
            }
            let byte = &mut bytes[nibbles / 2];
            *byte = (*byte << 4) | digit;
            nibbles += 1;
        }
        if nibbles != 16 {
            return Err(ParseRomError::InvalidLength);
        }
        Ok(Rom::from_bytes(bytes))
    }
}
