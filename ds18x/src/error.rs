use onewire_bus::OneWireError;

/// Errors returned by the DS18x driver.
///
/// None of these are fatal: the sensor can be queried again after any of them.
#[derive(Debug, PartialEq, Eq)]
pub enum Ds18xError<E> {
    /// The sensor did not answer the reset pulse, or did not take a configuration write.
    DeviceUnavailable,
    /// Requested resolution is outside 9 to 12 bits.
    InvalidArgument(u8),
    /// The conversion did not complete in the expected window.
    ConversionTimeout,
    /// Scratchpad or ROM CRC mismatch.
    InvalidCrc,
    /// The ROM family code is not a DS18x temperature sensor.
    UnsupportedFamily(u8),
    /// Fault of the underlying bus.
    Bus(OneWireError<E>),
}

/// Returned by [`Ds18x::new`](crate::Ds18x::new) for ROM codes of other device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedFamily(pub u8);

impl<E> From<OneWireError<E>> for Ds18xError<E> {
    fn from(value: OneWireError<E>) -> Self {
        match value {
            OneWireError::NoDevicePresent => Self::DeviceUnavailable,
            OneWireError::InvalidCrc => Self::InvalidCrc,
            other => Self::Bus(other),
        }
    }
}

impl<E> From<UnsupportedFamily> for Ds18xError<E> {
    fn from(value: UnsupportedFamily) -> Self {
        Self::UnsupportedFamily(value.0)
    }
}
