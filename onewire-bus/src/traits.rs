use crate::{
    ONEWIRE_MATCH_ROM_CMD, ONEWIRE_READ_ROM_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireError,
    OneWireResult, Rom,
};

/// Status of the bus as observed during a reset cycle.
pub trait OneWireStatus {
    /// A device pulled the line low during the presence-detect window.
    fn presence(&self) -> bool;

    /// The line was found low when it should have been idle.
    fn shortcircuit(&self) -> bool;

    /// Logic level of the line after the reset cycle, if the bus master can sample it.
    fn logic_level(&self) -> Option<bool> {
        None
    }
}

/// Trait for 1-Wire communication.
/// This trait defines the basic operations required for 1-Wire communication, such as resetting the bus,
/// writing and reading bytes, and writing and reading bits.
pub trait OneWire {
    /// The status type returned by the reset operation.
    /// This type must implement the [OneWireStatus] trait.
    type Status: OneWireStatus;
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus and returns the status of the bus.
    ///
    /// A missing presence pulse is reported through [OneWireStatus::presence],
    /// not as an error.
    ///
    /// # Errors
    /// This method returns an error if the reset operation fails.
    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a byte to the 1-Wire bus, least significant bit first.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus, least significant bit first.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Generates a single write time slot.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Generates a single read time slot and returns the sampled bit.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes every byte of `bytes` in order.
    fn write_bytes(&mut self, bytes: &[u8]) -> OneWireResult<(), Self::BusError> {
        for &b in bytes {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// Fills `buf` with bytes read from the bus.
    fn read_bytes(&mut self, buf: &mut [u8]) -> OneWireResult<(), Self::BusError> {
        for b in buf.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(())
    }

    /// Addresses devices on the 1-Wire bus.
    ///
    /// Resets the bus and issues a Match ROM (or Skip ROM if `rom` is [`None`]) command.
    /// The function command for the addressed device(s) has to follow.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] if no device answered the reset,
    /// [`OneWireError::ShortCircuit`] if the line is held low.
    fn address(&mut self, rom: Option<Rom>) -> OneWireResult<(), Self::BusError> {
        let status = self.reset()?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        match rom {
            Some(rom) => {
                self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
                self.write_bytes(&rom.to_bytes())
            }
            None => self.write_byte(ONEWIRE_SKIP_ROM_CMD),
        }
    }

    /// Reads the ROM code of the only device on the bus.
    ///
    /// The result is garbage if more than one device is connected, which usually
    /// shows up as [`OneWireError::InvalidCrc`].
    fn read_rom(&mut self) -> OneWireResult<Rom, Self::BusError> {
        let status = self.reset()?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.write_byte(ONEWIRE_READ_ROM_CMD)?;
        let mut buf = [0; 8];
        self.read_bytes(&mut buf)?;
        let rom = Rom::from_bytes(buf);
        // an absent device reads as all ones, a stuck line as all zeros
        if !rom.is_valid() {
            return Err(OneWireError::InvalidCrc);
        }
        Ok(rom)
    }
}
