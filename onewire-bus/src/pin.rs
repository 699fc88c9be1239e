use crate::{OneWire, OneWireResult, OneWireStatus};
use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};

// Standard speed timings in microseconds, Maxim application note 126.
const T_SLOT_LOW_ONE: u32 = 6; // A
const T_SLOT_RELEASE_ONE: u32 = 64; // B
const T_SLOT_LOW_ZERO: u32 = 60; // C
const T_SLOT_RELEASE_ZERO: u32 = 10; // D
const T_READ_SAMPLE: u32 = 9; // E
const T_READ_RECOVERY: u32 = 55; // F
const T_RESET_LOW: u32 = 480; // H
const T_PRESENCE_SAMPLE: u32 = 70; // I
const T_RESET_RECOVERY: u32 = 410; // J

/// A bit-banged 1-Wire bus master.
///
/// Takes ownership of an open-drain pin (implementing both [`InputPin`] and [`OutputPin`],
/// with an external pull-up) and a timer implementing [`DelayNs`].
/// Driving the pin high releases the line; driving it low pulls the line down.
///
/// Time slots are generated with busy waits, so the caller is responsible for keeping
/// interrupts from stretching them.
pub struct PinBus<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> PinBus<P, D> {
    /// Creates a new bus master on `pin`.
    pub fn new(pin: P, delay: D) -> Self {
        PinBus { pin, delay }
    }

    /// Releases the pin and the timer.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

/// Line state sampled by [`PinBus`] during a reset cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStatus {
    presence: bool,
    shorted: bool,
    level: bool,
}

impl OneWireStatus for LineStatus {
    fn presence(&self) -> bool {
        self.presence
    }

    fn shortcircuit(&self) -> bool {
        self.shorted
    }

    fn logic_level(&self) -> Option<bool> {
        Some(self.level)
    }
}

impl<P: InputPin + OutputPin, D: DelayNs> PinBus<P, D> {
    fn slot(&mut self, low_us: u32, release_us: u32) -> Result<(), <P as ErrorType>::Error> {
        self.pin.set_low()?;
        self.delay.delay_us(low_us);
        self.pin.set_high()?;
        self.delay.delay_us(release_us);
        Ok(())
    }
}

impl<P: InputPin + OutputPin, D: DelayNs> OneWire for PinBus<P, D> {
    type Status = LineStatus;

    type BusError = <P as ErrorType>::Error;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.pin.set_high()?;
        if self.pin.is_low()? {
            log::warn!("1-Wire line held low before reset");
            return Ok(LineStatus {
                presence: false,
                shorted: true,
                level: false,
            });
        }
        self.pin.set_low()?;
        self.delay.delay_us(T_RESET_LOW);
        self.pin.set_high()?;
        self.delay.delay_us(T_PRESENCE_SAMPLE);
        let presence = self.pin.is_low()?;
        self.delay.delay_us(T_RESET_RECOVERY);
        let level = self.pin.is_high()?;
        log::trace!("1-Wire reset: presence {}, line {}", presence, level);
        Ok(LineStatus {
            presence,
            shorted: !level,
            level,
        })
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        if bit {
            self.slot(T_SLOT_LOW_ONE, T_SLOT_RELEASE_ONE)?;
        } else {
            self.slot(T_SLOT_LOW_ZERO, T_SLOT_RELEASE_ZERO)?;
        }
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.pin.set_low()?;
        self.delay.delay_us(T_SLOT_LOW_ONE);
        self.pin.set_high()?;
        self.delay.delay_us(T_READ_SAMPLE);
        let bit = self.pin.is_high()?;
        self.delay.delay_us(T_READ_RECOVERY);
        Ok(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OneWireError, Rom};
    use embedded_hal_mock::eh1::{
        delay::{CheckedDelay, NoopDelay, Transaction as DelayTransaction},
        digital::{Mock as PinMock, State, Transaction as PinTransaction},
    };

    fn reset_sequence(presence: bool) -> Vec<PinTransaction> {
        vec![
            PinTransaction::set(State::High),
            PinTransaction::get(State::High),
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
            PinTransaction::get(if presence { State::Low } else { State::High }),
            PinTransaction::get(State::High),
        ]
    }

    // the pin sees the same edges for either bit value, only the delays differ
    fn write_sequence() -> Vec<PinTransaction> {
        (0..8)
            .flat_map(|_| [PinTransaction::set(State::Low), PinTransaction::set(State::High)])
            .collect()
    }

    fn read_sequence(byte: u8) -> Vec<PinTransaction> {
        (0..8)
            .flat_map(|i| {
                let level = if byte & (1 << i) != 0 {
                    State::High
                } else {
                    State::Low
                };
                [
                    PinTransaction::set(State::Low),
                    PinTransaction::set(State::High),
                    PinTransaction::get(level),
                ]
            })
            .collect()
    }

    fn finish(bus: PinBus<PinMock, NoopDelay>) {
        let (mut pin, _) = bus.release();
        pin.done();
    }

    fn finish_timed(bus: PinBus<PinMock, CheckedDelay>) {
        let (mut pin, mut delay) = bus.release();
        pin.done();
        delay.done();
    }

    fn us(delays: &[u32]) -> Vec<DelayTransaction> {
        delays.iter().map(|&d| DelayTransaction::delay_us(d)).collect()
    }

    #[test]
    fn reset_detects_presence() {
        let mut bus = PinBus::new(PinMock::new(&reset_sequence(true)), NoopDelay::new());
        let status = bus.reset().unwrap();
        assert!(status.presence());
        assert!(!status.shortcircuit());
        assert_eq!(status.logic_level(), Some(true));
        finish(bus);
    }

    #[test]
    fn reset_without_presence_is_not_an_error() {
        let mut bus = PinBus::new(PinMock::new(&reset_sequence(false)), NoopDelay::new());
        let status = bus.reset().unwrap();
        assert!(!status.presence());
        assert!(!status.shortcircuit());
        finish(bus);
    }

    #[test]
    fn reset_reports_line_held_low() {
        let expectations = [
            PinTransaction::set(State::High),
            PinTransaction::get(State::Low),
        ];
        let mut bus = PinBus::new(PinMock::new(&expectations), NoopDelay::new());
        let status = bus.reset().unwrap();
        assert!(status.shortcircuit());
        assert!(!status.presence());
        finish(bus);
    }

    #[test]
    fn read_byte_is_lsb_first() {
        let mut bus = PinBus::new(PinMock::new(&read_sequence(0xa5)), NoopDelay::new());
        assert_eq!(bus.read_byte().unwrap(), 0xa5);
        finish(bus);
    }

    #[test]
    fn write_byte_generates_eight_slots() {
        let mut bus = PinBus::new(PinMock::new(&write_sequence()), NoopDelay::new());
        bus.write_byte(0x44).unwrap();
        finish(bus);
    }

    #[test]
    fn write_slots_follow_standard_timing() {
        // 0x44 goes out LSB first: 0 0 1 0 0 0 1 0
        let mut delays = Vec::new();
        for bit in [0, 0, 1, 0, 0, 0, 1, 0] {
            delays.extend(if bit == 1 { us(&[6, 64]) } else { us(&[60, 10]) });
        }
        let mut bus = PinBus::new(
            PinMock::new(&write_sequence()),
            CheckedDelay::new(&delays),
        );
        bus.write_byte(0x44).unwrap();
        finish_timed(bus);
    }

    #[test]
    fn write_bit_timing() {
        let expectations = [PinTransaction::set(State::Low), PinTransaction::set(State::High)];
        let mut bus = PinBus::new(PinMock::new(&expectations), CheckedDelay::new(&us(&[6, 64])));
        bus.write_bit(true).unwrap();
        finish_timed(bus);
        let mut bus = PinBus::new(PinMock::new(&expectations), CheckedDelay::new(&us(&[60, 10])));
        bus.write_bit(false).unwrap();
        finish_timed(bus);
    }

    #[test]
    fn reset_timing() {
        let mut bus = PinBus::new(
            PinMock::new(&reset_sequence(true)),
            CheckedDelay::new(&us(&[480, 70, 410])),
        );
        assert!(bus.reset().unwrap().presence());
        finish_timed(bus);
    }

    #[test]
    fn read_slot_samples_within_fifteen_microseconds() {
        let expectations = [
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
            PinTransaction::get(State::Low),
        ];
        let mut bus = PinBus::new(PinMock::new(&expectations), CheckedDelay::new(&us(&[6, 9, 55])));
        assert!(!bus.read_bit().unwrap());
        finish_timed(bus);
    }

    #[test]
    fn read_rom_checks_crc() {
        let rom = Rom::from_bytes([0x28, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x56]);
        let mut expectations = reset_sequence(true);
        expectations.extend(write_sequence());
        for b in rom.to_bytes() {
            expectations.extend(read_sequence(b));
        }
        let mut bus = PinBus::new(PinMock::new(&expectations), NoopDelay::new());
        assert_eq!(bus.read_rom().unwrap(), rom);
        finish(bus);
    }

    #[test]
    fn address_without_presence_fails() {
        let mut bus = PinBus::new(PinMock::new(&reset_sequence(false)), NoopDelay::new());
        assert!(matches!(
            bus.address(None),
            Err(OneWireError::NoDevicePresent)
        ));
        finish(bus);
    }
}
