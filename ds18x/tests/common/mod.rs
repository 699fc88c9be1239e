//! A DS18x device simulated behind the [`OneWire`] trait.
#![allow(dead_code)]

use embedded_hal::delay::DelayNs;
use onewire_bus::{OneWire, OneWireCrc, OneWireResult, OneWireStatus, Rom};
use std::collections::VecDeque;

pub fn rom_for(family: u8) -> Rom {
    let mut bytes = [family, 0x6f, 0x3a, 0x11, 0x07, 0x00, 0x00, 0x00];
    bytes[7] = OneWireCrc::checksum(&bytes[..7]);
    Rom::from_bytes(bytes)
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "{} is not close to {}",
        actual,
        expected
    );
}

#[derive(Debug, Clone, Copy)]
pub struct SimStatus {
    presence: bool,
}

impl OneWireStatus for SimStatus {
    fn presence(&self) -> bool {
        self.presence
    }

    fn shortcircuit(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Idle,
    RomCommand,
    MatchRom(Vec<u8>),
    Function,
    WriteScratch(usize),
    Converting,
}

/// Simulated sensor. Unread bytes and bits float high, like an idle line.
#[derive(Debug)]
pub struct SimDs18x {
    pub rom: Rom,
    pub present: bool,
    /// Raw temperature register value latched by the next conversion.
    pub raw: i16,
    pub count_remain: u8,
    /// Read slots answered with 0 after Convert T.
    pub busy_polls: usize,
    pub never_completes: bool,
    pub ignore_writes: bool,
    pub corrupt_crc: bool,
    pub parasite: bool,
    pub conversions: usize,
    pub read_bits: usize,
    pub eeprom: [u8; 3],
    scratchpad: [u8; 9],
    state: State,
    busy: usize,
    out: VecDeque<u8>,
    bits: VecDeque<bool>,
}

impl SimDs18x {
    pub fn new(family: u8) -> Self {
        let mut sim = SimDs18x {
            rom: rom_for(family),
            present: true,
            raw: 0x0191,
            count_remain: 0x0c,
            busy_polls: 0,
            never_completes: false,
            ignore_writes: false,
            corrupt_crc: false,
            parasite: false,
            conversions: 0,
            read_bits: 0,
            eeprom: [0x4b, 0x46, 0x7f],
            scratchpad: [0x50, 0x05, 0x4b, 0x46, 0x7f, 0xff, 0x0c, 0x10, 0x00],
            state: State::Idle,
            busy: 0,
            out: VecDeque::new(),
            bits: VecDeque::new(),
        };
        if !sim.has_config_register() {
            sim.scratchpad[4] = 0xff;
        }
        sim.update_crc();
        sim
    }

    pub fn scratchpad(&self) -> [u8; 9] {
        self.scratchpad
    }

    fn has_config_register(&self) -> bool {
        self.rom.family() != 0x10
    }

    fn update_crc(&mut self) {
        self.scratchpad[8] = OneWireCrc::checksum(&self.scratchpad[..8]);
    }

    fn function(&mut self, cmd: u8) {
        self.state = State::Function;
        match cmd {
            0xbe => {
                let mut sp = self.scratchpad;
                if self.corrupt_crc {
                    sp[8] ^= 0x5a;
                }
                self.out.extend(sp);
            }
            0x4e => self.state = State::WriteScratch(0),
            0x44 => {
                self.conversions += 1;
                let [lsb, msb] = self.raw.to_le_bytes();
                self.scratchpad[0] = lsb;
                self.scratchpad[1] = msb;
                if !self.has_config_register() {
                    self.scratchpad[6] = self.count_remain;
                }
                self.update_crc();
                self.busy = self.busy_polls;
                self.state = State::Converting;
            }
            0xb4 => self.bits.push_back(!self.parasite),
            0x48 => self.eeprom.copy_from_slice(&self.scratchpad[2..5]),
            0xb8 => {
                let n = if self.has_config_register() { 3 } else { 2 };
                self.scratchpad[2..2 + n].copy_from_slice(&self.eeprom[..n]);
                self.update_crc();
            }
            _ => self.state = State::Idle,
        }
    }
}

impl OneWire for SimDs18x {
    type Status = SimStatus;
    type BusError = ();

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.out.clear();
        self.bits.clear();
        self.state = if self.present {
            State::RomCommand
        } else {
            State::Idle
        };
        Ok(SimStatus {
            presence: self.present,
        })
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        match core::mem::replace(&mut self.state, State::Idle) {
            State::RomCommand => match byte {
                0x33 => {
                    self.out.extend(self.rom.to_bytes());
                    self.state = State::Function;
                }
                0x55 => self.state = State::MatchRom(Vec::new()),
                0xcc => self.state = State::Function,
                _ => {}
            },
            State::MatchRom(mut received) => {
                received.push(byte);
                if received.len() < 8 {
                    self.state = State::MatchRom(received);
                } else if received == self.rom.to_bytes() {
                    self.state = State::Function;
                }
            }
            State::Function => self.function(byte),
            State::WriteScratch(i) => {
                let n = if self.has_config_register() { 3 } else { 2 };
                if !self.ignore_writes {
                    self.scratchpad[2 + i] = if i == 2 { byte & 0x7f } else { byte };
                    self.update_crc();
                }
                if i + 1 < n {
                    self.state = State::WriteScratch(i + 1);
                }
            }
            State::Idle | State::Converting => {}
        }
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        Ok(self.out.pop_front().unwrap_or(0xff))
    }

    fn write_bit(&mut self, _bit: bool) -> OneWireResult<(), Self::BusError> {
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.read_bits += 1;
        if self.state == State::Converting {
            if self.never_completes {
                return Ok(false);
            }
            if self.busy > 0 {
                self.busy -= 1;
                return Ok(false);
            }
            return Ok(true);
        }
        Ok(self.bits.pop_front().unwrap_or(true))
    }
}

/// Delay that only adds up the requested time.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}
