#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
//! # onewire-bus
//! A no-std abstraction of a 1-Wire bus master.
//!
//! The [OneWire] trait defines the operations a bus master has to provide: resetting the bus
//! and detecting presence, writing and reading bytes, and writing and reading single time slots.
//! ROM-level helpers ([OneWire::address], [OneWire::read_rom]) are provided on top of those.
//!
//! [PinBus] implements the trait by bit-banging an open-drain GPIO pin through the
//! [`embedded-hal`](embedded_hal) 1.0 digital and delay traits.

mod error;
mod pin;
mod rom;
mod traits;
mod utils;
pub use error::OneWireError;
pub use pin::{LineStatus, PinBus};
pub use rom::{ParseRomError, Rom};
pub use traits::{OneWire, OneWireStatus};
pub use utils::OneWireCrc;

/// Error type for 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;

/// Command to read the ROM code of the only device on the bus
pub const ONEWIRE_READ_ROM_CMD: u8 = 0x33;

/// Command to match a specific ROM address in 1-Wire communication
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM address in 1-Wire communication, addressing every device on the bus
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;
