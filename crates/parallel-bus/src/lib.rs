#![no_std]
//! Bit-banged 8-bit parallel bus for display controllers.
//!
//! Eight consecutive GPIOs in the low register bank carry each byte; the
//! command/data, chip-select, write and read strobes (plus an optional reset
//! line) are plain digital outputs. Every byte is merged into the shared
//! output register with a single word write and latched by a rising edge on
//! the write strobe.
//!
//! Pin ownership goes through a [`PinRegistry`] and register access through a
//! [`GpioPort`], so the same driver runs on hardware (see the `esp32s2`
//! feature) and against in-memory fakes.

mod bus;
mod error;
mod port;
mod protocol;
mod register;
mod registry;

#[cfg(feature = "esp32s2")]
pub mod esp32s2;

pub use bus::{BusPins, ParallelBus, DATA_WIDTH, RESET_PULSE_US};
pub use error::{BusError, ConfigError, PinRole};
pub use port::{Bank, DriveMode, GpioPort, BANK_WIDTH};
pub use protocol::{ByteKind, ChipSelect, DisplayBus};
pub use register::{MmioRegister, VolatileRegister};
pub use registry::{AtomicPinRegistry, PinRegistry, REGISTRY_CAPACITY};
