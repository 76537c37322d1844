use core::convert::Infallible;

use embedded_hal::digital::{OutputPin, PinState};

use crate::register::VolatileRegister;

/// Number of pins sharing one output register.
pub const BANK_WIDTH: u8 = 32;

/// A 32-pin group whose outputs live in one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bank {
    /// GPIO 0..32.
    Low,
    /// GPIO 32..64.
    High,
}

impl Bank {
    /// Bank holding `pin`, or `None` past the second bank.
    pub fn of(pin: u8) -> Option<Self> {
        match pin / BANK_WIDTH {
            0 => Some(Bank::Low),
            1 => Some(Bank::High),
            _ => None,
        }
    }

    /// Single-bit mask selecting `pin` within its bank.
    pub fn mask(pin: u8) -> u32 {
        1 << (pin % BANK_WIDTH)
    }
}

/// Output driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveMode {
    #[default]
    PushPull,
    OpenDrain,
}

/// Register-level access to a GPIO controller.
///
/// This is the only part of the bus that knows the chip's memory map. The
/// bus asks it to set pins up and for the registers it drives directly while
/// sending.
pub trait GpioPort {
    /// Number of GPIO pins the port exposes.
    const PIN_COUNT: u8;

    type Register: VolatileRegister;
    type Output: OutputPin<Error = Infallible>;

    /// Returns `true` if `pin` is bonded out on this chip. Ports with gaps
    /// in their numbering override this.
    fn pin_exists(&self, pin: u8) -> bool {
        pin < Self::PIN_COUNT
    }

    /// Enables `pin` as an output and routes it to the plain GPIO output
    /// function so that writes to the output register reach the pad.
    fn configure_data_pin(&mut self, pin: u8);

    /// Configures `pin` as a digital output starting at `initial`.
    fn configure_output(
        &mut self,
        pin: u8,
        initial: PinState,
        drive: DriveMode,
    ) -> Self::Output;

    /// Output register of `bank`; bit `n` drives pin `n` of the bank.
    fn output_register(&self, bank: Bank) -> Self::Register;

    /// Write-one-to-set output register of `bank`.
    fn set_register(&self, bank: Bank) -> Self::Register;

    /// Write-one-to-clear output register of `bank`.
    fn clear_register(&self, bank: Bank) -> Self::Register;
}

/// Drives an infallible output pin to `high`.
#[inline]
pub(crate) fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, high: bool) {
    match pin.set_state(PinState::from(high)) {
        Ok(()) => {}
        Err(never) => match never {},
    }
}
