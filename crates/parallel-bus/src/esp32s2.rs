//! Memory-mapped GPIO backend for the ESP32-S2.
//!
//! Register offsets follow the IO MUX and GPIO matrix chapter of the ESP32-S2
//! Technical Reference Manual. The ESP32-S2 cannot store a single
//! byte into these registers, so the bus always writes whole words.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};

use crate::port::{drive, Bank, DriveMode, GpioPort};
use crate::register::{MmioRegister, VolatileRegister};

const GPIO_BASE: usize = 0x3F40_4000;

const GPIO_OUT: usize = GPIO_BASE + 0x0004;
const GPIO_OUT_W1TS: usize = GPIO_BASE + 0x0008;
const GPIO_OUT_W1TC: usize = GPIO_BASE + 0x000C;
const GPIO_OUT1: usize = GPIO_BASE + 0x0010;
const GPIO_OUT1_W1TS: usize = GPIO_BASE + 0x0014;
const GPIO_OUT1_W1TC: usize = GPIO_BASE + 0x0018;
const GPIO_ENABLE_W1TS: usize = GPIO_BASE + 0x0024;
const GPIO_ENABLE1_W1TS: usize = GPIO_BASE + 0x0030;
const GPIO_PIN0: usize = GPIO_BASE + 0x0074;
const GPIO_FUNC0_OUT_SEL_CFG: usize = GPIO_BASE + 0x0554;

/// GPIO_PINn_PAD_DRIVER: 1 = open drain.
const PAD_DRIVER: u32 = 1 << 2;
/// Output signal index that hands the pad to the GPIO output registers.
const SIG_GPIO_OUT_IDX: u32 = 0x100;
/// Numbers inside `PIN_COUNT` with no pad behind them.
const MISSING_PADS: core::ops::RangeInclusive<u8> = 22..=25;

/// Handle to the ESP32-S2 GPIO controller.
pub struct Esp32s2Gpio {
    _private: (),
}

impl Esp32s2Gpio {
    /// # Safety
    ///
    /// Must only be used on an ESP32-S2, and no other code may reconfigure
    /// the pins handed to it while the resulting outputs are alive.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }

    fn reg(addr: usize) -> MmioRegister {
        // SAFETY: every address passed here is a GPIO register from the
        // ESP32-S2 memory map, and `steal` restricts us to that chip.
        unsafe { MmioRegister::new(addr) }
    }

    fn per_pin(base: usize, pin: u8) -> MmioRegister {
        Self::reg(base + 4 * pin as usize)
    }

    fn enable_output(pin: u8) {
        let enable = match Bank::of(pin) {
            Some(Bank::Low) => GPIO_ENABLE_W1TS,
            _ => GPIO_ENABLE1_W1TS,
        };
        Self::reg(enable).write(Bank::mask(pin));
    }
}

impl GpioPort for Esp32s2Gpio {
    const PIN_COUNT: u8 = 47;

    type Register = MmioRegister;
    type Output = Esp32s2Output;

    fn pin_exists(&self, pin: u8) -> bool {
        pin < Self::PIN_COUNT && !MISSING_PADS.contains(&pin)
    }

    fn configure_data_pin(&mut self, pin: u8) {
        Self::enable_output(pin);
        Self::per_pin(GPIO_FUNC0_OUT_SEL_CFG, pin).write(SIG_GPIO_OUT_IDX);
    }

    fn configure_output(
        &mut self,
        pin: u8,
        initial: PinState,
        mode: DriveMode,
    ) -> Esp32s2Output {
        let bank = Bank::of(pin).unwrap_or(Bank::High);
        let mut output = Esp32s2Output {
            mask: Bank::mask(pin),
            set: self.set_register(bank),
            clear: self.clear_register(bank),
        };
        // Latch the level before the driver is enabled to avoid a glitch.
        drive(&mut output, initial == PinState::High);

        let pad = Self::per_pin(GPIO_PIN0, pin);
        match mode {
            DriveMode::PushPull => pad.write(pad.read() & !PAD_DRIVER),
            DriveMode::OpenDrain => pad.write(pad.read() | PAD_DRIVER),
        }
        Self::per_pin(GPIO_FUNC0_OUT_SEL_CFG, pin).write(SIG_GPIO_OUT_IDX);
        Self::enable_output(pin);
        output
    }

    fn output_register(&self, bank: Bank) -> MmioRegister {
        match bank {
            Bank::Low => Self::reg(GPIO_OUT),
            Bank::High => Self::reg(GPIO_OUT1),
        }
    }

    fn set_register(&self, bank: Bank) -> MmioRegister {
        match bank {
            Bank::Low => Self::reg(GPIO_OUT_W1TS),
            Bank::High => Self::reg(GPIO_OUT1_W1TS),
        }
    }

    fn clear_register(&self, bank: Bank) -> MmioRegister {
        match bank {
            Bank::Low => Self::reg(GPIO_OUT_W1TC),
            Bank::High => Self::reg(GPIO_OUT1_W1TC),
        }
    }
}

/// Single GPIO output driven through the set/clear registers of its bank.
pub struct Esp32s2Output {
    mask: u32,
    set: MmioRegister,
    clear: MmioRegister,
}

impl ErrorType for Esp32s2Output {
    type Error = Infallible;
}

impl OutputPin for Esp32s2Output {
    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set.write(self.mask);
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.clear.write(self.mask);
        Ok(())
    }
}
