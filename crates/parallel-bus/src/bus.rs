use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::error::{BusError, ConfigError, PinRole};
use crate::port::{drive, Bank, DriveMode, GpioPort, BANK_WIDTH};
use crate::protocol::{ByteKind, ChipSelect, DisplayBus};
use crate::register::VolatileRegister;
use crate::registry::PinRegistry;

/// Width of the data lane in pins.
pub const DATA_WIDTH: u8 = 8;

/// Low time of the hardware reset pulse.
pub const RESET_PULSE_US: u32 = 4;

/// Pin assignment for a [`ParallelBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusPins {
    /// First of the eight data pins. Must be 0, 8, 16 or 24.
    pub data0: u8,
    pub command: u8,
    pub chip_select: u8,
    /// Write strobe. Must be below 32.
    pub write: u8,
    /// Read strobe; held inactive since the bus never reads.
    pub read: u8,
    pub reset: Option<u8>,
}

impl BusPins {
    /// Every pin the bus will own, with the role it plays.
    pub fn assignments(&self) -> impl Iterator<Item = (u8, PinRole)> + '_ {
        (0..DATA_WIDTH)
            .map(move |i| (self.data0.wrapping_add(i), PinRole::Data(i)))
            .chain([
                (self.command, PinRole::Command),
                (self.chip_select, PinRole::ChipSelect),
                (self.write, PinRole::Write),
                (self.read, PinRole::Read),
            ])
            .chain(self.reset.map(|pin| (pin, PinRole::Reset)))
    }

    /// Checks the assignment against `port` and `registry` without
    /// touching either.
    pub fn validate<P: GpioPort, R: PinRegistry>(
        &self,
        port: &P,
        registry: &R,
    ) -> Result<(), BusError> {
        if self.data0 % DATA_WIDTH != 0 || self.data0 >= BANK_WIDTH {
            return Err(ConfigError::MisalignedDataPin(self.data0).into());
        }

        for (pin, role) in self.assignments().take(DATA_WIDTH as usize) {
            if !port.pin_exists(pin) {
                return Err(ConfigError::PinOutOfRange(pin).into());
            }
            if !registry.pin_is_free(pin) {
                return Err(BusError::PinInUse { pin, role });
            }
        }

        if self.write >= BANK_WIDTH {
            return Err(ConfigError::WritePinOutOfRange(self.write).into());
        }

        for (i, (pin, role)) in self.assignments().enumerate() {
            if !port.pin_exists(pin) {
                return Err(ConfigError::PinOutOfRange(pin).into());
            }
            if self.assignments().take(i).any(|(other, _)| other == pin) {
                return Err(ConfigError::DuplicatePin(pin).into());
            }
            if !registry.pin_is_free(pin) {
                return Err(BusError::PinInUse { pin, role });
            }
        }

        Ok(())
    }
}

/// Reset line of the controller, if one is wired.
enum ResetLine<O> {
    Present(O),
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    TransactionOpen,
}

/// An 8-bit parallel display bus driven by toggling GPIO registers.
///
/// The bus owns its pins from construction until it is dropped (or
/// [`deinit`](Self::deinit)ed), at which point they go back to the registry.
pub struct ParallelBus<P: GpioPort, R: PinRegistry, D: DelayNs> {
    registry: R,
    delay: D,
    pins: BusPins,
    /// Output register of the low bank, which holds the data lane.
    output: P::Register,
    write_set: P::Register,
    write_clear: P::Register,
    write_mask: u32,
    command: P::Output,
    chip_select: P::Output,
    // Held so the strobes stay configured as outputs. The write strobe is
    // toggled through `write_set`/`write_clear` instead.
    _write: P::Output,
    _read: P::Output,
    reset: ResetLine<P::Output>,
    phase: Phase,
}

impl<P: GpioPort, R: PinRegistry, D: DelayNs> ParallelBus<P, R, D> {
    /// Validates and reserves `pins`, configures them on `port` and pulses
    /// the reset line if there is one.
    ///
    /// Nothing is left reserved or configured unless every check passes. A
    /// pin taken by someone else between the checks and the reservation
    /// rolls back what was already reserved and reports
    /// [`BusError::PinInUse`].
    pub fn new(
        port: &mut P,
        registry: R,
        pins: BusPins,
        delay: D,
    ) -> Result<Self, BusError> {
        if let Err(e) = pins
            .validate(&*port, &registry)
            .and_then(|()| Self::reserve(&registry, &pins))
        {
            #[cfg(feature = "defmt")]
            defmt::warn!("Parallel bus rejected: {}", e);
            return Err(e);
        }

        for i in 0..DATA_WIDTH {
            port.configure_data_pin(pins.data0 + i);
        }

        let mut output_high =
            |pin| port.configure_output(pin, PinState::High, DriveMode::PushPull);
        let command = output_high(pins.command);
        let chip_select = output_high(pins.chip_select);
        let write = output_high(pins.write);
        let read = output_high(pins.read);
        let reset = match pins.reset {
            Some(pin) => ResetLine::Present(output_high(pin)),
            None => ResetLine::Absent,
        };

        let mut bus = Self {
            registry,
            delay,
            pins,
            output: port.output_register(Bank::Low),
            write_set: port.set_register(Bank::Low),
            write_clear: port.clear_register(Bank::Low),
            write_mask: Bank::mask(pins.write),
            command,
            chip_select,
            _write: write,
            _read: read,
            reset,
            phase: Phase::Idle,
        };
        bus.reset();

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Parallel bus ready: data GPIO{}..={}, write GPIO{}",
            pins.data0,
            pins.data0 + DATA_WIDTH - 1,
            pins.write
        );

        Ok(bus)
    }

    /// Returns `true` between `begin_transaction` and `end_transaction`.
    pub fn in_transaction(&self) -> bool {
        self.phase == Phase::TransactionOpen
    }

    /// Releases every pin back to the registry.
    ///
    /// Equivalent to dropping the bus.
    pub fn deinit(self) {}

    fn reserve(registry: &R, pins: &BusPins) -> Result<(), BusError> {
        for (i, (pin, role)) in pins.assignments().enumerate() {
            if !registry.try_reserve_permanently(pin) {
                for (taken, _) in pins.assignments().take(i) {
                    registry.release(taken);
                }
                return Err(BusError::PinInUse { pin, role });
            }
        }
        Ok(())
    }

    fn release_pins(&mut self) {
        for (pin, _) in self.pins.assignments() {
            self.registry.release(pin);
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("Parallel bus on GPIO{} released", self.pins.data0);
    }
}

impl<P: GpioPort, R: PinRegistry, D: DelayNs> DisplayBus for ParallelBus<P, R, D> {
    fn reset(&mut self) -> bool {
        match &mut self.reset {
            ResetLine::Absent => false,
            ResetLine::Present(line) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("Pulsing display reset");
                drive(line, false);
                self.delay.delay_us(RESET_PULSE_US);
                drive(line, true);
                true
            }
        }
    }

    fn bus_free(&self) -> bool {
        true
    }

    fn begin_transaction(&mut self) -> bool {
        if self.phase == Phase::TransactionOpen {
            #[cfg(feature = "defmt")]
            defmt::warn!("Parallel bus transaction is already open");
        }
        drive(&mut self.chip_select, false);
        self.phase = Phase::TransactionOpen;
        true
    }

    /// Clocks `data` out over the lane, one write strobe per byte.
    ///
    /// The lane shares its output register with 24 other pins, and the
    /// register only takes word writes, so each byte is merged into a copy
    /// of the register taken at the start of the call. Chip-select stays
    /// asserted for the whole transaction whatever `_chip_select` asks for.
    fn send(&mut self, kind: ByteKind, _chip_select: ChipSelect, data: &[u8]) {
        drive(&mut self.command, kind == ByteKind::Data);

        let shift = u32::from(self.pins.data0);
        let lane = 0xFF_u32 << shift;

        self.write_clear.write(self.write_mask);
        let mut word = self.output.read();

        for &byte in data {
            self.write_clear.write(self.write_mask);
            word = (word & !lane) | (u32::from(byte) << shift);
            self.output.write(word);
            // Controller latches on this rising edge.
            self.write_set.write(self.write_mask);
        }
    }

    fn end_transaction(&mut self) {
        drive(&mut self.chip_select, true);
        self.phase = Phase::Idle;
    }
}

impl<P: GpioPort, R: PinRegistry, D: DelayNs> Drop for ParallelBus<P, R, D> {
    fn drop(&mut self) {
        self.release_pins();
    }
}
