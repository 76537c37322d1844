#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use parallel_bus::{
    AtomicPinRegistry, Bank, BusPins, DriveMode, GpioPort, PinRegistry,
    VolatileRegister, BANK_WIDTH,
};

// ---------------------------------------------------------------------------
// Fake register bank
// ---------------------------------------------------------------------------

/// Everything the driver did to the fake hardware, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Data pin routed to the plain GPIO output function.
    DataPin(u8),
    /// Control pin configured as an output at the given level.
    Output { pin: u8, high: bool, drive: DriveMode },
    /// Full word written to the low bank output register.
    Out(u32),
    /// Mask written to the low bank write-one-to-set register.
    Set(u32),
    /// Mask written to the low bank write-one-to-clear register.
    Clear(u32),
    /// Control line driven to a level.
    Line { pin: u8, high: bool },
    Delay { ns: u64 },
}

/// In-memory stand-in for the two GPIO output banks.
///
/// Every change to the low bank's output word is appended to `history` so
/// tests can look for strobe edges.
#[derive(Default)]
pub struct FakeBank {
    out: [Cell<u32>; 2],
    trace: RefCell<Vec<Event>>,
    history: RefCell<Vec<u32>>,
}

impl FakeBank {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Current value of the low bank output register.
    pub fn output(&self) -> u32 {
        self.out[0].get()
    }

    /// Sets the low bank output word as if another subsystem drove it.
    pub fn preset(&self, value: u32) {
        self.out[0].set(value);
    }

    pub fn trace(&self) -> Vec<Event> {
        self.trace.borrow().clone()
    }

    pub fn history(&self) -> Vec<u32> {
        self.history.borrow().clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear_trace(&self) {
        self.trace.borrow_mut().clear();
        self.history.borrow_mut().clear();
    }

    fn push(&self, event: Event) {
        self.trace.borrow_mut().push(event);
    }

    fn update(&self, bank: usize, value: u32) {
        self.out[bank].set(value);
        if bank == 0 {
            self.history.borrow_mut().push(value);
        }
    }

    fn drive_pin(&self, pin: u8, high: bool) {
        let bank = (pin / BANK_WIDTH) as usize;
        let old = self.out[bank].get();
        let new = if high { old | Bank::mask(pin) } else { old & !Bank::mask(pin) };
        self.update(bank, new);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegKind {
    Out,
    Set,
    Clear,
}

pub struct FakeRegister {
    bank: Rc<FakeBank>,
    index: usize,
    kind: RegKind,
}

impl VolatileRegister for FakeRegister {
    fn read(&self) -> u32 {
        match self.kind {
            RegKind::Out => self.bank.out[self.index].get(),
            RegKind::Set | RegKind::Clear => 0,
        }
    }

    fn write(&self, value: u32) {
        let old = self.bank.out[self.index].get();
        let (event, new) = match self.kind {
            RegKind::Out => (Event::Out(value), value),
            RegKind::Set => (Event::Set(value), old | value),
            RegKind::Clear => (Event::Clear(value), old & !value),
        };
        if self.index == 0 {
            self.bank.push(event);
        }
        self.bank.update(self.index, new);
    }
}

pub struct FakeOutput {
    bank: Rc<FakeBank>,
    pin: u8,
}

impl ErrorType for FakeOutput {
    type Error = Infallible;
}

impl OutputPin for FakeOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.bank.push(Event::Line { pin: self.pin, high: false });
        self.bank.drive_pin(self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.bank.push(Event::Line { pin: self.pin, high: true });
        self.bank.drive_pin(self.pin, true);
        Ok(())
    }
}

pub struct FakePort {
    pub bank: Rc<FakeBank>,
    missing: Vec<u8>,
}

impl FakePort {
    pub fn new(bank: &Rc<FakeBank>) -> Self {
        Self { bank: bank.clone(), missing: Vec::new() }
    }

    /// Port whose numbering skips `missing`.
    pub fn with_missing(bank: &Rc<FakeBank>, missing: &[u8]) -> Self {
        Self { bank: bank.clone(), missing: missing.to_vec() }
    }

    fn register(&self, bank: Bank, kind: RegKind) -> FakeRegister {
        let index = match bank {
            Bank::Low => 0,
            Bank::High => 1,
        };
        FakeRegister { bank: self.bank.clone(), index, kind }
    }
}

impl GpioPort for FakePort {
    const PIN_COUNT: u8 = 47;

    type Register = FakeRegister;
    type Output = FakeOutput;

    fn pin_exists(&self, pin: u8) -> bool {
        pin < Self::PIN_COUNT && !self.missing.contains(&pin)
    }

    fn configure_data_pin(&mut self, pin: u8) {
        self.bank.push(Event::DataPin(pin));
    }

    fn configure_output(
        &mut self,
        pin: u8,
        initial: PinState,
        drive: DriveMode,
    ) -> FakeOutput {
        let high = initial == PinState::High;
        self.bank.push(Event::Output { pin, high, drive });
        self.bank.drive_pin(pin, high);
        FakeOutput { bank: self.bank.clone(), pin }
    }

    fn output_register(&self, bank: Bank) -> FakeRegister {
        self.register(bank, RegKind::Out)
    }

    fn set_register(&self, bank: Bank) -> FakeRegister {
        self.register(bank, RegKind::Set)
    }

    fn clear_register(&self, bank: Bank) -> FakeRegister {
        self.register(bank, RegKind::Clear)
    }
}

pub struct FakeDelay {
    bank: Rc<FakeBank>,
}

impl FakeDelay {
    pub fn new(bank: &Rc<FakeBank>) -> Self {
        Self { bank: bank.clone() }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.bank.push(Event::Delay { ns: u64::from(ns) });
    }

    fn delay_us(&mut self, us: u32) {
        self.bank.push(Event::Delay { ns: u64::from(us) * 1_000 });
    }
}

// ---------------------------------------------------------------------------
// Recording registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOp {
    Reserve(u8),
    Release(u8),
}

/// Registry that logs every mutation before forwarding it.
#[derive(Default)]
pub struct RecordingRegistry {
    pub inner: AtomicPinRegistry,
    ops: RefCell<Vec<RegistryOp>>,
}

impl RecordingRegistry {
    pub fn ops(&self) -> Vec<RegistryOp> {
        self.ops.borrow().clone()
    }
}

impl PinRegistry for RecordingRegistry {
    fn pin_is_free(&self, pin: u8) -> bool {
        self.inner.pin_is_free(pin)
    }

    fn reserve_permanently(&self, pin: u8) {
        self.ops.borrow_mut().push(RegistryOp::Reserve(pin));
        self.inner.reserve_permanently(pin);
    }

    fn release(&self, pin: u8) {
        self.ops.borrow_mut().push(RegistryOp::Release(pin));
        self.inner.release(pin);
    }
}

/// Registry whose `pin_is_free` still reports `late` as free after another
/// owner took it, as if that owner got in between check and reservation.
pub struct StaleRegistry {
    pub inner: AtomicPinRegistry,
    late: u8,
}

impl StaleRegistry {
    pub fn new(late: u8) -> Self {
        let inner = AtomicPinRegistry::new();
        inner.claim(late);
        Self { inner, late }
    }
}

impl PinRegistry for StaleRegistry {
    fn pin_is_free(&self, pin: u8) -> bool {
        pin == self.late || self.inner.pin_is_free(pin)
    }

    fn reserve_permanently(&self, pin: u8) {
        self.inner.reserve_permanently(pin);
    }

    fn release(&self, pin: u8) {
        self.inner.release(pin);
    }

    fn try_reserve_permanently(&self, pin: u8) -> bool {
        self.inner.try_reserve_permanently(pin)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub const COMMAND: u8 = 2;
pub const CHIP_SELECT: u8 = 3;
pub const WRITE: u8 = 4;
pub const READ: u8 = 5;
pub const RESET: u8 = 6;

pub const WRITE_MASK: u32 = 1 << WRITE;

/// Pin layout used by most tests: data on GPIO8..16, control on GPIO2..6.
pub fn pins(data0: u8, reset: Option<u8>) -> BusPins {
    BusPins {
        data0,
        command: COMMAND,
        chip_select: CHIP_SELECT,
        write: WRITE,
        read: READ,
        reset,
    }
}

/// Output words seen at each rising edge of `pin` in `history`.
pub fn latched(history: &[u32], pin: u8) -> Vec<u32> {
    let mask = Bank::mask(pin);
    history
        .windows(2)
        .filter(|w| w[0] & mask == 0 && w[1] & mask != 0)
        .map(|w| w[1])
        .collect()
}

/// Levels `pin` went through in `trace`, in order.
pub fn line_levels(trace: &[Event], pin: u8) -> Vec<bool> {
    trace
        .iter()
        .filter_map(|e| match *e {
            Event::Line { pin: p, high } if p == pin => Some(high),
            _ => None,
        })
        .collect()
}

/// Number of pins in `0..64` held by `registry`.
pub fn reserved_count<R: PinRegistry>(registry: &R) -> usize {
    (0..64).filter(|&pin| !registry.pin_is_free(pin)).count()
}
