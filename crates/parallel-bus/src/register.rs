//! Narrow view of a 32-bit hardware register.

/// A 32-bit register accessed with volatile semantics.
///
/// Each `read` and `write` is a single full-width access. For write-one-to-set
/// and write-one-to-clear registers, `write(mask)` sets or clears exactly the
/// bits in `mask` and leaves all others alone; reading them is meaningless.
pub trait VolatileRegister {
    fn read(&self) -> u32;
    fn write(&self, value: u32);
}

/// Memory-mapped register at a fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmioRegister {
    addr: *mut u32,
}

impl MmioRegister {
    /// # Safety
    ///
    /// `addr` must be a valid, 4-byte aligned peripheral register address for
    /// as long as the returned value is used.
    pub const unsafe fn new(addr: usize) -> Self {
        Self { addr: addr as *mut u32 }
    }

    pub fn addr(&self) -> usize {
        self.addr as usize
    }
}

// SAFETY: the pointer names a peripheral register, not memory owned by a
// thread; every access is a single volatile word access.
unsafe impl Send for MmioRegister {}

impl VolatileRegister for MmioRegister {
    #[inline]
    fn read(&self) -> u32 {
        // SAFETY: validity of the address is the contract of `new`.
        unsafe { self.addr.read_volatile() }
    }

    #[inline]
    fn write(&self, value: u32) {
        // SAFETY: validity of the address is the contract of `new`.
        unsafe { self.addr.write_volatile(value) }
    }
}
