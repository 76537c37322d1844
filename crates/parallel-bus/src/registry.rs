use portable_atomic::{AtomicU64, Ordering};

/// Number of pins an [`AtomicPinRegistry`] can track.
pub const REGISTRY_CAPACITY: u8 = 64;

/// Process-wide record of which GPIO pins are owned.
///
/// Construction of a bus checks pins with [`pin_is_free`](Self::pin_is_free)
/// before reserving any of them, and teardown hands every one back through
/// [`release`](Self::release).
pub trait PinRegistry {
    /// Returns `true` if nobody currently holds `pin`.
    fn pin_is_free(&self, pin: u8) -> bool;

    /// Claims `pin` and exempts it from soft resets until it is released.
    fn reserve_permanently(&self, pin: u8);

    /// Returns `pin` to the free pool.
    fn release(&self, pin: u8);

    /// Reserves `pin` permanently only if it is free. Returns `false`, and
    /// changes nothing, if someone else holds it.
    ///
    /// The provided version checks and then reserves; registries shared
    /// between threads should override it with a single atomic step.
    fn try_reserve_permanently(&self, pin: u8) -> bool {
        if !self.pin_is_free(pin) {
            return false;
        }
        self.reserve_permanently(pin);
        true
    }
}

impl<R: PinRegistry + ?Sized> PinRegistry for &R {
    fn pin_is_free(&self, pin: u8) -> bool {
        R::pin_is_free(self, pin)
    }

    fn reserve_permanently(&self, pin: u8) {
        R::reserve_permanently(self, pin)
    }

    fn release(&self, pin: u8) {
        R::release(self, pin)
    }

    fn try_reserve_permanently(&self, pin: u8) -> bool {
        R::try_reserve_permanently(self, pin)
    }
}

/// Lock-free [`PinRegistry`] backed by two 64-bit masks.
///
/// `claimed` holds every pin in use; `never_reset` is the subset that
/// survives [`soft_reset`](Self::soft_reset). Pins at or past
/// [`REGISTRY_CAPACITY`] are never free and cannot be claimed; releasing
/// them does nothing. Can live in a `static`:
///
/// ```
/// use parallel_bus::AtomicPinRegistry;
///
/// static PINS: AtomicPinRegistry = AtomicPinRegistry::new();
/// ```
pub struct AtomicPinRegistry {
    claimed: AtomicU64,
    never_reset: AtomicU64,
}

impl AtomicPinRegistry {
    pub const fn new() -> Self {
        Self { claimed: AtomicU64::new(0), never_reset: AtomicU64::new(0) }
    }

    #[inline]
    fn bit(pin: u8) -> Option<u64> {
        (pin < REGISTRY_CAPACITY).then(|| 1u64 << pin)
    }

    /// Claims `pin` for ordinary use. The claim is dropped by the next
    /// [`soft_reset`](Self::soft_reset).
    ///
    /// Returns `false` if the pin was already claimed or is past capacity.
    pub fn claim(&self, pin: u8) -> bool {
        let Some(bit) = Self::bit(pin) else {
            return false;
        };
        self.claimed.fetch_or(bit, Ordering::AcqRel) & bit == 0
    }

    /// Releases every claimed pin except those reserved permanently.
    pub fn soft_reset(&self) {
        let keep = self.never_reset.load(Ordering::Acquire);
        self.claimed.fetch_and(keep, Ordering::AcqRel);
    }

    /// Returns `true` if `pin` survives a soft reset.
    pub fn is_never_reset(&self, pin: u8) -> bool {
        Self::bit(pin)
            .is_some_and(|bit| self.never_reset.load(Ordering::Acquire) & bit != 0)
    }

    /// Number of pins currently claimed.
    pub fn claimed_count(&self) -> u32 {
        self.claimed.load(Ordering::Acquire).count_ones()
    }
}

impl Default for AtomicPinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PinRegistry for AtomicPinRegistry {
    fn pin_is_free(&self, pin: u8) -> bool {
        Self::bit(pin)
            .is_some_and(|bit| self.claimed.load(Ordering::Acquire) & bit == 0)
    }

    fn reserve_permanently(&self, pin: u8) {
        let Some(bit) = Self::bit(pin) else {
            return;
        };
        // Mark never-reset first so a concurrent soft reset cannot drop the claim.
        self.never_reset.fetch_or(bit, Ordering::AcqRel);
        self.claimed.fetch_or(bit, Ordering::AcqRel);
    }

    fn release(&self, pin: u8) {
        let Some(bit) = Self::bit(pin) else {
            return;
        };
        self.claimed.fetch_and(!bit, Ordering::AcqRel);
        self.never_reset.fetch_and(!bit, Ordering::AcqRel);
    }

    fn try_reserve_permanently(&self, pin: u8) -> bool {
        let Some(bit) = Self::bit(pin) else {
            return false;
        };
        let was_never_reset = self.never_reset.fetch_or(bit, Ordering::AcqRel) & bit != 0;
        if self.claimed.fetch_or(bit, Ordering::AcqRel) & bit != 0 {
            // Lost the pin; leave the holder's never-reset mark as it was.
            if !was_never_reset {
                self.never_reset.fetch_and(!bit, Ordering::AcqRel);
            }
            return false;
        }
        true
    }
}
