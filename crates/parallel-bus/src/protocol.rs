/// What the bytes of a [`DisplayBus::send`] call mean to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteKind {
    /// Controller command; the command/data line is driven low.
    Command,
    /// Parameters or pixel data; the command/data line is driven high.
    Data,
}

/// How chip-select should behave while bytes are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipSelect {
    /// Leave chip-select as the transaction set it.
    #[default]
    Untouched,
    /// Pulse chip-select around every byte, for controllers that need it on
    /// serial buses.
    ToggleEveryByte,
}

/// Transport between display code and a display controller.
///
/// Every burst of [`send`](Self::send) calls must be bracketed by
/// [`begin_transaction`](Self::begin_transaction) and
/// [`end_transaction`](Self::end_transaction). Transactions do not nest.
pub trait DisplayBus {
    /// Pulses the controller's hardware reset line.
    ///
    /// Returns `false` if the bus has no reset line and nothing was done.
    fn reset(&mut self) -> bool;

    /// Returns `true` if a transaction can start right now.
    fn bus_free(&self) -> bool;

    /// Selects the controller. Returns `false` if the bus was busy.
    fn begin_transaction(&mut self) -> bool;

    /// Sends `data` in order.
    fn send(&mut self, kind: ByteKind, chip_select: ChipSelect, data: &[u8]);

    /// Deselects the controller.
    fn end_transaction(&mut self);

    /// Runs one full command cycle: `command` followed by its `params`.
    ///
    /// Returns `false`, sending nothing, if the transaction could not start.
    fn write_command(&mut self, command: u8, params: &[u8]) -> bool {
        if !self.begin_transaction() {
            return false;
        }
        self.send(ByteKind::Command, ChipSelect::Untouched, &[command]);
        if !params.is_empty() {
            self.send(ByteKind::Data, ChipSelect::Untouched, params);
        }
        self.end_transaction();
        true
    }
}

impl<B: DisplayBus + ?Sized> DisplayBus for &mut B {
    fn reset(&mut self) -> bool {
        B::reset(self)
    }

    fn bus_free(&self) -> bool {
        B::bus_free(self)
    }

    fn begin_transaction(&mut self) -> bool {
        B::begin_transaction(self)
    }

    fn send(&mut self, kind: ByteKind, chip_select: ChipSelect, data: &[u8]) {
        B::send(self, kind, chip_select, data)
    }

    fn end_transaction(&mut self) {
        B::end_transaction(self)
    }
}
