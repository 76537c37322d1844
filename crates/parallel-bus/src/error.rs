/// Function a pin serves on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    /// Data lane pin at the given offset from the base pin (0..8).
    Data(u8),
    Command,
    ChipSelect,
    Write,
    Read,
    Reset,
}

/// Pin assignments the hardware cannot support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The data base pin is not one of 0, 8, 16 or 24.
    MisalignedDataPin(u8),
    /// The write strobe is not in the low 32-pin bank.
    WritePinOutOfRange(u8),
    /// The pin does not exist on the GPIO port.
    PinOutOfRange(u8),
    /// The same pin was requested for two roles.
    DuplicatePin(u8),
}

/// Errors returned while constructing a [`ParallelBus`](crate::ParallelBus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    InvalidConfiguration(ConfigError),
    /// `pin`, requested as `role`, is already held by someone else.
    PinInUse { pin: u8, role: PinRole },
}

impl core::fmt::Display for PinRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PinRole::Data(offset) => write!(f, "data {}", offset),
            PinRole::Command => write!(f, "command"),
            PinRole::ChipSelect => write!(f, "chip select"),
            PinRole::Write => write!(f, "write"),
            PinRole::Read => write!(f, "read"),
            PinRole::Reset => write!(f, "reset"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::MisalignedDataPin(pin) => {
                write!(f, "Data 0 pin must be byte aligned and < 32, got {}", pin)
            }
            ConfigError::WritePinOutOfRange(pin) => {
                write!(f, "Write pin must be < 32, got {}", pin)
            }
            ConfigError::PinOutOfRange(pin) => {
                write!(f, "Pin {} does not exist", pin)
            }
            ConfigError::DuplicatePin(pin) => {
                write!(f, "Pin {} is assigned more than once", pin)
            }
        }
    }
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BusError::InvalidConfiguration(err) => {
                write!(f, "Invalid bus configuration: {}", err)
            }
            BusError::PinInUse { pin, role: PinRole::Data(offset) } => {
                write!(f, "Bus pin {} (GPIO{}) is already in use", offset, pin)
            }
            BusError::PinInUse { pin, role } => {
                write!(f, "{} pin (GPIO{}) is already in use", role, pin)
            }
        }
    }
}

impl From<ConfigError> for BusError {
    fn from(e: ConfigError) -> Self {
        BusError::InvalidConfiguration(e)
    }
}
