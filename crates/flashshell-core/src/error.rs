//! Error types for flashshell-core
//!
//! All errors are small `Copy` values so they can be returned from command
//! handlers on the target without allocation. Display output is what the
//! operator sees after `error <code>:` on the console.

use core::fmt;

use crate::number::ParseError;

/// Failure reported by the flash driver
///
/// The code is whatever the driver implementation uses to describe the
/// failure (status register bits on hardware). It is shown verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverError {
    /// Implementation defined error code
    pub code: u32,
}

impl DriverError {
    /// Create a driver error from an implementation defined code
    pub const fn new(code: u32) -> Self {
        Self { code }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flash driver error 0x{:08X}", self.code)
    }
}

/// Record store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Record identifier outside the store's identifier space
    InvalidId(u8),
    /// Record length is zero or larger than the store supports
    InvalidLength(usize),
    /// There is no record with this id
    NotFound(u8),
    /// Not enough free space left in the log
    NoSpace,
    /// The log contains an entry that cannot be parsed
    Corrupt {
        /// Byte offset of the bad entry inside the store region
        offset: u32,
    },
    /// The underlying flash driver failed
    Driver(DriverError),
}

impl From<DriverError> for StoreError {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId(id) => write!(f, "invalid record id {}", id),
            Self::InvalidLength(len) => write!(f, "invalid record length {}", len),
            Self::NotFound(id) => write!(f, "record {} not found", id),
            Self::NoSpace => write!(f, "record store full, run 'fds format'"),
            Self::Corrupt { offset } => {
                write!(f, "record store corrupt at offset 0x{:04X}", offset)
            }
            Self::Driver(e) => write!(f, "{}", e),
        }
    }
}

/// Why a command failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    // Parse errors
    /// A required argument is missing
    MissingArguments,
    /// More argument tokens than the shell accepts
    TooManyArguments,
    /// Unknown dump mode or render flag
    InvalidMode,
    /// Unknown subcommand
    UnknownSubcommand,
    /// A numeric argument could not be parsed
    InvalidNumber {
        /// Name of the argument
        arg: &'static str,
        /// Parser failure
        error: ParseError,
    },
    /// A numeric argument parsed but is outside the accepted range
    OutOfRange {
        /// Name of the argument
        arg: &'static str,
    },

    // Policy violations
    /// Page is below the protected boundary (or beyond the last page)
    ProtectedPage {
        /// Offending page index
        page: u32,
    },
    /// Address is outside the writable region
    ProtectedAddress {
        /// Offending address
        address: u32,
    },
    /// Half-word programming needs an even address
    Unaligned {
        /// Offending address
        address: u32,
    },

    // Driver and store errors
    /// The flash driver reported a failure
    Driver(DriverError),
    /// The record store reported a failure
    Store(StoreError),

    // Verification failures
    /// The driver reported success but the value read back differs
    Verify {
        /// Programmed address
        address: u32,
        /// Value that was programmed
        expected: u16,
        /// Value read back
        found: u16,
    },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArguments => write!(f, "missing arguments"),
            Self::TooManyArguments => write!(f, "too many arguments"),
            Self::InvalidMode => write!(f, "invalid mode"),
            Self::UnknownSubcommand => write!(f, "unknown subcommand"),
            Self::InvalidNumber { arg, error } => write!(f, "cannot parse {}: {}", arg, error),
            Self::OutOfRange { arg } => write!(f, "{} out of range", arg),
            Self::ProtectedPage { page } => write!(f, "page {} is protected", page),
            Self::ProtectedAddress { address } => {
                write!(f, "address 0x{:08X} is protected", address)
            }
            Self::Unaligned { address } => {
                write!(f, "address 0x{:08X} is not half-word aligned", address)
            }
            Self::Driver(e) => write!(f, "{}", e),
            Self::Store(e) => write!(f, "{}", e),
            Self::Verify {
                address,
                expected,
                found,
            } => write!(
                f,
                "verify failed at 0x{:08X}: wrote 0x{:04X}, read 0x{:04X}",
                address, expected, found
            ),
        }
    }
}

/// Failure of a single command
///
/// The code is negative and specific to the handler that produced it; the
/// reason carries the description printed next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandError {
    code: i8,
    reason: Reason,
}

impl CommandError {
    /// Create a command error with a handler specific code
    pub const fn new(code: i8, reason: Reason) -> Self {
        Self { code, reason }
    }

    /// Handler specific (negative) return code
    pub fn code(&self) -> i8 {
        self.code
    }

    /// Why the command failed
    pub fn reason(&self) -> Reason {
        self.reason
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}: {}", self.code, self.reason)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

#[cfg(feature = "std")]
impl std::error::Error for StoreError {}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}
