//! Error types for rprobe-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A register or bulk-memory access over the debug transport failed.
    ///
    /// The in-progress controller sequence was aborted and the flash
    /// controller may be left in command mode; the session should be
    /// considered dead rather than retried.
    Transport,

    /// Requested erase/write range is misaligned or extends beyond the
    /// flash region that contains its start address
    InvalidRange {
        /// Start address of the rejected request
        addr: u32,
        /// Length of the rejected request
        len: u32,
    },

    /// No installed flash region covers the given address
    NoFlashRegion {
        /// Address that no region contains
        addr: u32,
    },

    /// Monitor command name did not match any installed command
    UnknownCommand,

    /// Writing to the monitor command output sink failed
    Format,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "debug transport access failed"),
            Self::InvalidRange { addr, len } => {
                write!(f, "invalid flash range 0x{:08X}+0x{:X}", addr, len)
            }
            Self::NoFlashRegion { addr } => {
                write!(f, "no flash region at address 0x{:08X}", addr)
            }
            Self::UnknownCommand => write!(f, "unknown monitor command"),
            Self::Format => write!(f, "command output sink error"),
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Format
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
