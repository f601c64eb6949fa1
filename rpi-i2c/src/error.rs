//! Common error types for rpi-i2c.
//!
//! This module provides a centralized Error enum using thiserror. Variants
//! carrying an `Errno` hold the error captured by the failing system call
//! itself, never a value read back from shared state afterwards.

use nix::errno::Errno;
use thiserror::Error;

/// Main error type for rpi-i2c operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The bus device node could not be opened
    #[error("Couldn't open I2C bus {bus}: {source}")]
    Open {
        bus: u8,
        #[source]
        source: Errno,
    },

    /// The peripheral address could not be bound to the handle
    #[error("Couldn't select device 0x{address:02x}: {source}")]
    Select {
        address: u8,
        #[source]
        source: Errno,
    },

    /// Raw write failed
    #[error("Failed to write to device: {0}")]
    Write(Errno),

    /// Raw read failed
    #[error("Failed to read from device: {0}")]
    Read(Errno),

    /// Transfer completed with an unexpected byte count
    #[error("Short transfer: expected {expected} bytes, moved {actual}")]
    ShortTransfer { expected: usize, actual: usize },

    /// Releasing the handle failed
    #[error("Failed to close device: {0}")]
    Close(Errno),

    /// Operation on a device without an open handle
    #[error("Device is not open")]
    NotOpen,

    /// I/O errors reading host identification data
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
