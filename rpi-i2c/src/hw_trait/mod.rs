//! Hardware abstraction layer traits.
//!
//! This module defines the raw bus interface that [`I2cDevice`] drives. An
//! [`I2cBus`] opens a handle for a bus number; an [`I2cHandle`] binds a peer
//! address and moves raw bytes. The Linux implementation talks to the
//! kernel's i2c-dev interface; tests substitute an in-memory bus.
//!
//! Every method returns the `Errno` of its own system call, so callers never
//! consult `errno` after the fact.
//!
//! [`I2cDevice`]: crate::device::I2cDevice

use std::path::PathBuf;

pub mod linux;

pub use linux::{LinuxI2cBus, LinuxI2cHandle};

/// Directory holding the `i2c-N` device nodes.
pub const DEV_DIR: &str = "/dev";

/// Device node path for bus `bus_number`: `/dev/i2c-N`.
pub fn device_path(bus_number: u8) -> PathBuf {
    LinuxI2cBus::default().path_for(bus_number)
}

pub(crate) fn node_name(bus_number: u8) -> String {
    format!("i2c-{}", bus_number)
}

/// One open handle on a bus.
pub trait I2cHandle {
    /// Make `address` the peer of subsequent raw transfers.
    fn set_slave_address(&mut self, address: u8) -> nix::Result<()>;

    /// Write `data` to the selected peer, returning the byte count moved.
    fn write(&mut self, data: &[u8]) -> nix::Result<usize>;

    /// Read into `buffer` from the selected peer, returning the byte count.
    fn read(&mut self, buffer: &mut [u8]) -> nix::Result<usize>;

    /// Release the handle.
    fn close(self) -> nix::Result<()>;
}

/// Opens handles on I2C buses.
pub trait I2cBus {
    type Handle: I2cHandle;

    fn open(&self, bus_number: u8) -> nix::Result<Self::Handle>;
}
