//! Register access to a single I2C peripheral.
//!
//! An [`I2cDevice`] owns one open handle on one bus, bound to one 7-bit
//! peripheral address. Every transfer re-selects the address first, since the
//! selection lives on the handle rather than on each transfer.
//!
//! There are two ways to use it:
//!
//! - [`I2cDevice::open`], [`write_register`] and [`read_register`] return
//!   errors to the caller.
//! - [`I2cDevice::new`], [`write8`] and [`read8`] never fail. A device whose
//!   bus couldn't be opened is reported once and then behaves as an inert
//!   stub: writes do nothing and reads return [`READ_FAILED`]. Callers check
//!   [`is_valid`] to tell "no device" from a real value.
//!
//! Both report every failure through `tracing` at the point it happens.
//!
//! [`write_register`]: I2cDevice::write_register
//! [`read_register`]: I2cDevice::read_register
//! [`write8`]: I2cDevice::write8
//! [`read8`]: I2cDevice::read8
//! [`is_valid`]: I2cDevice::is_valid

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hw_trait::{I2cBus, I2cHandle, LinuxI2cBus};
use crate::lock::bus_lock;
use crate::tracing::prelude::*;

/// Only the low 7 bits of an address reach the bus.
pub const ADDRESS_MASK: u8 = 0x7F;

/// Returned by [`I2cDevice::read8`] when no byte was read.
pub const READ_FAILED: i16 = -1;

/// A peripheral at a fixed address on one bus.
pub struct I2cDevice<B: I2cBus = LinuxI2cBus> {
    bus: B,
    bus_number: u8,
    address: u8,
    handle: Option<B::Handle>,
    lock: Arc<Mutex<()>>,
}

impl I2cDevice<LinuxI2cBus> {
    /// Open `address` on the bus chosen by [`Config::from_env`].
    ///
    /// Never fails; check [`is_valid`](Self::is_valid).
    pub fn new(address: u8) -> Self {
        Self::from_config(&Config::from_env(), address)
    }

    /// Open `address` on the bus chosen by `config`. Never fails.
    pub fn from_config(config: &Config, address: u8) -> Self {
        Self::with_bus(LinuxI2cBus::new(&config.dev_dir), config.bus_number(), address)
    }

    /// Open `address` on the bus chosen by [`Config::from_env`], returning
    /// the error if the bus can't be opened.
    pub fn open(address: u8) -> Result<Self> {
        let config = Config::from_env();
        Self::open_with(LinuxI2cBus::new(&config.dev_dir), config.bus_number(), address)
    }
}

impl<B: I2cBus> I2cDevice<B> {
    fn closed(bus: B, bus_number: u8, address: u8) -> Self {
        Self {
            bus,
            bus_number,
            address,
            handle: None,
            lock: bus_lock(bus_number),
        }
    }

    /// Open `address` on `bus_number` of `bus`. An open failure is reported
    /// and leaves the device invalid.
    pub fn with_bus(bus: B, bus_number: u8, address: u8) -> Self {
        let mut device = Self::closed(bus, bus_number, address);
        // Failure already reported; the device stays invalid.
        let _ = device.reopen();
        device
    }

    /// Open `address` on `bus_number` of `bus`, returning open failures.
    pub fn open_with(bus: B, bus_number: u8, address: u8) -> Result<Self> {
        let mut device = Self::closed(bus, bus_number, address);
        device.reopen()?;
        Ok(device)
    }

    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }

    /// The address as given at construction, before masking.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Whether the handle is open.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Close any open handle, then open the bus again.
    pub fn reopen(&mut self) -> Result<()> {
        // Close failures are reported and don't stop the reopen.
        let _ = self.close();

        match self.bus.open(self.bus_number) {
            Ok(handle) => {
                debug!(
                    "Opened I2C bus {} for device 0x{:02x}",
                    self.bus_number,
                    self.address & ADDRESS_MASK
                );
                self.handle = Some(handle);
                Ok(())
            }
            Err(source) => Err(report(Error::Open {
                bus: self.bus_number,
                source,
            })),
        }
    }

    /// Release the handle, if open.
    ///
    /// The device is invalid afterwards even if the close itself failed, so
    /// the handle is never released twice.
    pub fn close(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle.close().map_err(|e| report(Error::Close(e))),
            None => Ok(()),
        }
    }

    /// Write `data` to `register`.
    ///
    /// Sends the two bytes `[register, data]` to the selected peer in one
    /// transfer.
    pub fn write_register(&mut self, register: u8, data: u8) -> Result<()> {
        let handle = self.handle.as_mut().ok_or(Error::NotOpen)?;
        let _guard = self.lock.lock();

        let selected = select(handle, self.address);
        write_all(handle, &[register, data])?;
        selected
    }

    /// Read one byte from `register`.
    ///
    /// Writes the register pointer, then reads the byte, under one selection
    /// and one hold of the bus lock.
    pub fn read_register(&mut self, register: u8) -> Result<u8> {
        let handle = self.handle.as_mut().ok_or(Error::NotOpen)?;
        let _guard = self.lock.lock();

        let selected = select(handle, self.address);
        write_all(handle, &[register])?;
        let mut data = [0u8; 1];
        read_exact(handle, &mut data)?;
        selected.map(|()| data[0])
    }

    /// Write `data` to `register`, ignoring failures.
    ///
    /// Does nothing when the device is invalid.
    pub fn write8(&mut self, register: u8, data: u8) {
        // Failures are reported where they happen.
        let _ = self.write_register(register, data);
    }

    /// Read `register`, or [`READ_FAILED`] if the device is invalid or the
    /// transfer failed.
    pub fn read8(&mut self, register: u8) -> i16 {
        self.read_register(register)
            .map(i16::from)
            .unwrap_or(READ_FAILED)
    }
}

impl<B: I2cBus> Drop for I2cDevice<B> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn report(e: Error) -> Error {
    error!("{}", e);
    e
}

// A failed selection is reported but the caller still attempts its transfer.
fn select<H: I2cHandle>(handle: &mut H, address: u8) -> Result<()> {
    let address = address & ADDRESS_MASK;
    trace!("Selecting device 0x{:02x}", address);
    handle
        .set_slave_address(address)
        .map_err(|source| report(Error::Select { address, source }))
}

fn write_all<H: I2cHandle>(handle: &mut H, data: &[u8]) -> Result<()> {
    let written = handle.write(data).map_err(|e| report(Error::Write(e)))?;
    if written != data.len() {
        return Err(report(Error::ShortTransfer {
            expected: data.len(),
            actual: written,
        }));
    }
    Ok(())
}

fn read_exact<H: I2cHandle>(handle: &mut H, buffer: &mut [u8]) -> Result<()> {
    let read = handle.read(buffer).map_err(|e| report(Error::Read(e)))?;
    if read != buffer.len() {
        return Err(report(Error::ShortTransfer {
            expected: buffer.len(),
            actual: read,
        }));
    }
    Ok(())
}
