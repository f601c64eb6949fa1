//! Linux i2c-dev implementation.
//!
//! Each bus is a character device node, `/dev/i2c-N`. The active peer address
//! is a property of the open file, set with the `I2C_SLAVE` ioctl; plain
//! `read(2)` and `write(2)` then move raw bytes to and from that peer.
//!
//! See <https://www.kernel.org/doc/Documentation/i2c/dev-interface>.

use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd};
use std::path::{Path, PathBuf};

use nix::fcntl::{self, OFlag};
use nix::libc::c_int;
use nix::sys::stat::Mode;
use nix::unistd;

use super::{node_name, I2cBus, I2cHandle, DEV_DIR};
use crate::tracing::prelude::*;

mod ioctl {
    /// `I2C_SLAVE` from linux/i2c-dev.h
    const I2C_SLAVE: u16 = 0x0703;

    nix::ioctl_write_int_bad!(set_slave, I2C_SLAVE);
}

/// Opens `i2c-N` nodes under a device directory.
#[derive(Debug, Clone)]
pub struct LinuxI2cBus {
    dev_dir: PathBuf,
}

impl Default for LinuxI2cBus {
    fn default() -> Self {
        Self::new(DEV_DIR)
    }
}

impl LinuxI2cBus {
    pub fn new(dev_dir: impl AsRef<Path>) -> Self {
        Self {
            dev_dir: dev_dir.as_ref().to_path_buf(),
        }
    }

    /// Node path for `bus_number` under this bus's device directory.
    pub fn path_for(&self, bus_number: u8) -> PathBuf {
        self.dev_dir.join(node_name(bus_number))
    }
}

impl I2cBus for LinuxI2cBus {
    type Handle = LinuxI2cHandle;

    fn open(&self, bus_number: u8) -> nix::Result<LinuxI2cHandle> {
        let path = self.path_for(bus_number);
        trace!("Opening {}", path.display());

        let fd = fcntl::open(&path, OFlag::O_RDWR | OFlag::O_CLOEXEC, Mode::empty())?;

        // SAFETY: open(2) just returned this descriptor and nothing else owns it.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(LinuxI2cHandle { fd })
    }
}

/// An open i2c-dev node.
#[derive(Debug)]
pub struct LinuxI2cHandle {
    fd: OwnedFd,
}

impl I2cHandle for LinuxI2cHandle {
    fn set_slave_address(&mut self, address: u8) -> nix::Result<()> {
        // SAFETY: I2C_SLAVE takes the address by value and reads no memory.
        unsafe { ioctl::set_slave(self.fd.as_raw_fd(), c_int::from(address)) }?;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> nix::Result<usize> {
        unistd::write(&self.fd, data)
    }

    fn read(&mut self, buffer: &mut [u8]) -> nix::Result<usize> {
        unistd::read(self.fd.as_raw_fd(), buffer)
    }

    fn close(self) -> nix::Result<()> {
        unistd::close(self.fd.into_raw_fd())
    }
}
