//! Register access to I2C peripherals on a Raspberry Pi.
//!
//! ```no_run
//! use rpi_i2c::I2cDevice;
//!
//! let mut sensor = I2cDevice::new(0x48);
//! if sensor.is_valid() {
//!     sensor.write8(0x01, 0x60);
//!     let config = sensor.read8(0x01);
//!     println!("config register: {}", config);
//! }
//! ```

pub mod board;
pub mod config;
pub mod device;
pub mod error;
pub mod hw_trait;
pub mod lock;
pub mod tracing;

pub use board::{BoardInfo, BoardModel, BusResolver, CpuInfo, FixedBus};
pub use config::Config;
pub use device::{I2cDevice, READ_FAILED};
pub use error::{Error, Result};
