//! Configuration for rpi-i2c.
//!
//! Parses environment variables to override how devices find their bus.
//! Nothing here is required: with no variables set, the bus number comes from
//! the host's board revision and device nodes live under `/dev`.

use std::path::PathBuf;

use crate::board::{BusResolver, CpuInfo, FixedBus, CPUINFO_PATH};
use crate::hw_trait::DEV_DIR;

/// Configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bus number to use instead of detecting one from the board revision.
    pub bus: Option<u8>,

    /// Host identification file scanned for the board revision.
    pub cpuinfo_path: PathBuf,

    /// Directory holding the `i2c-N` device nodes.
    pub dev_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: None,
            cpuinfo_path: PathBuf::from(CPUINFO_PATH),
            dev_dir: PathBuf::from(DEV_DIR),
        }
    }
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RPI_I2C_BUS`: bus number override (ignored unless it parses as u8)
    /// - `RPI_I2C_CPUINFO`: identification file (default: `/proc/cpuinfo`)
    /// - `RPI_I2C_DEV_DIR`: device node directory (default: `/dev`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bus = std::env::var("RPI_I2C_BUS")
            .ok()
            .and_then(|s| s.trim().parse().ok());

        let cpuinfo_path = std::env::var_os("RPI_I2C_CPUINFO")
            .map(PathBuf::from)
            .unwrap_or(defaults.cpuinfo_path);

        let dev_dir = std::env::var_os("RPI_I2C_DEV_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.dev_dir);

        Self {
            bus,
            cpuinfo_path,
            dev_dir,
        }
    }

    /// Resolver honoring the bus override, if any.
    pub fn resolver(&self) -> Box<dyn BusResolver> {
        match self.bus {
            Some(bus) => Box::new(FixedBus(bus)),
            None => Box::new(CpuInfo::new(&self.cpuinfo_path)),
        }
    }

    /// Bus number devices should open.
    pub fn bus_number(&self) -> u8 {
        self.resolver().resolve_bus_number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("RPI_I2C_BUS");
        std::env::remove_var("RPI_I2C_CPUINFO");
        std::env::remove_var("RPI_I2C_DEV_DIR");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();

        let config = Config::from_env();
        assert_eq!(config, Config::default());
        assert_eq!(config.cpuinfo_path, PathBuf::from("/proc/cpuinfo"));
        assert_eq!(config.dev_dir, PathBuf::from("/dev"));
    }

    #[test]
    #[serial]
    fn test_bus_override_bypasses_detection() {
        clear_env();
        std::env::set_var("RPI_I2C_BUS", "3");
        std::env::set_var("RPI_I2C_CPUINFO", "/nonexistent/cpuinfo");

        let config = Config::from_env();
        assert_eq!(config.bus, Some(3));
        assert_eq!(config.bus_number(), 3);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_bus_ignored() {
        clear_env();
        std::env::set_var("RPI_I2C_BUS", "i2c-1");

        let config = Config::from_env();
        assert_eq!(config.bus, None);

        std::env::set_var("RPI_I2C_BUS", "300");
        assert_eq!(Config::from_env().bus, None);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_paths_from_env() {
        clear_env();
        std::env::set_var("RPI_I2C_CPUINFO", "/tmp/cpuinfo");
        std::env::set_var("RPI_I2C_DEV_DIR", "/tmp/dev");

        let config = Config::from_env();
        assert_eq!(config.cpuinfo_path, PathBuf::from("/tmp/cpuinfo"));
        assert_eq!(config.dev_dir, PathBuf::from("/tmp/dev"));

        clear_env();
    }
}
