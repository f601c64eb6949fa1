//! Command-line interface for rpi-i2c.
//!
//! Reads and writes single registers from a shell, and shows which bus the
//! library would pick on this host.
//!
//! ```text
//! rpi-i2c info
//! rpi-i2c read <address> <register>
//! rpi-i2c write <address> <register> <value>
//! ```
//!
//! Numbers are decimal or `0x`-prefixed hex. Bus selection honors the same
//! `RPI_I2C_*` environment variables as the library.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use rpi_i2c::board::FALLBACK_BUS;
use rpi_i2c::hw_trait::LinuxI2cBus;
use rpi_i2c::tracing::{self, prelude::*};
use rpi_i2c::{Config, CpuInfo, I2cDevice};

/// Register access to I2C peripherals on a Raspberry Pi
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Show the bus, device node and board this host resolves to
    Info,

    /// Read one register and print its value
    Read {
        /// 7-bit peripheral address
        #[arg(value_parser = parse_u8)]
        address: u8,

        /// Register number
        #[arg(value_parser = parse_u8)]
        register: u8,
    },

    /// Write one value to a register
    Write {
        /// 7-bit peripheral address
        #[arg(value_parser = parse_u8)]
        address: u8,

        /// Register number
        #[arg(value_parser = parse_u8)]
        register: u8,

        /// Byte to store
        #[arg(value_parser = parse_u8)]
        value: u8,
    },
}

/// Decimal or `0x`-prefixed hex byte.
fn parse_u8(arg: &str) -> Result<u8, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.map_err(|_| format!("'{}' is not a byte value", arg))
}

fn open(config: &Config, address: u8) -> Result<I2cDevice> {
    let bus = LinuxI2cBus::new(&config.dev_dir);
    Ok(I2cDevice::open_with(bus, config.bus_number(), address)?)
}

fn run(command: Command) -> Result<()> {
    let config = Config::from_env();

    match command {
        Command::Info => {
            let board = CpuInfo::new(&config.cpuinfo_path).board_info();
            let bus_number = config
                .bus
                .or(board.bus_number())
                .unwrap_or(FALLBACK_BUS);

            println!("bus:      {}", bus_number);
            println!(
                "device:   {}",
                LinuxI2cBus::new(&config.dev_dir).path_for(bus_number).display()
            );
            match board.revision {
                Some(revision) => println!("revision: {}", revision),
                None => println!("revision: unknown"),
            }
            match board.model {
                Some(model) => println!("model:    {}", model),
                None => println!("model:    unknown"),
            }
        }
        Command::Read { address, register } => {
            let value = open(&config, address)?.read_register(register)?;
            println!("0x{:02x}", value);
        }
        Command::Write {
            address,
            register,
            value,
        } => {
            open(&config, address)?.write_register(register, value)?;
            debug!("Wrote 0x{:02x} to register 0x{:02x}", value, register);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing::init_journald_or_stderr();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
