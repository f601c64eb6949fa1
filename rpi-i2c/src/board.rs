//! Board identification.
//!
//! Which bus the header pins are wired to depends on the board revision:
//! the earliest Model B boards route them to bus 0, everything since to
//! bus 1. The revision is read from the `Revision` line of `/proc/cpuinfo`.
//!
//! Devices never look at the identification file themselves; they ask a
//! [`BusResolver`] for a number.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::tracing::prelude::*;

/// Default host identification file.
pub const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Bus used when the revision can't be determined.
pub const FALLBACK_BUS: u8 = 1;

/// Revisions whose header is wired to bus 0.
const BUS0_REVISIONS: [&str; 3] = ["0000", "0002", "0003"];

/// Supplies the number of the bus a device should open.
pub trait BusResolver {
    fn resolve_bus_number(&self) -> u8;
}

/// Always resolves to the same bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBus(pub u8);

impl BusResolver for FixedBus {
    fn resolve_bus_number(&self) -> u8 {
        self.0
    }
}

/// Resolves the bus from the revision in a cpuinfo-style file.
#[derive(Debug, Clone)]
pub struct CpuInfo {
    path: PathBuf,
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self::new(CPUINFO_PATH)
    }
}

impl CpuInfo {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    /// Revision and model from one read of the file. Both are `None` if the
    /// file can't be read.
    pub fn board_info(&self) -> BoardInfo {
        match self.read() {
            Ok(text) => BoardInfo::parse(&text),
            Err(e) => {
                error!("Failed to open {}: {}", self.path.display(), e);
                BoardInfo::default()
            }
        }
    }
}

impl BusResolver for CpuInfo {
    fn resolve_bus_number(&self) -> u8 {
        let board = self.board_info();

        match (board.revision.as_deref(), board.bus_number()) {
            (Some(revision), Some(bus)) => {
                info!("Raspberry Pi revision {}, using I2C bus {}.", revision, bus);
                bus
            }
            _ => {
                warn!(
                    "Couldn't find Raspberry Pi revision number, assuming I2C bus {}.",
                    FALLBACK_BUS
                );
                FALLBACK_BUS
            }
        }
    }
}

/// What the identification file says about the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardInfo {
    pub revision: Option<String>,
    pub model: Option<BoardModel>,
}

impl BoardInfo {
    pub fn parse(text: &str) -> Self {
        Self {
            revision: parse_revision(text),
            model: BoardModel::detect(text),
        }
    }

    /// Bus the header is wired to, if the revision is known.
    pub fn bus_number(&self) -> Option<u8> {
        self.revision.as_deref().and_then(revision_to_bus)
    }
}

fn field_regex(field: &str) -> Regex {
    Regex::new(&format!(r"(?i)^{}\s*:\s*(\w+)\s*$", field)).expect("field pattern is valid")
}

fn first_field(text: &str, pattern: &Regex) -> Option<String> {
    text.lines()
        .find_map(|line| pattern.captures(line))
        .map(|caps| caps[1].to_string())
}

/// Value of the first `Revision : <value>` line in `text`.
pub fn parse_revision(text: &str) -> Option<String> {
    static REVISION: OnceLock<Regex> = OnceLock::new();
    first_field(text, REVISION.get_or_init(|| field_regex("Revision")))
}

/// Bus number for a board revision; `None` for an empty revision.
pub fn revision_to_bus(revision: &str) -> Option<u8> {
    if revision.is_empty() {
        None
    } else if BUS0_REVISIONS.contains(&revision) {
        Some(0)
    } else {
        Some(1)
    }
}

/// Raspberry Pi generation, as reported by the SoC name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardModel {
    /// BCM2708
    Pi1,
    /// BCM2709
    Pi2,
    /// BCM2835; also reported by every model on a 4.9+ kernel
    Pi3,
}

impl BoardModel {
    /// Model from the first `Hardware : <soc>` line in `text`.
    pub fn detect(text: &str) -> Option<Self> {
        static HARDWARE: OnceLock<Regex> = OnceLock::new();
        let soc = first_field(text, HARDWARE.get_or_init(|| field_regex("Hardware")))?;

        match soc.to_ascii_uppercase().as_str() {
            "BCM2708" => Some(Self::Pi1),
            "BCM2709" => Some(Self::Pi2),
            "BCM2835" => Some(Self::Pi3),
            _ => {
                debug!("Unrecognised SoC {}", soc);
                None
            }
        }
    }
}

impl fmt::Display for BoardModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pi1 => write!(f, "Raspberry Pi 1"),
            Self::Pi2 => write!(f, "Raspberry Pi 2"),
            Self::Pi3 => write!(f, "Raspberry Pi 3 (or newer kernel)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const PI3_CPUINFO: &str = "\
processor\t: 0
model name\t: ARMv7 Processor rev 4 (v7l)
BogoMIPS\t: 38.40

Hardware\t: BCM2835
Revision\t: a02082
Serial\t\t: 00000000deadbeef
";

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("rpi-i2c-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test_case("0000", 0 ; "revision 0000")]
    #[test_case("0002", 0 ; "revision 0002")]
    #[test_case("0003", 0 ; "revision 0003")]
    #[test_case("0004", 1 ; "revision 0004")]
    #[test_case("000d", 1 ; "revision 000d")]
    #[test_case("a02082", 1 ; "pi 3 revision")]
    fn test_revision_to_bus(revision: &str, bus: u8) {
        assert_eq!(revision_to_bus(revision), Some(bus));
    }

    #[test]
    fn test_empty_revision_has_no_bus() {
        assert_eq!(revision_to_bus(""), None);
    }

    #[test_case("Revision : 0002", Some("0002") ; "spaced")]
    #[test_case("Revision\t: a02082", Some("a02082") ; "tabbed")]
    #[test_case("revision:000d", Some("000d") ; "lowercase no spaces")]
    #[test_case("REVISION   :   0003   ", Some("0003") ; "trailing whitespace")]
    #[test_case("Hardware : BCM2835", None ; "other field")]
    #[test_case("Revision :", None ; "missing value")]
    fn test_parse_revision(text: &str, expected: Option<&str>) {
        assert_eq!(parse_revision(text).as_deref(), expected);
    }

    #[test]
    fn test_parse_revision_takes_first_match() {
        let text = "Revision : 0002\nRevision : a02082\n";
        assert_eq!(parse_revision(text).as_deref(), Some("0002"));
    }

    #[test]
    fn test_resolver_reads_file() {
        let path = write_temp("revision-0002", "Hardware : BCM2708\nRevision : 0002\n");
        assert_eq!(CpuInfo::new(&path).resolve_bus_number(), 0);

        let path = write_temp("revision-000d", "Revision : 000d\n");
        assert_eq!(CpuInfo::new(&path).resolve_bus_number(), 1);
    }

    #[test]
    fn test_resolver_fallback_on_missing_file() {
        let resolver = CpuInfo::new("/nonexistent/rpi-i2c/cpuinfo");
        assert_eq!(resolver.board_info(), BoardInfo::default());
        assert_eq!(resolver.resolve_bus_number(), FALLBACK_BUS);
    }

    #[test]
    fn test_resolver_fallback_without_revision_line() {
        let path = write_temp("no-revision", "processor : 0\n");
        assert_eq!(CpuInfo::new(&path).resolve_bus_number(), FALLBACK_BUS);
    }

    #[test]
    fn test_fixed_bus() {
        assert_eq!(FixedBus(7).resolve_bus_number(), 7);
    }

    #[test_case("Hardware : BCM2708", Some(BoardModel::Pi1) ; "pi 1")]
    #[test_case("Hardware : BCM2709", Some(BoardModel::Pi2) ; "pi 2")]
    #[test_case("hardware\t: bcm2835", Some(BoardModel::Pi3) ; "pi 3 lowercase")]
    #[test_case("Hardware : BCM2711", None ; "unknown soc")]
    #[test_case("Revision : 0002", None ; "no hardware line")]
    fn test_board_model_detect(text: &str, expected: Option<BoardModel>) {
        assert_eq!(BoardModel::detect(text), expected);
    }

    #[test]
    fn test_full_cpuinfo() {
        assert_eq!(parse_revision(PI3_CPUINFO).as_deref(), Some("a02082"));
        assert_eq!(BoardModel::detect(PI3_CPUINFO), Some(BoardModel::Pi3));

        let path = write_temp("pi3", PI3_CPUINFO);
        let resolver = CpuInfo::new(&path);
        assert_eq!(resolver.resolve_bus_number(), 1);
        assert_eq!(
            resolver.board_info(),
            BoardInfo {
                revision: Some("a02082".to_string()),
                model: Some(BoardModel::Pi3),
            }
        );
    }

    #[test]
    fn test_board_info_bus_number() {
        let early = BoardInfo::parse("Hardware : BCM2708\nRevision : 0003\n");
        assert_eq!(early.model, Some(BoardModel::Pi1));
        assert_eq!(early.bus_number(), Some(0));

        let unknown = BoardInfo::parse("processor : 0\n");
        assert_eq!(unknown, BoardInfo::default());
        assert_eq!(unknown.bus_number(), None);
    }
}
