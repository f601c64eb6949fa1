//! Provide tracing, tailored to this crate.
//!
//! Programs built on rpi-i2c should call one of the init_* functions at
//! startup to install a tracing subscriber (i.e., something that emits events
//! to a log). Without one, the library's error reports are silently dropped.
//!
//! What the library emits:
//!
//! - `error!`: failed opens, address selections, transfers and closes, each
//!   with the bus or address involved and the system error; an unreadable
//!   board identification file.
//! - `warn!`: the board revision couldn't be found and the fallback bus is
//!   used.
//! - `info!`: the board revision found and the bus it maps to.
//! - `debug!`: each successful open, and a SoC name that matches no known
//!   board.
//! - `trace!`: each device node opened and each address selection.
//!
//! The rest of the crate includes `use crate::tracing::prelude::*` for
//! convenient access to the `trace!()`, `debug!()`, `info!()`, `warn!()`, and
//! `error!()` macros.

use std::env;
use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Initialize logging.
///
/// If running under systemd, use journald; otherwise fall back to stderr, so
/// that command output on stdout stays clean.
pub fn init_journald_or_stderr() {
    if env::var("JOURNAL_STREAM").is_ok() {
        if let Ok(layer) = tracing_journald::layer() {
            tracing_subscriber::registry().with(layer).init();
        } else {
            use_stderr();
            error!("Failed to initialize journald logging, using stderr.");
        }
    } else {
        use_stderr();
    }
}

// Log to stderr, filtering according to environment variable RUST_LOG,
// overriding the default level (ERROR) to INFO.
fn use_stderr() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimer),
        )
        .init();
}

// Format timestamps in local time to the nearest second. The default timer
// was in UTC and formatted timestamps as a long, ugly string.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or(OffsetDateTime::now_utc());
        let stamp = now
            .format(time::macros::format_description!("[hour]:[minute]:[second]"))
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{}", stamp)
    }
}
