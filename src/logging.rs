//! Log output setup for hosts and test harnesses.
//!
//! The library itself only emits `tracing` events: cycle skips, sequence
//! promotion and lenient argument skips at debug, parent fall-through at
//! trace. This module wires those events to stdout, stderr or a file.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{Dispatch, Level};
use tracing_subscriber::FmtSubscriber;

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// No logging (`0` or `off`)
    Off,
    /// Standard output (`1` or `stdout`)
    Stdout,
    /// Standard error (`2` or `stderr`)
    Stderr,
    /// Append to a file (any other value)
    File(PathBuf),
}

impl FromStr for LogTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            filename => LogTarget::File(PathBuf::from(filename)),
        })
    }
}

/// Build a dispatcher writing events at `level` and above to `target`.
///
/// Returns `None` for [`LogTarget::Off`].
pub fn build_dispatch(level: Level, target: &LogTarget) -> Result<Option<Dispatch>> {
    let dispatch = match target {
        LogTarget::Off => return Ok(None),
        LogTarget::Stdout => Dispatch::new(
            FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish(),
        ),
        LogTarget::Stderr => Dispatch::new(
            FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish(),
        ),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Dispatch::new(
                FmtSubscriber::builder()
                    .with_max_level(level)
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .finish(),
            )
        }
    };
    Ok(Some(dispatch))
}

/// Install the global subscriber for `target`.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(level: Level, target: &LogTarget) -> Result<()> {
    if let Some(dispatch) = build_dispatch(level, target)? {
        tracing::dispatcher::set_global_default(dispatch)?;
    }
    Ok(())
}
