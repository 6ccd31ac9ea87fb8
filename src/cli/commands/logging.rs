//! `-v` / `GATEHOUSE_LOG_LEVEL`: how much the server logs.
//!
//! The flag is counted (`-vvv`); the environment variable takes either the
//! count or a level name. Both end up as the same `u8`.

use clap::{builder::ValueParser, Arg, ArgAction, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";
const ENV_LOG_LEVEL: &str = "GATEHOUSE_LOG_LEVEL";

/// Indexed by verbosity count. Counts past the end stay at TRACE.
const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];
const MAX_COUNT: u8 = 5;

fn parse_level(raw: &str) -> Result<u8, String> {
    let raw = raw.trim();
    if let Ok(count) = raw.parse::<u8>() {
        return if count <= MAX_COUNT {
            Ok(count)
        } else {
            Err(format!("verbosity must be between 0 and {MAX_COUNT}"))
        };
    }
    LEVELS
        .iter()
        .position(|level| level.to_string().eq_ignore_ascii_case(raw))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!("unknown log level '{raw}', expected error, warn, info, debug or trace")
        })
}

/// Tracing level for a verbosity count; `None` keeps the subscriber default.
#[must_use]
pub fn level(verbosity: u8) -> Option<Level> {
    (verbosity > 0).then(|| {
        LEVELS
            .get(usize::from(verbosity))
            .copied()
            .unwrap_or(Level::TRACE)
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log more: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
            .env(ENV_LOG_LEVEL)
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_level)),
    )
}
