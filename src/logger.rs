// ========================= Logging =========================
//
// Console logging for the `paperfile` binary.

use std::io::Write;

use log::{Level, LevelFilter};

use crate::error::{PaperError, Result};

/// Environment variable consulted when no level is passed explicitly
pub const LOG_ENV: &str = "PAPERFILE_LOG";

pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Installs an `env_logger` that prints stage lines bare and tags everything
/// else with its level.
pub fn init_with_level(level: &str) -> Result<()> {
    env_logger::Builder::new()
        .filter_level(parse_level(level))
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            Level::Warn => writeln!(buf, "⚠ {}", record.args()),
            Level::Error => writeln!(buf, "✘ {}", record.args()),
            lvl => writeln!(buf, "[{} {}] {}", lvl, record.target(), record.args()),
        })
        .try_init()
        .map_err(|e| PaperError::Config(format!("logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_loosely() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level(" warn "), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
    }
}
