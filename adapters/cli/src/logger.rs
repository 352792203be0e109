//! Minimal stderr sink for the `log` facade.

use anyhow::Context as _;
use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the stderr logger at the given verbosity.
pub(crate) fn init(level: LevelFilter) -> anyhow::Result<()> {
    log::set_logger(&LOGGER).context("a logger is already installed")?;
    log::set_max_level(level);
    Ok(())
}
