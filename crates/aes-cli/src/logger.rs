//! Minimal stderr backend for the `log` facade.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

struct StderrLogger {
    // Serializes lines so concurrent records do not interleave.
    lock: Mutex<()>,
}

static LOGGER: StderrLogger = StderrLogger {
    lock: Mutex::new(()),
};

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let millis = ts.as_secs() * 1000 + u64::from(ts.subsec_millis());
        let _ = writeln!(
            io::stderr(),
            "[{}] [{}] {}: {}",
            millis,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Installs the logger. `verbosity` counts `-v` flags on top of warnings.
pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level_for(verbosity));
    Ok(())
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn init_error_converts_to_anyhow() {
        fn context_on(result: Result<(), SetLoggerError>) -> anyhow::Result<()> {
            anyhow::Context::context(result, "install logger")
        }
        assert!(context_on(Ok(())).is_ok());
    }
}
