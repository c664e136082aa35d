//! Timestamped event logging.
//!
//! All components log through the `log` facade; this module installs the
//! sink. Events are printed to standard output as
//! `[MM-DD-YYYY HH:MM:SS] [LEVEL] message`. INFO events are suppressed
//! unless verbose or internal mode is on; INTERNAL events are suppressed
//! unless internal mode is on; WARNING, ERROR, and DRY_RUN always print.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::OnceLock;

/// Log target for dry-run simulation events.
pub const DRY_RUN: &str = "dry_run";
/// Log target for internal diagnostic events.
pub const INTERNAL: &str = "internal";

struct ShredLogger {
    verbose: bool,
    internal: bool,
}

impl ShredLogger {
    fn label(record: &Record) -> &'static str {
        match record.target() {
            DRY_RUN => "DRY_RUN",
            INTERNAL => "INTERNAL",
            _ => match record.level() {
                Level::Error => "ERROR",
                Level::Warn => "WARNING",
                _ => "INFO",
            },
        }
    }
}

impl Log for ShredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match metadata.target() {
            DRY_RUN => true,
            INTERNAL => self.internal,
            _ => match metadata.level() {
                Level::Error | Level::Warn => true,
                _ => self.verbose || self.internal,
            },
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        println!(
            "[{}] [{}] {}",
            Local::now().format("%m-%d-%Y %H:%M:%S"),
            Self::label(record),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<ShredLogger> = OnceLock::new();

/// Install the logger. Later calls are no-ops; the first caller's verbosity
/// settings win for the lifetime of the process.
pub fn init(verbose: bool, internal: bool) {
    let logger = LOGGER.get_or_init(|| ShredLogger { verbose, internal });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_requires_verbosity() {
        let quiet = ShredLogger {
            verbose: false,
            internal: false,
        };
        let meta = Metadata::builder().level(Level::Info).build();
        assert!(!quiet.enabled(&meta));

        let verbose = ShredLogger {
            verbose: true,
            internal: false,
        };
        assert!(verbose.enabled(&meta));
    }

    #[test]
    fn warnings_and_errors_always_print() {
        let quiet = ShredLogger {
            verbose: false,
            internal: false,
        };
        for level in [Level::Warn, Level::Error] {
            let meta = Metadata::builder().level(level).build();
            assert!(quiet.enabled(&meta));
        }
    }

    #[test]
    fn internal_target_is_gated() {
        let quiet = ShredLogger {
            verbose: true,
            internal: false,
        };
        let meta = Metadata::builder()
            .level(Level::Info)
            .target(INTERNAL)
            .build();
        assert!(!quiet.enabled(&meta));

        let internal = ShredLogger {
            verbose: false,
            internal: true,
        };
        assert!(internal.enabled(&meta));
    }

    #[test]
    fn dry_run_target_always_prints() {
        let quiet = ShredLogger {
            verbose: false,
            internal: false,
        };
        let meta = Metadata::builder()
            .level(Level::Info)
            .target(DRY_RUN)
            .build();
        assert!(quiet.enabled(&meta));
    }
}
