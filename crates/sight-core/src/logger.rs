//! Session logging.
//!
//! Guidance sessions are short and interactive, so log lines carry the time
//! elapsed since the logger was installed instead of wall-clock timestamps,
//! plus the emitting module: `  12.40s INFO  sight_track::state: anchor
//! committed at 0.573 m`. Install once at session startup with
//! [`init_with_level`].

use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

struct SessionLogger {
    level: LevelFilter,
    started: Instant,
}

impl SessionLogger {
    fn format_line(&self, record: &Record) -> String {
        format!(
            "{:>8.2}s {:<5} {}: {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", self.format_line(record));
        }
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

/// Install the session logger with the provided level filter.
///
/// The elapsed-time clock starts at the first call; later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| SessionLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// `tracing` alternative to the plain logger, honoring `RUST_LOG`.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::uptime())
        .compact()
        .finish()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn logger(level: LevelFilter) -> SessionLogger {
        SessionLogger {
            level,
            started: Instant::now(),
        }
    }

    #[test]
    fn lines_carry_level_target_and_message() {
        let line = logger(LevelFilter::Debug).format_line(
            &Record::builder()
                .args(format_args!("anchor committed at 0.573 m"))
                .level(Level::Info)
                .target("sight_track::state")
                .build(),
        );
        assert!(line.contains("INFO"));
        assert!(line.contains("sight_track::state"));
        assert!(line.ends_with("anchor committed at 0.573 m"));
        assert!(line.trim_start().starts_with(|c: char| c.is_ascii_digit()));
    }

    #[test]
    fn level_filter_gates_records() {
        let warn_only = logger(LevelFilter::Warn);
        let debug = Metadata::builder()
            .level(Level::Debug)
            .target("sight_core")
            .build();
        let error = Metadata::builder()
            .level(Level::Error)
            .target("sight_core")
            .build();
        assert!(!warn_only.enabled(&debug));
        assert!(warn_only.enabled(&error));
    }

    #[test]
    fn repeated_installation_is_a_no_op() {
        assert!(init_with_level(LevelFilter::Info).is_ok());
        assert!(init_with_level(LevelFilter::Trace).is_ok());
        // The first install wins.
        assert_eq!(log::max_level(), LevelFilter::Info);
    }
}
