/// Diagnostic logging for the wind forecast merge.
///
/// Everything goes through the `log` facade. `init_logger` installs an
/// `env_logger` backend on stderr with a bare `[LEVEL] message` layout, so
/// a per-source failure reads `[WARN] <source name>: <error>`. The filter
/// defaults to `warn`, which keeps per-source failures as the only output
/// of a normal run, and can be overridden with `RUST_LOG`.

use std::fmt;
use std::io::Write;

use log::Level;

use crate::model::SourceError;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

// ---------------------------------------------------------------------------
// Logger setup
// ---------------------------------------------------------------------------

/// Installs the global logger. Calling it more than once is harmless; later
/// calls are ignored.
pub fn init_logger(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .format(|buf, record| writeln!(buf, "{}", format_line(record.level(), record.args())))
        .try_init();
}

/// One log line, without the trailing newline.
pub fn format_line(level: Level, message: impl fmt::Display) -> String {
    format!("[{}] {}", level, message)
}

// ---------------------------------------------------------------------------
// Run logging
// ---------------------------------------------------------------------------

/// Logs a source that was skipped for this run.
pub fn log_source_failure(err: &SourceError) {
    log::warn!("{}", err);
}

/// Logs how many sources contributed to the run. Only a run in which no
/// source was usable is raised to a warning.
pub fn log_run_summary(total: usize, used: usize, entries: usize) {
    let skipped = total.saturating_sub(used);
    if used == 0 && total > 0 {
        log::warn!("No usable source data, writing empty fallback ({} sources skipped)", skipped);
    } else {
        log::info!(
            "Merge complete: {}/{} sources used, {} skipped, {} hourly entries",
            used, total, skipped, entries
        );
    }
}
