//! Structured logging init (§10.2), matching the teacher's dependency
//! choices exactly: `tracing` + `tracing-subscriber` (`EnvFilter`, `fmt` with
//! `time`/`chrono`), with an optional non-blocking file layer via
//! `tracing-appender` when `--log-file` is set.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Held for the process lifetime so the non-blocking file writer (if any)
/// flushes correctly on drop.
pub struct LogGuards {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize the global `tracing` subscriber: stderr always, plus an
/// optional file layer when `log_file` is `Some`. Returns a guard that must
/// be held for the process lifetime.
pub fn init_logging(log_file: Option<&Path>) -> LogGuards {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    let (file_layer, file_guard) = match log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().map_or_else(|| "brandmark.log".to_string(), |name| name.to_string_lossy().to_string());
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).init();

    LogGuards { _file_guard: file_guard }
}
