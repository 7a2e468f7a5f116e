use cap_std::fs_utf8::Dir;
use miette::{Context, IntoDiagnostic, Result};

pub const LOG_ENV: &str = "JOKOPING_LOG";
pub const LOG_FILE_NAME: &str = "jokoping.log";
const DEFAULT_FILTER: &str = "info";

/// Logs go to `jokoping.log` inside the data dir. The filter is read from `JOKOPING_LOG` (eg: `debug,joko_ping=trace`).
/// Keep the returned guard alive until exit, or the last log lines may be lost.
pub fn install_tracing(jokoping_dir: &Dir) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};
    // get the log level
    let filter_layer = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .into_diagnostic()
        .wrap_err("failed to create log filter")?;
    // create log file in the data dir. This will also serve as a check that the directory is "writeable" by us
    let writer = std::io::BufWriter::new(
        jokoping_dir
            .create(LOG_FILE_NAME)
            .into_diagnostic()
            .wrap_err("failed to create jokoping.log file")?,
    );
    let (nb, guard) = tracing_appender::non_blocking(writer);
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(nb);
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("failed to install global tracing subscriber")?;
    Ok(guard)
}

/// Panics are logged before the default hook prints them, so that they end up in the log file too.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|msg| msg.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Something went wrong".to_string());
        tracing::error!(%location, "crashing: {message}");
        default_hook(info);
    }));
}
