use std::path::PathBuf;
use std::sync::Once;

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

// Log targets, one per component
pub const CLASSIFY: &str = "classify";
pub const RECONCILE: &str = "reconcile";
pub const RGROUP: &str = "rgroup";
pub const PROJECTION: &str = "projection";
pub const REACTION_GEOMETRY: &str = "reaction_geometry";
pub const ASSEMBLE: &str = "assemble";
pub const LEXICON: &str = "lexicon";

const COMPONENT_TARGETS: &[&str] = &[
    CLASSIFY,
    RECONCILE,
    RGROUP,
    PROJECTION,
    REACTION_GEOMETRY,
    ASSEMBLE,
    LEXICON,
];

const LOG_FILE_NAME: &str = "molextract.log";

static INIT: Once = Once::new();

/// `RUST_LOG` when set, otherwise every component target at `info`
/// (`debug` when verbose).
fn env_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = COMPONENT_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .chain(std::iter::once(level.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        EnvFilter::new(directives)
    })
}

/// Logs to stderr so stdout stays free for results. Only the first call in
/// a process installs the subscriber and returns its guard; later calls
/// install nothing and return `None`. Keep the guard alive until exit.
pub fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let mut guard = None;

    INIT.call_once(|| {
        let (writer, worker) = tracing_appender::non_blocking(std::io::stderr());
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(writer)
                    .with_filter(env_filter(verbose)),
            )
            .init();
        guard = Some(worker);
    });

    guard
}

/// Like [`init_logging`], and also writes a never-rotated log file in
/// `log_dir`.
pub fn init_logging_with_dir(
    verbose: bool,
    log_dir: PathBuf,
) -> std::io::Result<Option<WorkerGuard>> {
    std::fs::create_dir_all(&log_dir)?;

    let mut guard = None;

    INIT.call_once(|| {
        let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, LOG_FILE_NAME);
        let (file_writer, worker) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_writer(file_writer)
            .with_filter(env_filter(verbose));

        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter(verbose));

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .init();
        guard = Some(worker);
    });

    Ok(guard)
}
