//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,quiz=debug,masking=warn,jlpt_quiz=debug").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets: `catalog`, `masking`, `quiz`, `jlpt_quiz`. The HTTP TraceLayer
//! adds per-request spans on top in `serve` mode.

use tracing_subscriber::EnvFilter;

const SERVER_FILTER: &str = "info,quiz=debug,masking=info,catalog=info,jlpt_quiz=debug,tower_http=info,axum=info";
const INTERACTIVE_FILTER: &str = "warn";

/// Where log lines go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogSink {
    /// stdout with the verbose server defaults.
    Server,
    /// stderr, quiet by default, so the quiz screen stays readable.
    Interactive,
}

pub fn init_tracing(sink: LogSink) {
    let default_filter = match sink {
        LogSink::Server => SERVER_FILTER,
        LogSink::Interactive => INTERACTIVE_FILTER,
    };
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    // Choose JSON vs pretty; don't try to store different layer types.
    match (sink, std::env::var("LOG_FORMAT").as_deref()) {
        (LogSink::Server, Ok("json")) => builder.with_writer(std::io::stdout).json().init(),
        (LogSink::Server, _) => builder.with_writer(std::io::stdout).init(),
        (LogSink::Interactive, Ok("json")) => builder.json().init(),
        (LogSink::Interactive, _) => builder.init(),
    }
}
