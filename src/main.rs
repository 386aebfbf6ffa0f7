//! JLPT Quiz · grammar and vocabulary quiz generator
//!
//! - Interactive terminal quiz (default)
//! - `validate [LEVEL]`: catalog checks and masking audit
//! - `serve`: Axum JSON API over the same session logic
//!
//! Important env variables:
//!   QUIZ_CONFIG_PATH : path to TOML config (data dir, default level, messages)
//!   QUIZ_DATA_DIR    : catalog directory (default "./data")
//!   PORT             : u16 for `serve` (default 3000)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod catalog;
mod cli;
mod config;
mod domain;
mod error;
mod generator;
mod masking;
mod protocol;
mod routes;
mod seeds;
mod session;
mod settings;
mod state;
mod telemetry;
mod util;
mod validate;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::catalog::CatalogStore;
use crate::config::{load_app_config_from_env, AppConfig};
use crate::domain::Level;
use crate::masking::MaskAudit;
use crate::routes::build_router;
use crate::state::AppState;
use crate::telemetry::LogSink;

const USAGE: &str = "usage: jlpt-quiz [serve | validate [LEVEL] | help]";

enum Command {
  Interactive,
  Serve,
  Validate(Option<Level>),
  Help,
}

fn parse_args() -> Result<Command, String> {
  let args: Vec<String> = std::env::args().collect();
  match args.get(1).map(String::as_str) {
    None => Ok(Command::Interactive),
    Some("serve") => Ok(Command::Serve),
    Some("validate") => args.get(2).map(|l| l.parse::<Level>()).transpose().map(Command::Validate),
    Some("help" | "-h" | "--help") => Ok(Command::Help),
    Some(other) => Err(format!("unknown command '{other}'")),
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let command = match parse_args() {
    Ok(c) => c,
    Err(e) => {
      eprintln!("{e}\n{USAGE}");
      std::process::exit(2);
    }
  };

  match command {
    Command::Help => {
      println!("{USAGE}");
      Ok(())
    }
    Command::Interactive => {
      telemetry::init_tracing(LogSink::Interactive);
      let cfg = load_app_config_from_env();
      run_interactive(cfg).await
    }
    Command::Validate(level) => {
      telemetry::init_tracing(LogSink::Interactive);
      let cfg = load_app_config_from_env();
      std::process::exit(run_validate(&cfg, level));
    }
    Command::Serve => {
      telemetry::init_tracing(LogSink::Server);
      let cfg = load_app_config_from_env();
      serve(cfg).await
    }
  }
}

/// The terminal loop blocks on stdin, so it runs off the async workers.
async fn run_interactive(cfg: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
  tokio::task::spawn_blocking(move || {
    let store = CatalogStore::new(cfg.data_dir.clone());
    let stdin = std::io::stdin();
    let mut term = cli::Terminal::new(store, cfg.messages, settings::settings_path(), stdin.lock(), std::io::stdout());
    term.run()
  })
  .await??;
  Ok(())
}

/// Validate one level, or every level with both catalog files present.
fn run_validate(cfg: &AppConfig, level: Option<Level>) -> i32 {
  let store = CatalogStore::new(cfg.data_dir.clone());
  let levels = match level {
    Some(l) => vec![l],
    None => store.available_levels(),
  };
  if levels.is_empty() {
    error!(target: "catalog", data_dir = %store.data_dir().display(), "No complete catalogs found");
    eprintln!("no catalogs found under {}", store.data_dir().display());
  }

  let outcomes: Vec<_> = levels.iter().map(|l| validate::validate_level(&store, *l)).collect();
  let mut total = MaskAudit::default();
  for (l, outcome) in levels.iter().zip(&outcomes) {
    match outcome {
      Ok(report) => {
        print!("{report}");
        total.merge(&report.mask_audit);
      }
      Err(e) => eprintln!("{l}: {e}"),
    }
  }
  if outcomes.len() > 1 {
    println!("== all levels: {} masked, {} approximate ==", total.total(), total.approximate());
  }
  validate::exit_code(&outcomes)
}

#[instrument(level = "info", skip_all)]
async fn serve(cfg: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
  // Build shared application state (catalog cache, messages, sessions).
  let state = Arc::new(AppState::new(cfg));

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "jlpt_quiz", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "jlpt_quiz", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "jlpt_quiz", error = %e, "Failed to listen for shutdown signal");
  }
}
