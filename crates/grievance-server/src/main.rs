//! grievance-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `GRIEVANCE_*` environment variables, opens the SQLite store, starts the
//! event delivery task and the SLA sweeper, and serves the JSON API.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use grievance_server::{
  CatalogValidator, LogSink, build_app, expand_tilde, load_config,
};
use grievance_store_sqlite::SqliteStore;
use grievance_workflow::{EventEmitter, Sweeper, WorkflowEngine};
use tokio::{net::TcpListener, sync::watch};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Grievance workflow server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Load and validate the configuration, print it, and exit.
  #[arg(long)]
  check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = load_config(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  if cli.check_config {
    println!("{server_cfg:#?}");
    return Ok(());
  }

  let catalog = CatalogValidator::new(&server_cfg.departments);
  if catalog.is_empty() {
    warn!("department catalogue is empty; every new grievance will be rejected");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let (events, delivery) =
    EventEmitter::spawn(LogSink, server_cfg.engine.event_queue_capacity);
  let engine = Arc::new(WorkflowEngine::new(
    Arc::new(store),
    catalog,
    events,
    server_cfg.engine.clone(),
  ));

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let sweeper = Sweeper::new(Arc::clone(&engine)).spawn(shutdown_rx);

  let app = build_app(Arc::clone(&engine));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
      }
      info!("shutting down");
    })
    .await
    .context("server error")?;

  // Stop the sweeper, then let queued events drain.
  shutdown_tx.send(true).ok();
  sweeper.await.context("sweeper task panicked")?;
  drop(engine);
  delivery.await.context("event delivery task panicked")?;

  Ok(())
}
