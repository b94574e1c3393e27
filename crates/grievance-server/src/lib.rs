//! Grievance workflow server.
//!
//! Wires the SQLite store, the configured department catalogue and the log
//! event sink into a [`WorkflowEngine`], and serves the JSON API under
//! `/api`.

pub mod catalog;
pub mod sink;

use std::{path::{Path, PathBuf}, sync::Arc};

use axum::Router;
use grievance_core::{collab::DepartmentValidator, store::GrievanceStore};
use grievance_workflow::{EngineConfig, WorkflowEngine};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use catalog::{CatalogValidator, CategoryEntry, DepartmentEntry};
pub use sink::LogSink;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GRIEVANCE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:        String,
  #[serde(default = "default_port")]
  pub port:        u16,
  #[serde(default = "default_store_path")]
  pub store_path:  PathBuf,
  #[serde(default)]
  pub engine:      EngineConfig,
  #[serde(default)]
  pub departments: Vec<DepartmentEntry>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/grievance/grievances.db") }

/// Layer the optional TOML file at `path` under the environment.
///
/// Nested keys use a double underscore, e.g.
/// `GRIEVANCE_ENGINE__SLA_THRESHOLD_HOURS=48`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("GRIEVANCE")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API nested under `/api`, with request tracing.
pub fn build_app<S, V>(engine: Arc<WorkflowEngine<S, V>>) -> Router
where
  S: GrievanceStore + 'static,
  V: DepartmentValidator + 'static,
{
  Router::new()
    .nest("/api", grievance_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}
