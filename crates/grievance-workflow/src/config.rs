//! Engine tunables, deserialised from the `[engine]` table of the server
//! configuration.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// How long a grievance may sit in `ASSIGNED`/`IN_PROGRESS` before the
  /// sweeper escalates it.
  pub sla_threshold_hours:  u64,
  pub sweep_interval_secs:  u64,
  /// Upper bound on any single store or validator call.
  pub io_timeout_ms:        u64,
  /// Events beyond this many undelivered are dropped.
  pub event_queue_capacity: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      sla_threshold_hours:  7 * 24,
      sweep_interval_secs:  3600,
      io_timeout_ms:        5000,
      event_queue_capacity: 1024,
    }
  }
}

impl EngineConfig {
  pub fn sla_threshold(&self) -> chrono::Duration {
    chrono::Duration::hours(self.sla_threshold_hours as i64)
  }

  pub fn sweep_interval(&self) -> Duration {
    Duration::from_secs(self.sweep_interval_secs.max(1))
  }

  pub fn io_timeout(&self) -> Duration { Duration::from_millis(self.io_timeout_ms) }
}
