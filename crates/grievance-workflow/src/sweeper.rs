//! Periodic SLA escalation.
//!
//! Each tick finds grievances that have sat in `ASSIGNED`/`IN_PROGRESS` past
//! the threshold and escalates them as the system actor. Every candidate runs
//! in its own task, so one failure (or panic) is logged and counted without
//! affecting the rest of the batch.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use grievance_core::{
  actor::Actor,
  collab::DepartmentValidator,
  store::GrievanceStore,
};
use tokio::{
  sync::watch,
  task::{JoinHandle, JoinSet},
  time::MissedTickBehavior,
};
use tracing::{debug, error, info, warn};

use crate::{Result, WorkflowEngine};

/// Outcome of one sweep tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
  pub candidates: usize,
  /// Candidates this tick moved to `ESCALATED`.
  pub escalated:  usize,
  /// Candidates someone else escalated between the query and the write.
  pub skipped:    usize,
  pub failed:     usize,
}

pub struct Sweeper<S, V> {
  engine: Arc<WorkflowEngine<S, V>>,
  period: Duration,
}

impl<S, V> Sweeper<S, V>
where
  S: GrievanceStore + 'static,
  V: DepartmentValidator + 'static,
{
  pub fn new(engine: Arc<WorkflowEngine<S, V>>) -> Self {
    let period = engine.config().sweep_interval();
    Self { engine, period }
  }

  /// Run a single tick as of `now`.
  ///
  /// Only the candidate query can fail the tick; per-grievance failures are
  /// reported in [`SweepReport::failed`].
  pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport> {
    let candidates = self.engine.find_sla_breaches(now).await?;
    let mut report = SweepReport { candidates: candidates.len(), ..Default::default() };

    let mut tasks = JoinSet::new();
    for grievance in candidates {
      let engine = Arc::clone(&self.engine);
      let id = grievance.grievance_id;
      tasks.spawn(async move {
        (id, engine.escalate(id, &Actor::system()).await)
      });
    }

    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((_, Ok((_, true)))) => report.escalated += 1,
        Ok((_, Ok((_, false)))) => report.skipped += 1,
        Ok((id, Err(e))) => {
          report.failed += 1;
          warn!(grievance_id = %id, error = %e, "sla escalation failed");
        }
        Err(e) => {
          report.failed += 1;
          error!(error = %e, "sla escalation task aborted");
        }
      }
    }

    if report.candidates > 0 {
      info!(
        candidates = report.candidates,
        escalated = report.escalated,
        skipped = report.skipped,
        failed = report.failed,
        "sla sweep finished"
      );
    } else {
      debug!("sla sweep found no breaches");
    }
    Ok(report)
  }

  /// Tick every period until `shutdown` flips to `true` or its sender is
  /// dropped. Missed ticks are skipped rather than replayed.
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(self.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(period = ?self.period, "sla sweeper started");

    loop {
      tokio::select! {
        _ = interval.tick() => {
          if let Err(e) = self.sweep_once(Utc::now()).await {
            warn!(error = %e, "sla sweep tick failed");
          }
        }
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            break;
          }
        }
      }
    }
    info!("sla sweeper stopped");
  }

  pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(self.run(shutdown))
  }
}
