//! Event sink that writes notifications to the log.

use std::convert::Infallible;

use grievance_core::collab::{EventSink, GrievanceEvent};
use tracing::info;

/// Logs every event at `INFO` under the `grievance::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
  type Error = Infallible;

  async fn deliver(&self, event: GrievanceEvent) -> Result<(), Infallible> {
    info!(
      target: "grievance::events",
      grievance_id = %event.grievance_id,
      user_id = %event.user_id,
      event_type = %event.event_type,
      "{}",
      event.message
    );
    Ok(())
  }
}
