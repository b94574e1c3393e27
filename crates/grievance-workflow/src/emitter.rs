//! Best-effort event emission.
//!
//! Events go onto a bounded queue drained by a single delivery task. The
//! engine never waits on delivery: when the queue is full the event is
//! dropped and logged, and sink failures are logged by the delivery task.

use grievance_core::collab::{EventSink, GrievanceEvent};
use tokio::{
  sync::mpsc::{self, error::TrySendError},
  task::JoinHandle,
};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct EventEmitter {
  tx: mpsc::Sender<GrievanceEvent>,
}

impl EventEmitter {
  /// Start a delivery task that forwards queued events to `sink`.
  ///
  /// The task ends once every `EventEmitter` clone has been dropped and the
  /// queue is drained.
  pub fn spawn<K>(sink: K, capacity: usize) -> (Self, JoinHandle<()>)
  where
    K: EventSink + 'static,
  {
    let (emitter, mut rx) = Self::channel(capacity);
    let handle = tokio::spawn(async move {
      while let Some(event) = rx.recv().await {
        let grievance_id = event.grievance_id;
        let event_type = event.event_type;
        if let Err(e) = sink.deliver(event).await {
          warn!(%grievance_id, %event_type, error = %e, "event delivery failed");
        }
      }
      debug!("event queue closed");
    });
    (emitter, handle)
  }

  /// An emitter whose queue the caller drains directly.
  pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<GrievanceEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Self { tx }, rx)
  }

  /// Queue `event` without waiting. Never fails.
  pub fn emit(&self, event: GrievanceEvent) {
    match self.tx.try_send(event) {
      Ok(()) => {}
      Err(TrySendError::Full(event)) => {
        warn!(
          grievance_id = %event.grievance_id,
          event_type = %event.event_type,
          "event dropped: queue full"
        );
      }
      Err(TrySendError::Closed(event)) => {
        debug!(
          grievance_id = %event.grievance_id,
          "event dropped: queue closed"
        );
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use grievance_core::collab::EventType;
  use uuid::Uuid;

  use super::*;

  fn event(n: u32) -> GrievanceEvent {
    GrievanceEvent {
      grievance_id: Uuid::new_v4(),
      user_id:      format!("c{n}"),
      event_type:   EventType::StatusUpdated,
      message:      format!("event {n}"),
    }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("sink offline")]
  struct Offline;

  /// Fails every other delivery, recording the ones that succeed.
  #[derive(Clone, Default)]
  struct Flaky {
    calls:     Arc<Mutex<u32>>,
    delivered: Arc<Mutex<Vec<String>>>,
  }

  impl EventSink for Flaky {
    type Error = Offline;

    async fn deliver(&self, event: GrievanceEvent) -> Result<(), Offline> {
      let n = {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        *calls
      };
      if n % 2 == 0 {
        return Err(Offline);
      }
      self.delivered.lock().unwrap().push(event.user_id);
      Ok(())
    }
  }

  #[tokio::test]
  async fn full_queue_drops_without_blocking() {
    let (emitter, mut rx) = EventEmitter::channel(2);
    for n in 0..5 {
      emitter.emit(event(n));
    }
    drop(emitter);

    let mut received = vec![];
    while let Some(e) = rx.recv().await {
      received.push(e.user_id);
    }
    assert_eq!(received, ["c0", "c1"]);
  }

  #[tokio::test]
  async fn closed_queue_is_silent() {
    let (emitter, rx) = EventEmitter::channel(4);
    drop(rx);
    emitter.emit(event(0));
  }

  #[tokio::test]
  async fn sink_failures_do_not_stop_delivery() {
    let sink = Flaky::default();
    let (emitter, handle) = EventEmitter::spawn(sink.clone(), 16);
    for n in 0..4 {
      emitter.emit(event(n));
    }
    drop(emitter);
    handle.await.unwrap();

    assert_eq!(*sink.calls.lock().unwrap(), 4);
    assert_eq!(*sink.delivered.lock().unwrap(), ["c0", "c2"]);
  }
}
