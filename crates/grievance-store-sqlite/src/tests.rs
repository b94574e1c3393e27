//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, SubsecRound, Utc};
use grievance_core::{
  assignment::{AssignOutcome, NewAssignment},
  grievance::{Grievance, GrievanceFilter, NewGrievance, Status},
  history::{StatusChange, StatusOutcome},
  store::GrievanceStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn now() -> chrono::DateTime<Utc> { Utc::now().trunc_subsecs(6) }

fn grievance(department: &str, citizen: &str) -> Grievance {
  Grievance::submit(
    NewGrievance {
      department_id:     department.into(),
      category_code:     "CAT".into(),
      sub_category_code: "SUB".into(),
      description:       "Water leakage near block 4".into(),
    },
    citizen,
    now(),
  )
}

async fn seeded(s: &SqliteStore, department: &str, citizen: &str) -> Grievance {
  let g = grievance(department, citizen);
  s.insert_grievance(&g).await.unwrap();
  g
}

fn assign_input(g: &Grievance, worker: &str) -> NewAssignment {
  NewAssignment {
    grievance_id: g.grievance_id,
    assigned_by:  "do-1".into(),
    assigned_to:  worker.into(),
    assigned_at:  now(),
    remarks:      None,
  }
}

fn change(g: &Grievance, status: Status, by: &str) -> StatusChange {
  StatusChange {
    grievance_id: g.grievance_id,
    status,
    from:         vec![],
    updated_by:   by.into(),
    remarks:      None,
    updated_at:   now(),
  }
}

async fn transition(s: &SqliteStore, g: &Grievance, status: Status) -> Grievance {
  match s.transition_status(change(g, status, "cw-1")).await.unwrap() {
    StatusOutcome::Updated(updated) => updated,
    other => panic!("expected {status} to apply, got {other:?}"),
  }
}

// ─── Grievances ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_grievance() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;

  let fetched = s.get_grievance(g.grievance_id).await.unwrap();
  assert_eq!(fetched, Some(g));
}

#[tokio::test]
async fn insert_writes_submitted_history_row() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;

  let history = s.list_history(g.grievance_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].status, Status::Submitted);
  assert_eq!(history[0].updated_by, "c1");
  assert_eq!(history[0].updated_at, g.created_at);
}

#[tokio::test]
async fn store_futures_are_send() {
  fn assert_send<T: Send>(_: &T) {}

  let s = store().await;
  let g = grievance("D1", "c1");
  assert_send(&s.insert_grievance(&g));
  assert_send(&s.transition_status(change(&g, Status::Closed, "do-1")));
  assert_send(&s.mark_escalated(g.grievance_id, "system", now()));
  assert_send(&s.commit_assignment(assign_input(&g, "cw-1")));
}

#[tokio::test]
async fn get_grievance_missing_returns_none() {
  let s = store().await;
  assert!(s.get_grievance(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Status transitions ──────────────────────────────────────────────────────

#[tokio::test]
async fn transition_writes_status_and_history_together() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;

  let mut input = change(&g, Status::DeptReview, "do-1");
  input.remarks = Some("forwarded".into());
  let StatusOutcome::Updated(updated) = s.transition_status(input.clone()).await.unwrap()
  else {
    panic!("expected the change to apply");
  };
  assert_eq!(updated.status, Status::DeptReview);
  assert_eq!(updated.updated_at, input.updated_at);
  assert_eq!(s.get_grievance(g.grievance_id).await.unwrap(), Some(updated));

  let history = s.list_history(g.grievance_id).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[1].status, Status::DeptReview);
  assert_eq!(history[1].updated_by, "do-1");
  assert_eq!(history[1].remarks.as_deref(), Some("forwarded"));
}

#[tokio::test]
async fn transition_leaves_assignment_fields_alone() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;
  let AssignOutcome::Assigned { grievance: assigned, .. } =
    s.commit_assignment(assign_input(&g, "cw-1")).await.unwrap()
  else {
    panic!("expected assignment");
  };

  // `g` is the pre-assignment snapshot; only its id reaches the store.
  let updated = transition(&s, &g, Status::WorkDone).await;
  assert_eq!(updated.assigned_worker_id.as_deref(), Some("cw-1"));
  assert_eq!(updated.assigned_at, assigned.assigned_at);
}

#[tokio::test]
async fn transition_never_clears_escalated() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;
  s.mark_escalated(g.grievance_id, "system", now()).await.unwrap().unwrap();

  let updated = transition(&s, &g, Status::InProgress).await;
  assert!(updated.escalated);
  assert_eq!(updated.status, Status::InProgress);
}

#[tokio::test]
async fn transition_checks_current_status() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;

  let mut input = change(&g, Status::Reopened, "c1");
  input.from = Status::REOPENABLE.to_vec();
  let outcome = s.transition_status(input).await.unwrap();
  assert!(matches!(outcome, StatusOutcome::WrongStatus(Status::Submitted)));

  let fetched = s.get_grievance(g.grievance_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, Status::Submitted);
  assert_eq!(s.list_history(g.grievance_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn transition_missing_grievance() {
  let s = store().await;
  let g = grievance("D1", "c1");
  let outcome = s.transition_status(change(&g, Status::Closed, "do-1")).await.unwrap();
  assert!(matches!(outcome, StatusOutcome::GrievanceNotFound));
  assert!(s.list_history(g.grievance_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reactivation_refused_while_worker_busy() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let b = seeded(&s, "D1", "c2").await;

  s.commit_assignment(assign_input(&a, "cw-1")).await.unwrap();
  transition(&s, &a, Status::Resolved).await;
  s.commit_assignment(assign_input(&b, "cw-1")).await.unwrap();

  let outcome = s.transition_status(change(&a, Status::InProgress, "cw-1")).await.unwrap();
  assert!(matches!(outcome, StatusOutcome::WorkerBusy(ref w) if w == "cw-1"));

  let a_now = s.get_grievance(a.grievance_id).await.unwrap().unwrap();
  assert_eq!(a_now.status, Status::Resolved);
  // SUBMITTED, ASSIGNED, RESOLVED; nothing for the refused change.
  assert_eq!(s.list_history(a.grievance_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn moving_between_active_statuses_skips_load_check() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;
  s.commit_assignment(assign_input(&g, "cw-1")).await.unwrap();

  let updated = transition(&s, &g, Status::InProgress).await;
  assert_eq!(updated.status, Status::InProgress);
}

#[tokio::test]
async fn concurrent_reactivation_and_assignment_admit_one() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let b = seeded(&s, "D1", "c2").await;
  s.commit_assignment(assign_input(&a, "cw-1")).await.unwrap();
  transition(&s, &a, Status::Resolved).await;

  let (reactivated, assigned) = tokio::join!(
    s.transition_status(change(&a, Status::InProgress, "cw-1")),
    s.commit_assignment(assign_input(&b, "cw-1")),
  );
  let reactivated = matches!(reactivated.unwrap(), StatusOutcome::Updated(_));
  let assigned = matches!(assigned.unwrap(), AssignOutcome::Assigned { .. });
  assert!(reactivated ^ assigned, "exactly one write may win");

  let active = s
    .list_grievances(&GrievanceFilter {
      assigned_worker_id: Some("cw-1".into()),
      statuses: Status::ACTIVE.to_vec(),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn list_grievances_filters() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let _b = seeded(&s, "D2", "c1").await;
  let c = seeded(&s, "D1", "c2").await;

  let all = s.list_grievances(&GrievanceFilter::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let d1 = s
    .list_grievances(&GrievanceFilter {
      department_id: Some("D1".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(
    d1.iter().map(|g| g.grievance_id).collect::<Vec<_>>(),
    vec![a.grievance_id, c.grievance_id]
  );

  let d1_c2 = s
    .list_grievances(&GrievanceFilter {
      department_id: Some("D1".into()),
      citizen_id: Some("c2".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(d1_c2.len(), 1);
  assert_eq!(d1_c2[0].grievance_id, c.grievance_id);
}

#[tokio::test]
async fn list_grievances_by_status_set() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let _b = seeded(&s, "D1", "c1").await;
  s.commit_assignment(assign_input(&a, "cw-1")).await.unwrap();

  let active = s
    .list_grievances(&GrievanceFilter {
      statuses: Status::ACTIVE.to_vec(),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].grievance_id, a.grievance_id);
}

// ─── Escalation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn mark_escalated_is_conditional() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;

  let first = s.mark_escalated(g.grievance_id, "system", now()).await.unwrap();
  let first = first.expect("first escalation applies");
  assert!(first.escalated);
  assert_eq!(first.status, Status::Escalated);

  let second = s.mark_escalated(g.grievance_id, "do-1", now()).await.unwrap();
  assert!(second.is_none());

  // One ESCALATED row, from the write that applied.
  let history = s.list_history(g.grievance_id).await.unwrap();
  let escalations: Vec<&str> = history
    .iter()
    .filter(|h| h.status == Status::Escalated)
    .map(|h| h.updated_by.as_str())
    .collect();
  assert_eq!(escalations, ["system"]);
}

#[tokio::test]
async fn sla_breaches_only_old_active_unescalated() {
  let s = store().await;
  let old = seeded(&s, "D1", "c1").await;
  let fresh = seeded(&s, "D1", "c1").await;
  let old_escalated = seeded(&s, "D1", "c1").await;
  let unassigned = seeded(&s, "D1", "c1").await;

  let eight_days_ago = now() - Duration::days(8);
  let mut a = assign_input(&old, "cw-1");
  a.assigned_at = eight_days_ago;
  s.commit_assignment(a).await.unwrap();

  s.commit_assignment(assign_input(&fresh, "cw-2")).await.unwrap();

  let mut c = assign_input(&old_escalated, "cw-3");
  c.assigned_at = eight_days_ago;
  s.commit_assignment(c).await.unwrap();
  s.mark_escalated(old_escalated.grievance_id, "system", now()).await.unwrap();

  let cutoff = now() - Duration::days(7);
  let breaches = s.find_sla_breaches(cutoff).await.unwrap();
  let ids: Vec<Uuid> = breaches.iter().map(|g| g.grievance_id).collect();
  assert_eq!(ids, vec![old.grievance_id]);
  assert!(!ids.contains(&unassigned.grievance_id));
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn commit_assignment_moves_grievance_to_assigned() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;

  let outcome = s.commit_assignment(assign_input(&g, "cw-1")).await.unwrap();
  let AssignOutcome::Assigned { grievance, assignment } = outcome else {
    panic!("expected assignment to apply");
  };
  assert_eq!(grievance.status, Status::Assigned);
  assert_eq!(grievance.assigned_worker_id.as_deref(), Some("cw-1"));
  assert_eq!(grievance.assigned_at, Some(assignment.assigned_at));

  let fetched = s.get_grievance(g.grievance_id).await.unwrap().unwrap();
  assert_eq!(fetched, grievance);
  assert!(s.worker_has_active_case("cw-1").await.unwrap());
}

#[tokio::test]
async fn commit_assignment_writes_history_row() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;

  let mut input = assign_input(&g, "cw-1");
  input.remarks = Some("Assigned to cw-1".into());
  s.commit_assignment(input.clone()).await.unwrap();

  let history = s.list_history(g.grievance_id).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[1].status, Status::Assigned);
  assert_eq!(history[1].updated_by, "do-1");
  assert_eq!(history[1].remarks.as_deref(), Some("Assigned to cw-1"));
  assert_eq!(history[1].updated_at, input.assigned_at);
}

#[tokio::test]
async fn commit_assignment_rejects_busy_worker() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let b = seeded(&s, "D1", "c2").await;

  s.commit_assignment(assign_input(&a, "cw-1")).await.unwrap();
  let outcome = s.commit_assignment(assign_input(&b, "cw-1")).await.unwrap();
  assert!(matches!(outcome, AssignOutcome::WorkerBusy));

  // Nothing was written for the rejected attempt.
  assert_eq!(s.assignments_by_officer("do-1", None).await.unwrap().len(), 1);
  let b_now = s.get_grievance(b.grievance_id).await.unwrap().unwrap();
  assert_eq!(b_now.status, Status::Submitted);
  assert_eq!(s.list_history(b.grievance_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn commit_assignment_rejects_already_assigned() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;

  s.commit_assignment(assign_input(&g, "cw-1")).await.unwrap();
  let outcome = s.commit_assignment(assign_input(&g, "cw-2")).await.unwrap();
  assert!(matches!(outcome, AssignOutcome::AlreadyAssigned));
}

#[tokio::test]
async fn resolved_case_frees_worker() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let b = seeded(&s, "D1", "c2").await;

  s.commit_assignment(assign_input(&a, "cw-1")).await.unwrap();
  transition(&s, &a, Status::Resolved).await;

  assert!(!s.worker_has_active_case("cw-1").await.unwrap());
  let outcome = s.commit_assignment(assign_input(&b, "cw-1")).await.unwrap();
  assert!(matches!(outcome, AssignOutcome::Assigned { .. }));
}

#[tokio::test]
async fn commit_assignment_missing_grievance() {
  let s = store().await;
  let g = grievance("D1", "c1");
  let outcome = s.commit_assignment(assign_input(&g, "cw-1")).await.unwrap();
  assert!(matches!(outcome, AssignOutcome::GrievanceNotFound));
}

#[tokio::test]
async fn concurrent_assignments_to_one_worker_admit_one() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let b = seeded(&s, "D1", "c2").await;

  let (ra, rb) = tokio::join!(
    s.commit_assignment(assign_input(&a, "cw-1")),
    s.commit_assignment(assign_input(&b, "cw-1")),
  );
  let outcomes = [ra.unwrap(), rb.unwrap()];
  let assigned = outcomes
    .iter()
    .filter(|o| matches!(o, AssignOutcome::Assigned { .. }))
    .count();
  let busy = outcomes
    .iter()
    .filter(|o| matches!(o, AssignOutcome::WorkerBusy))
    .count();
  assert_eq!((assigned, busy), (1, 1));
}

#[tokio::test]
async fn assignments_by_officer_in_insertion_order() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let b = seeded(&s, "D1", "c2").await;

  s.commit_assignment(assign_input(&a, "cw-2")).await.unwrap();
  s.commit_assignment(assign_input(&b, "cw-1")).await.unwrap();

  let rows = s.assignments_by_officer("do-1", None).await.unwrap();
  let workers: Vec<&str> = rows.iter().map(|r| r.assigned_to.as_str()).collect();
  assert_eq!(workers, ["cw-2", "cw-1"]);
  assert!(s.assignments_by_officer("do-9", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn assignments_by_officer_narrowed_to_department() {
  let s = store().await;
  let a = seeded(&s, "D1", "c1").await;
  let b = seeded(&s, "D2", "c2").await;

  s.commit_assignment(assign_input(&a, "cw-1")).await.unwrap();
  s.commit_assignment(assign_input(&b, "cw-2")).await.unwrap();

  let d2 = s.assignments_by_officer("do-1", Some("D2")).await.unwrap();
  assert_eq!(d2.len(), 1);
  assert_eq!(d2[0].assigned_to, "cw-2");
  assert!(s.assignments_by_officer("do-1", Some("D3")).await.unwrap().is_empty());
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn history_is_returned_in_write_order() {
  let s = store().await;
  let g = seeded(&s, "D1", "c1").await;
  s.commit_assignment(assign_input(&g, "cw-1")).await.unwrap();
  transition(&s, &g, Status::InProgress).await;

  let history = s.list_history(g.grievance_id).await.unwrap();
  let statuses: Vec<Status> = history.iter().map(|h| h.status).collect();
  assert_eq!(
    statuses,
    [Status::Submitted, Status::Assigned, Status::InProgress]
  );
  assert_eq!(history[2].updated_by, "cw-1");
}

#[tokio::test]
async fn history_for_unknown_grievance_is_empty() {
  let s = store().await;
  assert!(s.list_history(Uuid::new_v4()).await.unwrap().is_empty());
}
