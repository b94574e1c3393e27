//! SQL schema for the grievance SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The only mutable collection.
CREATE TABLE IF NOT EXISTS grievances (
    grievance_id       TEXT PRIMARY KEY,
    citizen_id         TEXT NOT NULL,
    department_id      TEXT NOT NULL,
    category_code      TEXT NOT NULL,
    sub_category_code  TEXT NOT NULL,
    assigned_worker_id TEXT,
    description        TEXT NOT NULL,
    status             TEXT NOT NULL,   -- SCREAMING_SNAKE_CASE Status
    created_at         TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at         TEXT NOT NULL,
    assigned_at        TEXT,
    escalated          INTEGER NOT NULL DEFAULT 0
);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS assignments (
    assignment_id TEXT PRIMARY KEY,
    grievance_id  TEXT NOT NULL REFERENCES grievances(grievance_id),
    assigned_by   TEXT NOT NULL,
    assigned_to   TEXT NOT NULL,
    assigned_at   TEXT NOT NULL
);

-- Append-only audit trail.
CREATE TABLE IF NOT EXISTS grievance_history (
    history_id   TEXT PRIMARY KEY,
    grievance_id TEXT NOT NULL REFERENCES grievances(grievance_id),
    status       TEXT NOT NULL,
    updated_by   TEXT NOT NULL,
    remarks      TEXT,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS grievances_worker_idx     ON grievances(assigned_worker_id);
CREATE INDEX IF NOT EXISTS grievances_department_idx ON grievances(department_id);
CREATE INDEX IF NOT EXISTS grievances_citizen_idx    ON grievances(citizen_id);
CREATE INDEX IF NOT EXISTS assignments_grievance_idx ON assignments(grievance_id);
CREATE INDEX IF NOT EXISTS assignments_officer_idx   ON assignments(assigned_by);
CREATE INDEX IF NOT EXISTS history_grievance_idx     ON grievance_history(grievance_id);

PRAGMA user_version = 1;
";
