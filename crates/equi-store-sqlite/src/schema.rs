//! SQL schema for the Equi SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS events (
    event_id      TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    hall_rows     INTEGER NOT NULL,
    hall_cols     INTEGER NOT NULL,
    cluster_size  INTEGER NOT NULL,
    privacy_mode  INTEGER NOT NULL DEFAULT 0,
    next_serial   INTEGER NOT NULL DEFAULT 1,   -- never decremented
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participants (
    event_id      TEXT NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    serial_no     INTEGER NOT NULL,
    gender        TEXT NOT NULL,                -- 'Male' | 'Female' | 'Non-Binary'
    seat          TEXT,                         -- NULL when the hall was full
    name          TEXT,
    external_id   TEXT,
    branch        TEXT,
    age           INTEGER,
    embedding     TEXT NOT NULL DEFAULT '[]',   -- JSON array of f32
    registered_at TEXT NOT NULL,
    PRIMARY KEY (event_id, serial_no)
);

-- At most one participant per seat within an event.
CREATE UNIQUE INDEX IF NOT EXISTS participants_seat_idx
    ON participants(event_id, seat) WHERE seat IS NOT NULL;

CREATE TABLE IF NOT EXISTS candidates (
    event_id      TEXT NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    position      INTEGER NOT NULL,
    candidate_id  TEXT NOT NULL,
    name          TEXT NOT NULL,
    gender        TEXT NOT NULL,
    skills        TEXT NOT NULL,                -- JSON array (tags) or object (levels)
    PRIMARY KEY (event_id, candidate_id)
);

CREATE TABLE IF NOT EXISTS roles (
    event_id      TEXT NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
    position      INTEGER NOT NULL,
    name          TEXT NOT NULL,
    capacity      INTEGER NOT NULL CHECK (capacity > 0),
    requirements  TEXT NOT NULL,                -- JSON object skill -> weight
    PRIMARY KEY (event_id, name)
);

PRAGMA user_version = 1;
";
