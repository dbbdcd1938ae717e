//! SQL schema for the Kin SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per observed (phone, email) fact. Rows are never deleted; a merge
-- only rewrites linked_id, link_precedence and updated_at.
CREATE TABLE IF NOT EXISTS contact (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    phone_number    TEXT,
    email           TEXT,
    linked_id       INTEGER REFERENCES contact(id),
    link_precedence TEXT NOT NULL,   -- 'primary' | 'secondary'
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, microseconds
    updated_at      TEXT NOT NULL,
    deleted_at      TEXT,
    CHECK (link_precedence IN ('primary', 'secondary')),
    CHECK (phone_number IS NOT NULL OR email IS NOT NULL),
    CHECK ((link_precedence = 'primary') = (linked_id IS NULL))
);

CREATE INDEX IF NOT EXISTS contact_phone_idx  ON contact(phone_number);
CREATE INDEX IF NOT EXISTS contact_email_idx  ON contact(email);
CREATE INDEX IF NOT EXISTS contact_linked_idx ON contact(linked_id);

PRAGMA user_version = 1;
";
