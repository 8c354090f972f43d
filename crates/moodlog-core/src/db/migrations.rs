//! Database migrations

use rusqlite::{params, Connection};

use crate::error::Result;

/// Current schema version
const CURRENT_VERSION: i32 = 3;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }
    if version < 3 {
        migrate_v3(conn)?;
    }

    tracing::debug!(version = CURRENT_VERSION, "Local store schema is current");
    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Apply one schema step and record its version atomically.
fn apply(conn: &Connection, version: i32, sql: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?)",
        params![version],
    )?;
    tx.commit()?;
    Ok(())
}

/// Migration to version 1: Initial schema
fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        1,
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY NOT NULL CHECK (length(trim(id)) > 0),
            title TEXT NOT NULL,
            body TEXT,
            timestamp_ms INTEGER NOT NULL
        );",
    )
}

/// Migration to version 2: mood column and timestamp index
fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        2,
        "ALTER TABLE notes ADD COLUMN mood TEXT NOT NULL DEFAULT 'neutral'
            CHECK (mood IN ('happy', 'neutral', 'sad'));
        CREATE INDEX IF NOT EXISTS idx_notes_timestamp ON notes(timestamp_ms DESC);",
    )
}

/// Migration to version 3: timestamp nanoseconds below the millisecond
fn migrate_v3(conn: &Connection) -> Result<()> {
    apply(
        conn,
        3,
        "ALTER TABLE notes ADD COLUMN timestamp_sub_ms_ns INTEGER NOT NULL DEFAULT 0
            CHECK (timestamp_sub_ms_ns BETWEEN 0 AND 999999);",
    )
}
