//! Table definition for the ticket store.

use crate::config::DatabaseConfig;
use rusqlite::{Connection, Result};

/// DDL for the `tickets` table and its indexes.
///
/// Idempotent: every statement uses `IF NOT EXISTS`. The `CHECK`
/// constraints repeat the field rules enforced in Rust so that no other
/// writer can store an out-of-domain value.
pub const SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS tickets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL CHECK(length(name) <= 100),
        created_at TEXT NOT NULL DEFAULT (strftime('%m-%d-%Y %H:%M:%S','now')),
        description TEXT NOT NULL CHECK(length(description) <= 1000),
        status TEXT NOT NULL DEFAULT 'Open' CHECK(status IN ('Open','In Progress','Closed')),
        priority TEXT NOT NULL DEFAULT 'Low' CHECK(priority IN ('Low','Medium','High'))
    );

    CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
    CREATE INDEX IF NOT EXISTS idx_tickets_priority ON tickets(priority);
    CREATE INDEX IF NOT EXISTS idx_tickets_created ON tickets(created_at);
";

/// Apply per-connection pragmas.
///
/// `journal_mode` reports the resulting mode as a row, so it goes through
/// `pragma_update_and_check`. In-memory databases answer `memory`.
pub fn configure(conn: &Connection, options: &DatabaseConfig) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    let mode: String = conn.pragma_update_and_check(
        None,
        "journal_mode",
        options.journal_mode.pragma_value(),
        |row| row.get(0),
    )?;
    tracing::debug!(journal_mode = %mode, "sqlite journal mode set");
    conn.pragma_update(None, "synchronous", options.synchronous.pragma_value())?;
    Ok(())
}

/// Create the table and indexes if they do not exist yet.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
