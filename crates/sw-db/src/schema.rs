use rusqlite::{Connection, Result};
use std::path::Path;

/// Shared pragmas for every connection: WAL so the serve layer and background
/// review tasks can interleave, a busy timeout instead of immediate SQLITE_BUSY,
/// and enforced foreign keys (reviews and messages reference projects).
fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "foreign_keys", true)?;
    Ok(())
}

pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!("../migrations/0001_init.sql"))
}

pub fn open_and_migrate(path: &Path) -> Result<Connection> {
    let conn = open(path)?;
    migrate(&conn)?;
    Ok(conn)
}

pub fn with_test_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrate(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_is_rerunnable() {
        let conn = with_test_db().expect("db");
        migrate(&conn).expect("second run");
    }

    #[test]
    fn test_orphan_review_is_rejected() {
        let conn = with_test_db().expect("db");
        let result = conn.execute(
            "INSERT INTO reviews (id, project_id, status, created_at) VALUES ('rev_x', 'proj_missing', 'RUNNING', '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
