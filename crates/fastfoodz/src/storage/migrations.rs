//! Database schema versioning.
//!
//! The schema is built from an ordered list of [`Migration`]s. The version
//! of the last one applied lives in the `metadata` table; opening a database
//! applies whatever is pending, each step in its own transaction.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::{CREATE_METADATA_TABLE, SCHEMA_STATEMENTS};

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// One step of schema evolution.
#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i32,
    description: &'static str,
    statements: &'static [&'static str],
}

/// Every migration, in version order starting at 1.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "snapshot, business and metadata tables",
    statements: SCHEMA_STATEMENTS,
}];

/// Bring the schema up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if a migration fails, the stored version is unreadable,
/// or the database was written by a newer version.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let stored = get_schema_version(conn)?;
    if stored > CURRENT_VERSION {
        return Err(Error::Schema {
            message: format!(
                "database schema version {stored} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > stored).collect();
    if pending.is_empty() {
        debug!("Schema is at version {}", stored);
        return Ok(());
    }

    for migration in pending {
        apply_migration(conn, migration)?;
    }
    info!("Schema migrated from version {} to {}", stored, CURRENT_VERSION);
    Ok(())
}

/// Read the stored schema version; 0 for a fresh database.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [SCHEMA_VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    let Some(value) = value else {
        return Ok(0);
    };
    value.trim().parse().map_err(|_| Error::Schema {
        message: format!("invalid schema version: {value}"),
    })
}

/// Run one migration and record its version, all or nothing.
fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    debug!(
        "Applying migration {}: {}",
        migration.version, migration.description
    );

    let tx = conn.unchecked_transaction()?;
    for statement in migration.statements {
        tx.execute(statement, []).map_err(|e| Error::Schema {
            message: format!("migration {} failed: {e}", migration.version),
        })?;
    }
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (SCHEMA_VERSION_KEY, migration.version.to_string()),
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    fn has_object(conn: &Connection, kind: &str, name: &str) -> bool {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2",
                [kind, name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_migrations_are_contiguous() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version, i32::try_from(i).unwrap() + 1);
        }
        assert_eq!(MIGRATIONS.last().map(|m| m.version), Some(CURRENT_VERSION));
    }

    #[test]
    fn test_fresh_database_gets_full_schema() {
        let conn = fresh_db();
        assert_eq!(get_schema_version(&conn).ok(), None);

        initialize_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
        for table in ["snapshots", "businesses", "metadata"] {
            assert!(has_object(&conn, "table", table), "missing table {table}");
        }
        for index in [
            "idx_snapshots_request_date",
            "idx_businesses_snapshot",
            "idx_businesses_business_id",
        ] {
            assert!(has_object(&conn, "index", index), "missing index {index}");
        }
    }

    #[test]
    fn test_reopening_keeps_version_and_data() {
        let conn = fresh_db();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO snapshots (request_date, region_latitude, region_longitude) \
             VALUES ('2024-01-01T00:00:00.000000Z', 1.0, 2.0)",
            [],
        )
        .unwrap();

        initialize_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_newer_database_is_rejected() {
        let conn = fresh_db();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = ?1 WHERE key = ?2",
            ((CURRENT_VERSION + 1).to_string(), SCHEMA_VERSION_KEY),
        )
        .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_unreadable_version_is_an_error() {
        let conn = fresh_db();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = 'abc' WHERE key = ?1",
            [SCHEMA_VERSION_KEY],
        )
        .unwrap();

        let err = get_schema_version(&conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let conn = fresh_db();
        initialize_schema(&conn).unwrap();

        let broken = Migration {
            version: CURRENT_VERSION + 1,
            description: "broken",
            statements: &["CREATE TABLE half_done (id INTEGER)", "NOT VALID SQL"],
        };
        let err = apply_migration(&conn, &broken).unwrap_err();

        assert!(err.to_string().contains("migration 2 failed"));
        assert!(!has_object(&conn, "table", "half_done"));
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
    }
}
