//! `SQLite` schema definitions for fastfoodz.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the snapshots table.
pub const CREATE_SNAPSHOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    request_date TEXT NOT NULL,
    region_latitude REAL NOT NULL,
    region_longitude REAL NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on `request_date` for picking the current snapshot.
pub const CREATE_REQUEST_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_snapshots_request_date ON snapshots(request_date DESC)
";

/// SQL statement to create the businesses table.
///
/// Rows belong to exactly one snapshot and go away with it. List-valued
/// fields are stored as JSON text.
pub const CREATE_BUSINESSES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS businesses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    snapshot_id INTEGER NOT NULL REFERENCES snapshots(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    business_id TEXT,
    alias TEXT,
    name TEXT,
    image_url TEXT,
    url TEXT,
    phone TEXT,
    display_phone TEXT,
    price TEXT,
    is_closed INTEGER,
    rating REAL,
    review_count INTEGER,
    distance REAL,
    latitude REAL,
    longitude REAL,
    location_json TEXT,
    categories_json TEXT NOT NULL DEFAULT '[]',
    transactions_json TEXT NOT NULL DEFAULT '[]'
)
";

/// SQL statement to create an index on `snapshot_id` for loading a snapshot.
pub const CREATE_SNAPSHOT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_businesses_snapshot ON businesses(snapshot_id, position)
";

/// SQL statement to create an index on `business_id` for detail lookups.
pub const CREATE_BUSINESS_ID_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_businesses_business_id ON businesses(business_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_SNAPSHOTS_TABLE,
    CREATE_REQUEST_DATE_INDEX,
    CREATE_BUSINESSES_TABLE,
    CREATE_SNAPSHOT_INDEX,
    CREATE_BUSINESS_ID_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_businesses_cascade_with_snapshot() {
        assert!(CREATE_BUSINESSES_TABLE.contains("REFERENCES snapshots(id) ON DELETE CASCADE"));
        assert!(CREATE_BUSINESSES_TABLE.contains("position INTEGER NOT NULL"));
    }

    #[test]
    fn test_snapshots_table_columns() {
        assert!(CREATE_SNAPSHOTS_TABLE.contains("request_date TEXT NOT NULL"));
        assert!(CREATE_SNAPSHOTS_TABLE.contains("region_latitude REAL NOT NULL"));
        assert!(CREATE_SNAPSHOTS_TABLE.contains("region_longitude REAL NOT NULL"));
    }
}
