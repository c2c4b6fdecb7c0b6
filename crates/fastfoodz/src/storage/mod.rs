//! Storage layer for fastfoodz.
//!
//! This module provides `SQLite`-based persistent storage for search
//! snapshots: the bounded, most-recent-first history of search responses.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Business, Coordinate, Location, SearchResponse};

/// Columns selected for every business row, in `row_to_business` order.
const BUSINESS_COLUMNS: &str = "business_id, alias, name, image_url, url, phone, display_phone, \
     price, is_closed, rating, review_count, distance, latitude, longitude, \
     location_json, categories_json, transactions_json";

/// Storage engine for search snapshots.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Atomic insertion of a snapshot with all of its businesses
/// - Loading the current (most recent) snapshot
/// - Business detail lookup
/// - Pruning by count or age
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// Lightweight description of a stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    /// Snapshot id.
    pub id: i64,
    /// When the search was made.
    pub request_date: DateTime<Utc>,
    /// Centre of the searched region.
    pub region_center: Coordinate,
    /// Number of businesses in the snapshot.
    pub business_count: i64,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::OpenCache {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::OpenCache {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a snapshot and all of its businesses in one transaction.
    ///
    /// Returns the new snapshot id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing is stored
    /// in that case.
    pub fn insert_snapshot(&mut self, snapshot: &SearchResponse) -> Result<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r"
            INSERT INTO snapshots (request_date, region_latitude, region_longitude)
            VALUES (?1, ?2, ?3)
            ",
            params![
                format_timestamp(snapshot.request_date),
                snapshot.region_center.latitude,
                snapshot.region_center.longitude,
            ],
        )?;
        let snapshot_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO businesses (
                    snapshot_id, position, business_id, alias, name, image_url, url,
                    phone, display_phone, price, is_closed, rating, review_count, distance,
                    latitude, longitude, location_json, categories_json, transactions_json
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18, ?19
                )
                ",
            )?;

            for (position, business) in snapshot.businesses.iter().enumerate() {
                let position = i64::try_from(position).unwrap_or(i64::MAX);
                let location_json = business
                    .location
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                stmt.execute(params![
                    snapshot_id,
                    position,
                    business.id,
                    business.alias,
                    business.name,
                    business.image_url,
                    business.url,
                    business.phone,
                    business.display_phone,
                    business.price,
                    business.is_closed,
                    business.rating,
                    business.review_count,
                    business.distance,
                    business.coordinates.map(|c| c.latitude),
                    business.coordinates.map(|c| c.longitude),
                    location_json,
                    serde_json::to_string(&business.categories)?,
                    serde_json::to_string(&business.transactions)?,
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            "Stored snapshot {} with {} businesses",
            snapshot_id,
            snapshot.businesses.len()
        );
        Ok(snapshot_id)
    }

    /// Get the current snapshot: the most recent by request date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn latest_snapshot(&self) -> Result<Option<SearchResponse>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM snapshots ORDER BY request_date DESC, id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => self.get_snapshot(id),
            None => Ok(None),
        }
    }

    /// Get a snapshot with all of its businesses.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_snapshot(&self, id: i64) -> Result<Option<SearchResponse>> {
        let header = self
            .conn
            .query_row(
                r"
                SELECT id, request_date, region_latitude, region_longitude
                FROM snapshots WHERE id = ?1
                ",
                [id],
                |row| {
                    let date: String = row.get(1)?;
                    Ok((
                        row.get::<_, i64>(0)?,
                        parse_timestamp(&date),
                        Coordinate::new(row.get(2)?, row.get(3)?),
                    ))
                },
            )
            .optional()?;

        let Some((id, request_date, region_center)) = header else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE snapshot_id = ?1 ORDER BY position ASC"
        ))?;
        let businesses = stmt
            .query_map([id], Self::row_to_business)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(SearchResponse {
            id: Some(id),
            request_date,
            region_center,
            businesses,
        }))
    }

    /// List stored snapshots, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_snapshots(&self, limit: usize) -> Result<Vec<SnapshotSummary>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT s.id, s.request_date, s.region_latitude, s.region_longitude,
                   (SELECT COUNT(*) FROM businesses b WHERE b.snapshot_id = s.id)
            FROM snapshots s
            ORDER BY s.request_date DESC, s.id DESC LIMIT ?1
            ",
        )?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let summaries = stmt
            .query_map([limit_i64], |row| {
                let date: String = row.get(1)?;
                Ok(SnapshotSummary {
                    id: row.get(0)?,
                    request_date: parse_timestamp(&date),
                    region_center: Coordinate::new(row.get(2)?, row.get(3)?),
                    business_count: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    /// Find a business by upstream id in the newest snapshot that has it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_business(&self, business_id: &str) -> Result<Option<Business>> {
        let sql = format!(
            r"
            SELECT {BUSINESS_COLUMNS} FROM businesses
            JOIN snapshots ON snapshots.id = businesses.snapshot_id
            WHERE businesses.business_id = ?1
            ORDER BY snapshots.request_date DESC, snapshots.id DESC LIMIT 1
            "
        );
        let business = self
            .conn
            .query_row(&sql, [business_id], Self::row_to_business)
            .optional()?;
        Ok(business)
    }

    /// Count stored snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a snapshot and its businesses.
    ///
    /// Returns `true` if a snapshot was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM snapshots WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Delete every snapshot.
    ///
    /// Returns the number of snapshots deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear(&self) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM snapshots", [])?;
        if affected > 0 {
            info!("Cleared {} snapshots", affected);
        }
        Ok(affected)
    }

    /// Prune snapshots to keep only the most recent N.
    ///
    /// Returns the number of snapshots deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn prune_keep_recent(&self, keep_count: usize) -> Result<usize> {
        let keep_i64 = i64::try_from(keep_count).unwrap_or(i64::MAX);
        let affected = self.conn.execute(
            r"
            DELETE FROM snapshots WHERE id NOT IN (
                SELECT id FROM snapshots ORDER BY request_date DESC, id DESC LIMIT ?1
            )
            ",
            [keep_i64],
        )?;

        if affected > 0 {
            info!("Pruned {} snapshots to keep {} recent", affected, keep_count);
        }
        Ok(affected)
    }

    /// Prune snapshots older than the given age.
    ///
    /// Returns the number of snapshots deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn prune_older_than(&self, max_age: Duration) -> Result<usize> {
        let cutoff = format_timestamp(Utc::now() - max_age);

        let affected = self
            .conn
            .execute("DELETE FROM snapshots WHERE request_date < ?1", [cutoff])?;

        if affected > 0 {
            info!("Pruned {} old snapshots", affected);
        }
        Ok(affected)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_snapshots = self.count()?;
        let total_businesses: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM businesses", [], |row| row.get(0))?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(request_date), MAX(request_date) FROM snapshots",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_snapshots,
            total_businesses,
            oldest_snapshot: oldest.as_deref().map(parse_timestamp),
            newest_snapshot: newest.as_deref().map(parse_timestamp),
            db_size_bytes,
        })
    }

    /// Convert a database row to a Business struct.
    fn row_to_business(row: &Row) -> rusqlite::Result<Business> {
        let location_json: Option<String> = row.get(14)?;
        let categories_json: String = row.get(15)?;
        let transactions_json: String = row.get(16)?;

        let location = location_json.and_then(|json| {
            serde_json::from_str::<Location>(&json)
                .map_err(|e| warn!("Discarding unreadable stored location: {}", e))
                .ok()
        });
        let categories = serde_json::from_str(&categories_json).unwrap_or_else(|e| {
            warn!("Discarding unreadable stored categories: {}", e);
            Vec::new()
        });
        let transactions = serde_json::from_str(&transactions_json).unwrap_or_else(|e| {
            warn!("Discarding unreadable stored transactions: {}", e);
            Vec::new()
        });

        Ok(Business {
            id: row.get(0)?,
            alias: row.get(1)?,
            name: row.get(2)?,
            image_url: row.get(3)?,
            url: row.get(4)?,
            phone: row.get(5)?,
            display_phone: row.get(6)?,
            price: row.get(7)?,
            is_closed: row.get(8)?,
            rating: row.get(9)?,
            review_count: row.get(10)?,
            distance: row.get(11)?,
            coordinates: Coordinate::from_parts(row.get(12)?, row.get(13)?),
            location,
            categories,
            transactions,
        })
    }
}

/// Fixed-width RFC 3339 so that text order matches time order.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map_or_else(
        |_| {
            warn!("Unreadable stored timestamp: {}", value);
            DateTime::<Utc>::default()
        },
        |dt| dt.with_timezone(&Utc),
    )
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of snapshots stored.
    pub total_snapshots: i64,
    /// Number of business rows across all snapshots.
    pub total_businesses: i64,
    /// Request date of the oldest snapshot.
    pub oldest_snapshot: Option<DateTime<Utc>>,
    /// Request date of the newest snapshot.
    pub newest_snapshot: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
