//! Persistent location cache backed by SQLite.
//!
//! Maps raw location strings to geocoded coordinates. Keys are not
//! normalized, rows never expire, and there is no uniqueness constraint:
//! two concurrent misses on the same string may both insert a row, in which
//! case the oldest row wins on lookup.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use crate::domain::Coord;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS fuel_price (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    price REAL
)";

/// Error type for cache operations.
#[derive(Debug)]
pub enum CacheError {
    Sqlite(rusqlite::Error),
    /// The blocking task running a statement panicked or was cancelled.
    Task(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Sqlite(e) => write!(f, "Location cache error: {}", e),
            CacheError::Task(e) => write!(f, "Location cache task failed: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<rusqlite::Error> for CacheError {
    fn from(e: rusqlite::Error) -> Self {
        CacheError::Sqlite(e)
    }
}

/// A cached geocoding result.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub location: String,
    pub coord: Coord,
    pub price: Option<f64>,
}

/// Location cache over a single SQLite connection.
///
/// The connection lock is held for one statement at a time, never across an
/// external call.
pub struct LocationCache {
    conn: Mutex<Connection>,
}

impl LocationCache {
    /// Opens (or creates) the cache database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory cache.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Looks up an exact string match.
    ///
    /// Rows without coordinates do not count as hits.
    pub fn get(&self, location: &str) -> Result<Option<CacheEntry>, CacheError> {
        let conn = self.conn.lock();
        let entry = conn
            .query_row(
                "SELECT latitude, longitude, price FROM fuel_price
                 WHERE location = ?1 AND latitude IS NOT NULL AND longitude IS NOT NULL
                 ORDER BY id LIMIT 1",
                params![location],
                |row| {
                    Ok(CacheEntry {
                        location: location.to_string(),
                        coord: Coord::new(row.get(0)?, row.get(1)?),
                        price: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Appends a row for `location`.
    pub fn insert(&self, location: &str, coord: Coord, price: Option<f64>) -> Result<(), CacheError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO fuel_price (location, latitude, longitude, price) VALUES (?1, ?2, ?3, ?4)",
            params![location, coord.latitude, coord.longitude, price],
        )?;
        debug!("Cached coordinates {} for {:?}", coord, location);
        Ok(())
    }

    /// Number of rows in the cache, duplicates included.
    pub fn len(&self) -> Result<usize, CacheError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM fuel_price", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    #[cfg(test)]
    pub(crate) fn lock_connection(&self) -> parking_lot::MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}
