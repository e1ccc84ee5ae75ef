use std::{
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Local};
use rusqlite::Connection;

use crate::{
    config,
    storage::{error::StorageError, schema},
};

pub type SecondsSinceUnix = i64;

/// Owns the lazily opened connection slot. Every storage component goes
/// through [`Database::with_conn`], which opens the underlying SQLite
/// database (creating tables on first run) the first time anything needs
/// it. The mutex makes the lazy open single-flight: a second caller
/// blocks until the first has either opened the database or failed, and
/// a failed open leaves the slot empty so a later call can retry.
pub struct Database {
    config: config::Database,
    conn: Mutex<Option<Connection>>,
}

fn open_connection(config: &config::Database) -> anyhow::Result<Connection> {
    let conn = if config.in_memory {
        Connection::open_in_memory()?
    } else {
        let path = config
            .path
            .as_ref()
            .ok_or_else(|| anyhow!("database is not in-memory but no path is configured"))?;
        Connection::open(path).with_context(|| format!("failed to open database at {}", path.display()))?
    };
    schema::init(&conn)?;
    Ok(conn)
}

impl Database {
    /// Cheap; does not touch the disk until the first operation.
    pub fn new(config: config::Database) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
        }
    }

    /// Opens the database if it is not open yet. Idempotent.
    pub fn open(&self) -> Result<(), StorageError> {
        self.ensure_ready()
    }

    pub fn ensure_ready(&self) -> Result<(), StorageError> {
        self.with_conn(|_| Ok(()))
    }

    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut slot = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            let conn = open_connection(&self.config).map_err(StorageError::Unavailable)?;
            log::info!("database opened");
            *slot = Some(conn);
        }
        // slot was filled above
        let conn = slot.as_ref().expect("connection slot is filled");
        f(conn)
    }
}

pub fn now_secs() -> anyhow::Result<SecondsSinceUnix> {
    system_time_to_i64(SystemTime::now())
}

/// converts time to number of seconds since unix_epoch
pub fn system_time_to_i64(time: SystemTime) -> anyhow::Result<SecondsSinceUnix> {
    i64::try_from(
        time.duration_since(UNIX_EPOCH)
            .with_context(|| "failed to get unix timestamp")?
            .as_secs(),
    )
    .with_context(|| "failed to fit unix timestamp into i64")
}

/// converts number of seconds since unix epoch to local date time
pub fn i64_seconds_to_local_time(since_unix: i64) -> anyhow::Result<DateTime<Local>> {
    let datetime = DateTime::from_timestamp_secs(since_unix).ok_or(anyhow!(
        "failed to convert {since_unix} s timestamp to datetime"
    ))?;

    Ok(DateTime::from(datetime))
}
