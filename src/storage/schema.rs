use anyhow::bail;
use rusqlite::Connection;

pub mod tables {
    pub const AUDIO_ASSETS: &str = "audio_assets";
    pub const IMAGE_ASSETS: &str = "image_assets";
    pub const TRACKS: &str = "tracks";

    pub const ALL_TABLES: &[&str] = &[AUDIO_ASSETS, IMAGE_ASSETS, TRACKS];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const FILE_NAME: &str = "file_name";
    pub const MIME_TYPE: &str = "mime_type";
    pub const BYTE_SIZE: &str = "byte_size";
    pub const PAYLOAD: &str = "payload";
    pub const CREATED_AT: &str = "created_at";

    pub const TITLE: &str = "title";
    pub const ARTIST: &str = "artist";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "category";
    pub const DURATION_SECS: &str = "duration_secs";
    pub const AUDIO_FILE_ID: &str = "audio_file_id";
    pub const IMAGE_FILE_ID: &str = "image_file_id";
}

pub use columns::*;
pub use tables::*;

/// Single schema generation. No migration logic beyond
/// create-if-absent; an unexpected version aborts the open.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audio_assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    byte_size INTEGER NOT NULL,
    payload BLOB NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS image_assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    byte_size INTEGER NOT NULL,
    payload BLOB NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    description TEXT,
    category TEXT NOT NULL,
    duration_secs REAL NOT NULL,
    audio_file_id INTEGER,
    image_file_id INTEGER,
    created_at INTEGER NOT NULL
);
"#;

pub fn init(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(SCHEMA)?;

    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match version {
        0 => conn.pragma_update(None, "user_version", SCHEMA_VERSION)?,
        v if v == SCHEMA_VERSION => {}
        v => bail!("unsupported schema version {v}, expected {SCHEMA_VERSION}"),
    }
    Ok(())
}
