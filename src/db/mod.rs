// Record store adapter
// The database belongs to the recording application; this module opens it,
// reads snapshots, and copies it aside for backups. No schema pragmas are
// set beyond a busy timeout -- the file is not ours to reconfigure.

pub mod store;

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use rusqlite::{Connection, OpenFlags};

use crate::constants::{BACKUP_STAMP_FORMAT, DB_BUSY_TIMEOUT_MS};
use crate::error::{RequeueError, Result};

/// Open the store for a real (writing) run.
pub fn open_store(db_path: &Path) -> Result<Connection> {
    ensure_store_exists(db_path)?;
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_millis(DB_BUSY_TIMEOUT_MS as u64))?;
    Ok(conn)
}

/// Open the store read-only. Dry runs and inspection go through here so
/// writes are impossible at the connection level.
pub fn open_store_read_only(db_path: &Path) -> Result<Connection> {
    ensure_store_exists(db_path)?;
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(db_path, flags)?;
    conn.busy_timeout(std::time::Duration::from_millis(DB_BUSY_TIMEOUT_MS as u64))?;
    Ok(conn)
}

fn ensure_store_exists(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        return Err(RequeueError::StoreNotFound(db_path.display().to_string()));
    }
    Ok(())
}

/// Copy the store file to `<name>.bak-<YYYYMMDD-HHMMSS>` in the same
/// directory and return the backup path.
pub fn backup_store(db_path: &Path) -> Result<PathBuf> {
    let file_name = db_path
        .file_name()
        .ok_or_else(|| RequeueError::Backup(format!("no file name in {}", db_path.display())))?;
    let stamp = Utc::now().format(BACKUP_STAMP_FORMAT);
    let backup_name = format!("{}.bak-{}", file_name.to_string_lossy(), stamp);
    let backup_path = db_path.with_file_name(backup_name);

    std::fs::copy(db_path, &backup_path).map_err(|e| {
        RequeueError::Backup(format!(
            "copying {} to {}: {}",
            db_path.display(),
            backup_path.display(),
            e
        ))
    })?;

    info!("Store backed up to {}", backup_path.display());
    Ok(backup_path)
}
