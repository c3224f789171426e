// Requeue Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequeueError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store file not found: {0}")]
    StoreNotFound(String),

    #[error("No filters specified. Use at least one filter or --all.")]
    NoScope,

    #[error("Anchor title \"{0}\" not found in current queue")]
    AnchorNotFound(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Process control error: {0}")]
    ProcessControl(String),

    #[error("Invalid --since value: {0}")]
    InvalidSince(String),
}

pub type Result<T> = std::result::Result<T, RequeueError>;
