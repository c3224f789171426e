// Requeue Constants
// Store layout values mirror what the recording application writes; do not
// change them without checking against a live database.

/// Default location of the recording queue database.
pub const DEFAULT_DB_PATH: &str = r"C:\ProgramData\MediaMall\Recording\recording.db";

/// Table holding one row per queued/recorded item.
pub const QUEUE_TABLE: &str = "RecordQueueItems";

/// Timestamp format used by the store's TEXT datetime columns (UTC).
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Suffix stamp appended to backup file names.
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Per-connection busy timeout in milliseconds.
pub const DB_BUSY_TIMEOUT_MS: u32 = 5000;

/// Process image names owned by the recording application.
pub const PROCESS_NAMES: [&str; 5] = [
    "PlayOn",
    "MediaMallServer",
    "MediaMall",
    "SettingsManager",
    "POC-Downloader",
];

/// The server binary must come up first on restart.
pub const SERVER_PROCESS: &str = "MediaMallServer";

/// Seconds to wait for the server before starting the remaining binaries.
pub const SERVER_STARTUP_WAIT_SECS: u64 = 10;

/// Rows shown per table by the inspect command.
pub const INSPECT_SAMPLE_ROWS: usize = 5;
