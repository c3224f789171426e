// Store row types and query helpers
// Status codes and the RecordQueueItems layout are owned by the recording
// application; everything downstream of this file works with typed rows.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::constants::{QUEUE_TABLE, STORE_TIMESTAMP_FORMAT};
use crate::error::Result;

// ----- Status mapping -----

/// Recording status as stored in the Status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Queued,
    Recording,
    Complete,
    Partial,
    Failed,
    Other(i64),
}

impl RecordStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => RecordStatus::Queued,
            1 => RecordStatus::Recording,
            2 => RecordStatus::Complete,
            3 => RecordStatus::Partial,
            4 => RecordStatus::Failed,
            other => RecordStatus::Other(other),
        }
    }

    pub fn to_code(self) -> i64 {
        match self {
            RecordStatus::Queued => 0,
            RecordStatus::Recording => 1,
            RecordStatus::Complete => 2,
            RecordStatus::Partial => 3,
            RecordStatus::Failed => 4,
            RecordStatus::Other(code) => code,
        }
    }

    /// Rows whose Rank participates in the current queue ordering.
    pub fn in_active_queue(self) -> bool {
        matches!(self, RecordStatus::Queued | RecordStatus::Recording)
    }
}

// ----- Rows -----

/// One row of the recording queue table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingRecord {
    pub id: i64,
    pub title: String,
    pub series_title: Option<String>,
    pub season: Option<i64>,
    pub episode: Option<i64>,
    pub status: RecordStatus,
    pub rank: Option<f64>,
    /// None when the stored Updated text does not parse.
    pub updated_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl RecordingRecord {
    /// A record with no season and no episode number is movie-like.
    pub fn is_movie(&self) -> bool {
        self.season.is_none() && self.episode.is_none()
    }
}

/// Snapshot row of the active queue (queued or currently recording).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub title: String,
    pub series_title: Option<String>,
    pub rank: f64,
}

/// One field change applied on commit: the record takes `status` and `rank`,
/// its error is cleared, and its Queued/Updated stamps are refreshed.
#[derive(Debug, Clone)]
pub struct RecordUpdate {
    pub id: i64,
    pub status: RecordStatus,
    pub rank: f64,
}

/// Parse a store TEXT timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
pub fn parse_store_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, STORE_TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

// ----- Queries -----

/// Read every row of the queue table.
pub fn read_all_records(conn: &Connection) -> Result<Vec<RecordingRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT ID, Name, SeriesTitle, Season, EpisodeNumber, Status, Rank, Updated, Error
         FROM {} ORDER BY ID",
        QUEUE_TABLE
    ))?;

    let records = stmt
        .query_map([], |row| {
            Ok(RecordingRecord {
                id: row.get(0)?,
                title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                series_title: row.get(2)?,
                season: row.get::<_, Option<f64>>(3)?.map(|v| v as i64),
                episode: row.get::<_, Option<f64>>(4)?.map(|v| v as i64),
                status: RecordStatus::from_code(row.get(5)?),
                rank: row.get(6)?,
                updated_at: row
                    .get::<_, Option<String>>(7)?
                    .as_deref()
                    .and_then(parse_store_timestamp),
                error: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Read the active queue (statuses with a live Rank), ordered by Rank.
pub fn read_active_queue(conn: &Connection) -> Result<Vec<QueueEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT ID, Name, SeriesTitle, COALESCE(Rank, 0)
         FROM {} WHERE Status IN (?1, ?2) ORDER BY Rank ASC",
        QUEUE_TABLE
    ))?;

    let entries = stmt
        .query_map(
            params![
                RecordStatus::Queued.to_code(),
                RecordStatus::Recording.to_code()
            ],
            |row| {
                Ok(QueueEntry {
                    id: row.get(0)?,
                    title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    series_title: row.get(2)?,
                    rank: row.get(3)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Apply all updates inside one transaction. Any failure rolls the whole
/// batch back. Returns the number of rows changed.
pub fn apply_updates(
    conn: &mut Connection,
    updates: &[RecordUpdate],
    now: DateTime<Utc>,
) -> Result<usize> {
    let stamp = now.format(STORE_TIMESTAMP_FORMAT).to_string();
    let tx = conn.transaction()?;
    let mut changed = 0;
    {
        let mut stmt = tx.prepare(&format!(
            "UPDATE {} SET Status = ?1, Rank = ?2, Error = NULL, Queued = ?3, Updated = ?3
             WHERE ID = ?4",
            QUEUE_TABLE
        ))?;
        for update in updates {
            log::debug!(
                "UPDATE {} SET Status={}, Rank={}, Error=NULL, Queued='{}', Updated='{}' WHERE ID={}",
                QUEUE_TABLE,
                update.status.to_code(),
                update.rank,
                stamp,
                stamp,
                update.id
            );
            changed += stmt.execute(params![update.status.to_code(), update.rank, stamp, update.id])?;
        }
    }
    tx.commit()?;
    Ok(changed)
}

// ----- Inspection (read-only) -----

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub col_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// List every table in the store.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let tables = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tables)
}

/// Column metadata for one table.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", escape_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                cid: row.get(0)?,
                name: row.get(1)?,
                col_type: row.get(2)?,
                not_null: row.get::<_, i64>(3)? != 0,
                default_value: match row.get_ref(4)? {
                    ValueRef::Null => None,
                    value => Some(value_to_display(value)),
                },
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// First `limit` rows of a table, rendered as display strings.
pub fn sample_rows(
    conn: &Connection,
    table: &str,
    limit: usize,
) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM \"{}\" LIMIT {}",
        escape_ident(table),
        limit
    ))?;
    let headers: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(headers.len());
        for i in 0..headers.len() {
            values.push(value_to_display(row.get_ref(i)?));
        }
        out.push(values);
    }

    Ok((headers, out))
}

fn escape_ident(ident: &str) -> String {
    ident.replace('"', "\"\"")
}

fn value_to_display(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE RecordQueueItems (
                ID INTEGER PRIMARY KEY,
                Name TEXT,
                SeriesTitle TEXT,
                Season REAL,
                EpisodeNumber REAL,
                Status INTEGER,
                Rank REAL,
                Updated TEXT,
                Error TEXT,
                Queued TEXT
            );
            INSERT INTO RecordQueueItems VALUES
                (1, 'Episode 1', 'The Test Show', 1.0, 1.0, 0, 1.0, '2024-06-12 08:00:00', NULL, '2024-06-12 08:00:00'),
                (2, 'Test Movie One', NULL, NULL, NULL, 1, 2.0, '2024-06-12 09:00:00', NULL, '2024-06-12 09:00:00'),
                (3, 'Episode 2', 'The Test Show', 1.0, 2.0, 4, -1.0, '2024-06-12 10:00:00', 'Failed', '2024-06-12 10:00:00'),
                (4, 'Broken Stamp', NULL, NULL, NULL, 4, -1.0, 'not-a-date', 'Failed', NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_status_code_mapping_round_trips() {
        for code in [0, 1, 2, 3, 4, 9] {
            assert_eq!(RecordStatus::from_code(code).to_code(), code);
        }
        assert_eq!(RecordStatus::from_code(0), RecordStatus::Queued);
        assert_eq!(RecordStatus::from_code(3), RecordStatus::Partial);
        assert_eq!(RecordStatus::from_code(4), RecordStatus::Failed);
        assert!(RecordStatus::Queued.in_active_queue());
        assert!(RecordStatus::Recording.in_active_queue());
        assert!(!RecordStatus::Failed.in_active_queue());
    }

    #[test]
    fn test_read_all_records_types() {
        let conn = open_seeded();
        let records = read_all_records(&conn).unwrap();
        assert_eq!(records.len(), 4);

        let ep = &records[0];
        assert_eq!(ep.season, Some(1));
        assert_eq!(ep.episode, Some(1));
        assert!(!ep.is_movie());
        assert_eq!(
            ep.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 12, 8, 0, 0).unwrap())
        );

        let movie = &records[1];
        assert!(movie.is_movie());
        assert_eq!(movie.status, RecordStatus::Recording);

        // Unparseable Updated text maps to None rather than an error.
        assert_eq!(records[3].updated_at, None);
    }

    #[test]
    fn test_active_queue_is_rank_ordered() {
        let conn = open_seeded();
        let queue = read_active_queue(&conn).unwrap();
        let ids: Vec<i64> = queue.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2], "failed rows must not appear in the queue");
        assert!(queue[0].rank < queue[1].rank);
    }

    #[test]
    fn test_apply_updates_transitions_and_clears_error() {
        let mut conn = open_seeded();
        let now = Utc.with_ymd_and_hms(2024, 6, 13, 12, 0, 0).unwrap();
        let changed = apply_updates(
            &mut conn,
            &[RecordUpdate {
                id: 3,
                status: RecordStatus::Queued,
                rank: 3.0,
            }],
            now,
        )
        .unwrap();
        assert_eq!(changed, 1);

        let (status, rank, error, queued): (i64, f64, Option<String>, String) = conn
            .query_row(
                "SELECT Status, Rank, Error, Queued FROM RecordQueueItems WHERE ID = 3",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(status, 0);
        assert_eq!(rank, 3.0);
        assert_eq!(error, None);
        assert_eq!(queued, "2024-06-13 12:00:00");
    }

    #[test]
    fn test_inspect_helpers() {
        let conn = open_seeded();
        let tables = list_tables(&conn).unwrap();
        assert_eq!(tables, vec!["RecordQueueItems".to_string()]);

        let columns = table_columns(&conn, "RecordQueueItems").unwrap();
        assert_eq!(columns.len(), 10);
        assert_eq!(columns[0].name, "ID");
        assert!(columns[0].primary_key);

        let (headers, rows) = sample_rows(&conn, "RecordQueueItems", 2).unwrap();
        assert_eq!(headers[1], "Name");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "Episode 1");
        assert_eq!(rows[1][2], "NULL");
    }
}
