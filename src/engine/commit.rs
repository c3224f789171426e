// Safety guard and commit path
// A real commit is: validate, back up, then one transaction. An empty plan
// never touches the store, and a failed backup aborts before any write.

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use rusqlite::Connection;

use crate::db::{self, store};
use crate::engine::plan::{MutationPlan, RunMode};
use crate::error::Result;

#[derive(Debug)]
pub struct CommitOutcome {
    pub rows_changed: usize,
    pub backup_path: Option<PathBuf>,
}

/// Apply a plan to the store.
pub fn commit(
    conn: &mut Connection,
    store_path: &Path,
    plan: &MutationPlan,
    backup_enabled: bool,
) -> Result<CommitOutcome> {
    debug_assert_eq!(plan.mode, RunMode::Real, "dry plans are never committed");

    if plan.is_empty() {
        info!("Nothing to do; store untouched");
        return Ok(CommitOutcome {
            rows_changed: 0,
            backup_path: None,
        });
    }

    let backup_path = if backup_enabled {
        Some(db::backup_store(store_path)?)
    } else {
        warn!("Backup disabled; the store will be modified in place");
        None
    };

    let updates: Vec<store::RecordUpdate> = plan
        .entries
        .iter()
        .map(|entry| store::RecordUpdate {
            id: entry.record_id,
            status: MutationPlan::NEW_STATUS,
            rank: entry.new_rank,
        })
        .collect();

    let rows_changed = store::apply_updates(conn, &updates, Utc::now())?;
    info!("Promoted {} row(s)", rows_changed);

    Ok(CommitOutcome {
        rows_changed,
        backup_path,
    })
}
