// Candidate selection
// Pure over the store snapshot: filter, order deterministically, truncate.

use log::debug;

use crate::db::store::RecordingRecord;
use crate::engine::filter::{self, FilterCriteria};
use crate::error::{RequeueError, Result};

/// Outcome of one selection pass, with the counts used for reporting.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Survivors in their final deterministic order, after the limit.
    pub records: Vec<RecordingRecord>,
    /// Rows whose status made them structural candidates.
    pub candidates_scanned: usize,
    /// Survivors before the limit was applied.
    pub matched: usize,
}

/// Select the records to re-queue. Refuses to run without any restricting
/// filter unless mass selection was explicitly allowed.
pub fn select(
    records: &[RecordingRecord],
    criteria: &FilterCriteria,
    limit: Option<usize>,
) -> Result<Selection> {
    if !criteria.has_scope() {
        return Err(RequeueError::NoScope);
    }

    let candidates_scanned = records
        .iter()
        .filter(|r| criteria.eligible_statuses().contains(&r.status))
        .count();

    let mut survivors: Vec<RecordingRecord> = records
        .iter()
        .filter(|r| filter::eligible(r, criteria))
        .cloned()
        .collect();

    // Oldest first, ties broken by ID, so limit truncation is reproducible.
    // Rows with no parseable timestamp sort first.
    survivors.sort_by_key(|r| (r.updated_at, r.id));
    let matched = survivors.len();

    debug!("scanned {} candidate(s), {} matched", candidates_scanned, matched);

    if let Some(limit) = limit {
        if survivors.len() > limit {
            debug!("limiting selection from {} to {} item(s)", survivors.len(), limit);
            survivors.truncate(limit);
        }
    }

    Ok(Selection {
        records: survivors,
        candidates_scanned,
        matched,
    })
}
