// Mutation plan assembly
// Pure pairing of selection and positions; the store is never consulted.

use serde::Serialize;

use crate::db::store::RecordStatus;
use crate::engine::select::Selection;

/// Whether a run only reports or actually writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Dry,
    Real,
}

/// One planned change: the record becomes Queued at `new_rank`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub record_id: i64,
    pub title: String,
    pub series_title: Option<String>,
    pub season: Option<i64>,
    pub episode: Option<i64>,
    pub old_rank: Option<f64>,
    pub new_rank: f64,
}

/// The ordered change list for one run, plus reporting counts.
#[derive(Debug, Clone)]
pub struct MutationPlan {
    pub entries: Vec<PlanEntry>,
    pub candidates_scanned: usize,
    pub matched: usize,
    pub mode: RunMode,
}

impl MutationPlan {
    /// Every entry transitions to this status.
    pub const NEW_STATUS: RecordStatus = RecordStatus::Queued;

    pub fn selected(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pair each selected record with its computed position.
pub fn build(selection: &Selection, positions: &[f64], mode: RunMode) -> MutationPlan {
    debug_assert_eq!(selection.records.len(), positions.len());

    let entries = selection
        .records
        .iter()
        .zip(positions)
        .map(|(record, &new_rank)| PlanEntry {
            record_id: record.id,
            title: record.title.clone(),
            series_title: record.series_title.clone(),
            season: record.season,
            episode: record.episode,
            old_rank: record.rank,
            new_rank,
        })
        .collect();

    MutationPlan {
        entries,
        candidates_scanned: selection.candidates_scanned,
        matched: selection.matched,
        mode,
    }
}
