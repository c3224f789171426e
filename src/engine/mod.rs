// Requeue decision engine
// selection -> positioning -> plan, all pure over explicit snapshots.
// The only store-touching path is commit().

pub mod commit;
pub mod filter;
pub mod plan;
pub mod position;
pub mod select;


use crate::db::store::{QueueEntry, RecordingRecord};
use crate::error::Result;

use self::filter::FilterCriteria;
use self::plan::{MutationPlan, RunMode};
use self::position::InsertionSpec;

/// Build the mutation plan for one run. Computing it twice on the same
/// snapshots and criteria yields the same plan.
pub fn plan_requeue(
    records: &[RecordingRecord],
    queue: &[QueueEntry],
    criteria: &FilterCriteria,
    insertion: &InsertionSpec,
    limit: Option<usize>,
    mode: RunMode,
) -> Result<MutationPlan> {
    let selection = select::select(records, criteria, limit)?;
    let positions = position::compute(selection.records.len(), queue, insertion)?;
    Ok(plan::build(&selection, &positions, mode))
}
