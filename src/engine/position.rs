// Queue position computation
// One ordering-key scheme throughout: fractional f64 ranks. Existing rows
// are never renumbered; new keys land strictly before, between, or after
// them. Recomputing on the same inputs yields the same keys.

use crate::db::store::QueueEntry;
use crate::engine::filter::title_matches;
use crate::error::{RequeueError, Result};

/// Where re-queued items are inserted relative to the active queue.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertionSpec {
    Beginning,
    End,
    /// Immediately after the last (highest-rank) queue row matching the
    /// anchor title.
    After(String),
}

/// Compute ordering keys for `count` new entries, in selection order
/// (first selected lands frontmost within the inserted block).
///
/// The anchor of an `After` spec is validated even when the selection is
/// empty, so a bad anchor always surfaces instead of producing an empty
/// but "successful" plan.
pub fn compute(count: usize, queue: &[QueueEntry], spec: &InsertionSpec) -> Result<Vec<f64>> {
    match spec {
        InsertionSpec::Beginning => {
            let base = queue
                .iter()
                .map(|q| q.rank)
                .reduce(f64::min)
                .unwrap_or((count + 1) as f64);
            Ok((0..count).map(|i| base - (count - i) as f64).collect())
        }
        InsertionSpec::End => {
            let base = queue.iter().map(|q| q.rank).reduce(f64::max).unwrap_or(0.0);
            Ok((0..count).map(|i| base + (i + 1) as f64).collect())
        }
        InsertionSpec::After(anchor) => {
            let anchor_rank = queue
                .iter()
                .filter(|q| title_matches(anchor, &q.title, q.series_title.as_deref()))
                .map(|q| q.rank)
                .reduce(f64::max)
                .ok_or_else(|| RequeueError::AnchorNotFound(anchor.clone()))?;

            let next = queue
                .iter()
                .map(|q| q.rank)
                .filter(|r| *r > anchor_rank)
                .reduce(f64::min);

            let step = match next {
                // Subdivide the gap to the successor so keys stay strictly
                // between anchor and successor.
                Some(next) => (next - anchor_rank) / (count as f64 + 1.0),
                None => 1.0,
            };
            Ok((0..count).map(|i| anchor_rank + step * (i + 1) as f64).collect())
        }
    }
}
