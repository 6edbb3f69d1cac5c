//! Dedup/merge engine.

use std::collections::HashSet;

use venturepulse_core::SignalItem;

/// Decide which items of a batch should be inserted.
///
/// Returns exactly the subset of `batch` whose external identifiers are not
/// in `existing_ids`, in original order. When an identifier repeats within
/// the batch only the first occurrence survives (stable, first-wins).
/// Items whose identifier is already persisted are keeps: not re-inserted,
/// not updated.
///
/// The same rule serves both pipelines — a trend refresh reconciles against
/// the source's persisted identifiers, while the validation fan-out passes an
/// empty `existing_ids` and dedups purely in memory.
#[must_use]
pub fn reconcile(batch: Vec<SignalItem>, existing_ids: &HashSet<String>) -> Vec<SignalItem> {
    let mut seen: HashSet<String> = HashSet::new();

    batch
        .into_iter()
        .filter(|item| {
            !existing_ids.contains(&item.external_id) && seen.insert(item.external_id.clone())
        })
        .collect()
}
