//! Greedy earliest-first deduplication of transition candidates.

use tstudio_models::Transition;

/// Keep the earliest transition of every cluster closer than `min_gap`.
///
/// Candidates are sorted by timestamp; one is accepted only when it lies
/// strictly more than `min_gap` seconds after the last accepted one. Dropped
/// candidates are discarded, not merged.
pub fn deduplicate(mut candidates: Vec<Transition>, min_gap: f64) -> Vec<Transition> {
    candidates.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut last_accepted: Option<f64> = None;
    candidates
        .into_iter()
        .filter(|t| {
            let keep = match last_accepted {
                Some(last) => t.timestamp - last > min_gap,
                None => true,
            };
            if keep {
                last_accepted = Some(t.timestamp);
            }
            keep
        })
        .collect()
}
