//! Vkey witness merging.

use std::collections::BTreeSet;

/// Union of two witness sets, keyed by canonical (lower-case hex) encoding.
/// Order carries no meaning; the result is sorted.
pub fn merge_signatures(existing: &[String], new: &[String]) -> Vec<String> {
    existing
        .iter()
        .chain(new)
        .map(|w| w.trim().to_ascii_lowercase())
        .filter(|w| !w.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
