// src/diff.rs
//
// Pure diff logic, no I/O. Both strategies are increase-only: a shrink
// of the upstream count (stale or corrected registry data) is a benign
// zero-delta, never a negative event.
use std::collections::HashSet;

/// Scalar threshold crossing, increase-only. Returns `(previous, current)`
/// iff the count actually grew and `current - previous >= threshold`.
/// Checked subtraction keeps `current < previous` firmly in the no-event
/// branch.
pub fn threshold_diff(previous: u64, current: u64, threshold: u64) -> Option<(u64, u64)> {
    match current.checked_sub(previous) {
        Some(delta) if delta > 0 && delta >= threshold => Some((previous, current)),
        _ => None,
    }
}

/// Set-membership addition on proposal keys. Equality is by key; the
/// result preserves `current`'s iteration order because the key's
/// position is what ends up in the notification link.
pub fn set_added(previous: &HashSet<String>, current: &[String]) -> Vec<String> {
    set_added_indexed(previous, current)
        .into_iter()
        .map(|(_, k)| k)
        .collect()
}

/// Like `set_added`, but pairs each new key with its 1-based position
/// in `current` (the proposal index).
pub fn set_added_indexed(previous: &HashSet<String>, current: &[String]) -> Vec<(u64, String)> {
    current
        .iter()
        .enumerate()
        .filter(|(_, k)| !previous.contains(*k))
        .map(|(i, k)| (i as u64 + 1, k.clone()))
        .collect()
}
