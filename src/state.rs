// src/state.rs
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Last successfully processed observation of one governor: either the
/// proposal count (threshold strategy) or the set of seen proposal keys
/// (set-add strategy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    Count(u64),
    Keys(HashSet<String>),
}

#[derive(Debug)]
struct Entry {
    baseline: Baseline,
    last_cycle: u64,
}

/// Exclusive owner of per-governor baselines. Cross-component data is
/// passed out by value; callers never hold a reference into the store.
///
/// `advance` is keyed by cycle number and applies at most once per
/// governor per cycle, so a re-entered cycle cannot double-count. The
/// lock is never held across an await.
#[derive(Debug, Default)]
pub struct BaselineStore {
    inner: Mutex<HashMap<String, Entry>>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded store for tests and replay tooling. Production code never
    /// mutates baselines implicitly; this is the only way to pre-load one.
    pub fn with_seed(seed: impl IntoIterator<Item = (String, Baseline)>) -> Self {
        let map = seed
            .into_iter()
            .map(|(governor, baseline)| {
                (
                    governor,
                    Entry {
                        baseline,
                        last_cycle: 0,
                    },
                )
            })
            .collect();
        Self {
            inner: Mutex::new(map),
        }
    }

    pub fn get(&self, governor: &str) -> Option<Baseline> {
        let map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.get(governor).map(|e| e.baseline.clone())
    }

    /// Record the new baseline for `governor`. Returns false (and leaves
    /// state untouched) if this cycle already advanced it.
    pub fn advance(&self, governor: &str, cycle: u64, next: Baseline) -> bool {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        match map.get_mut(governor) {
            Some(entry) if entry.last_cycle == cycle => false,
            Some(entry) => {
                entry.baseline = next;
                entry.last_cycle = cycle;
                true
            }
            None => {
                map.insert(
                    governor.to_string(),
                    Entry {
                        baseline: next,
                        last_cycle: cycle,
                    },
                );
                true
            }
        }
    }
}
