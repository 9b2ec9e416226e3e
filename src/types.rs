// src/types.rs
use serde::Deserialize;

/// One governance body as listed in the registry. Re-fetched every cycle;
/// the registry, not the monitor, is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dao {
    pub address: String,
    pub name: String,
    pub slug: String,
}

/// Observable state of one governor at one poll instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernorSnapshot {
    pub dao: Dao,
    pub proposal_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProposalMeta {
    pub title: String,
    #[serde(default)]
    pub description_link: String,
}

/// One element of a governor's append-only proposal sequence.
/// `meta` is `None` when the detail fetch failed for this proposal; the
/// proposal still counts toward the delta, only its rendered line degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// 1-based position in the governor's sequence. Embedded in the
    /// notification link, so ordering matters.
    pub index: u64,
    pub address: String,
    pub meta: Option<ProposalMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Scalar proposal-count crossing: `current - previous >= threshold`.
    Threshold { previous: u64, current: u64 },
    /// Set-membership addition on proposal keys.
    SetAdd,
}

/// At most one per governor per cycle; absent entirely on a zero or
/// negative delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEvent {
    pub dao: Dao,
    pub kind: DiffKind,
    pub new_proposals: Vec<Proposal>,
}
