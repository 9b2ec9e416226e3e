// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod diff;
pub mod error;
pub mod fetcher;
pub mod ledger;
pub mod notify;
pub mod poller;
pub mod registry;
pub mod state;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::config::{DiffStrategy, MonitorConfig};
pub use crate::notify::{NotificationPayload, Notifier, NotifierMux};
pub use crate::poller::Poller;
pub use crate::state::{Baseline, BaselineStore};
pub use crate::types::{Dao, DiffEvent, DiffKind, Proposal, ProposalMeta};
