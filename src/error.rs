// src/error.rs
//
// Failure scopes, smallest first: proposal (DetailUnavailable), governor
// (SourceReadError), cycle (RegistryUnavailable). A failure never escapes
// its scope to abort sibling work; none of these is fatal to the process.
use thiserror::Error;

/// Registry fetch/parse failed. The whole cycle is skipped.
#[derive(Debug, Error)]
#[error("registry unavailable: {reason}")]
pub struct RegistryUnavailable {
    pub reason: String,
}

impl RegistryUnavailable {
    pub fn new(reason: impl std::fmt::Display) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

/// Reading one governor failed (RPC error, bad payload, per-source
/// timeout). That governor is skipped this cycle, its baseline untouched.
#[derive(Debug, Error)]
#[error("reading governor {governor}: {reason}")]
pub struct SourceReadError {
    pub governor: String,
    pub reason: String,
}

impl SourceReadError {
    pub fn new(governor: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            governor: governor.into(),
            reason: reason.to_string(),
        }
    }
}

/// Detail record for one proposal could not be fetched (not found,
/// uninitialized account, transport error). Per-proposal only: the caller
/// keeps the proposal with `meta: None` and continues the batch.
#[derive(Debug, Error)]
#[error("proposal {address} unavailable: {reason}")]
pub struct DetailUnavailable {
    pub address: String,
    pub reason: String,
}

impl DetailUnavailable {
    pub fn new(address: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}
