// src/ledger.rs
//
// Read-only boundary to the governance RPC gateway. Address derivation
// and account decoding live behind the gateway; this client only speaks
// its JSON surface.
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{DetailUnavailable, SourceReadError};
use crate::types::ProposalMeta;

#[async_trait]
pub trait GovernorReader: Send + Sync {
    /// Current proposal count of one governor.
    async fn proposal_count(&self, governor: &str) -> Result<u64, SourceReadError>;

    /// Deterministic proposal address for a 1-based index. The gateway
    /// derives it; the same (governor, index) always yields the same key.
    async fn proposal_address(&self, governor: &str, index: u64)
        -> Result<String, SourceReadError>;

    /// Detail record for one proposal. "Not found / uninitialized" maps
    /// to `DetailUnavailable`, as does any transport error — detail
    /// failures are always per-proposal.
    async fn proposal_meta(&self, address: &str) -> Result<ProposalMeta, DetailUnavailable>;
}

#[derive(Debug, Deserialize)]
struct GovernorBody {
    proposal_count: u64,
}

#[derive(Debug, Deserialize)]
struct AddressBody {
    address: String,
}

pub struct HttpGovernorReader {
    base: String,
    client: Client,
}

impl HttpGovernorReader {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            base,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl GovernorReader for HttpGovernorReader {
    async fn proposal_count(&self, governor: &str) -> Result<u64, SourceReadError> {
        let url = format!("{}/governor/{}", self.base, governor);
        let fetch = async {
            let body: GovernorBody = self
                .client
                .get(&url)
                .send()
                .await
                .context("governor get")?
                .error_for_status()
                .context("governor non-2xx")?
                .json()
                .await
                .context("governor json")?;
            anyhow::Ok(body.proposal_count)
        };
        fetch
            .await
            .map_err(|e| SourceReadError::new(governor, format!("{e:#}")))
    }

    async fn proposal_address(
        &self,
        governor: &str,
        index: u64,
    ) -> Result<String, SourceReadError> {
        let url = format!("{}/governor/{}/proposal-address/{}", self.base, governor, index);
        let fetch = async {
            let body: AddressBody = self
                .client
                .get(&url)
                .send()
                .await
                .context("proposal address get")?
                .error_for_status()
                .context("proposal address non-2xx")?
                .json()
                .await
                .context("proposal address json")?;
            anyhow::Ok(body.address)
        };
        fetch
            .await
            .map_err(|e| SourceReadError::new(governor, format!("{e:#}")))
    }

    async fn proposal_meta(&self, address: &str) -> Result<ProposalMeta, DetailUnavailable> {
        let url = format!("{}/proposal/{}", self.base, address);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DetailUnavailable::new(address, e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(DetailUnavailable::new(address, "not found/uninitialized"));
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| DetailUnavailable::new(address, e))?;
        resp.json()
            .await
            .map_err(|e| DetailUnavailable::new(address, e))
    }
}
