// src/fetcher.rs
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use metrics::counter;

use crate::error::SourceReadError;
use crate::ledger::GovernorReader;
use crate::types::{Dao, Proposal};

/// Resolves and hydrates the new slice of a governor's proposal sequence.
///
/// Address resolution failures are source-scoped (the whole range is
/// retried next cycle); detail failures are proposal-scoped (the
/// proposal is kept with `meta: None`).
pub struct ProposalFetcher {
    reader: Arc<dyn GovernorReader>,
    max_in_flight: usize,
}

impl ProposalFetcher {
    pub fn new(reader: Arc<dyn GovernorReader>, max_in_flight: usize) -> Self {
        Self {
            reader,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Proposal keys for indices `1..=count`, in index order.
    pub async fn proposal_keys(
        &self,
        dao: &Dao,
        count: u64,
    ) -> Result<Vec<String>, SourceReadError> {
        self.resolve_addresses(dao, 1, count).await.map(|pairs| {
            pairs.into_iter().map(|(_, addr)| addr).collect()
        })
    }

    /// Proposals for the inclusive index range `from..=to`, addresses
    /// resolved 1:1 in order, details fan-out with per-proposal isolation.
    pub async fn resolve_new_proposals(
        &self,
        dao: &Dao,
        from: u64,
        to: u64,
    ) -> Result<Vec<Proposal>, SourceReadError> {
        let indexed = self.resolve_addresses(dao, from, to).await?;
        Ok(self.hydrate(dao, indexed).await)
    }

    /// Detail fan-in over already-resolved `(index, address)` pairs.
    /// Never fails as a batch; order of the input is preserved.
    pub async fn hydrate(&self, dao: &Dao, indexed: Vec<(u64, String)>) -> Vec<Proposal> {
        let reader = Arc::clone(&self.reader);
        let dao_name = dao.name.clone();
        stream::iter(indexed)
            .map(move |(index, address)| {
                let reader = Arc::clone(&reader);
                let dao_name = dao_name.clone();
                async move {
                    let meta = match reader.proposal_meta(&address).await {
                        Ok(meta) => Some(meta),
                        Err(e) => {
                            counter!("monitor_detail_failures_total").increment(1);
                            tracing::warn!(
                                dao = %dao_name,
                                proposal = %address,
                                error = %e,
                                "failed to fetch proposal detail, keeping proposal without meta"
                            );
                            None
                        }
                    };
                    Proposal {
                        index,
                        address,
                        meta,
                    }
                }
            })
            .buffered(self.max_in_flight)
            .collect()
            .await
    }

    async fn resolve_addresses(
        &self,
        dao: &Dao,
        from: u64,
        to: u64,
    ) -> Result<Vec<(u64, String)>, SourceReadError> {
        if from > to {
            return Ok(Vec::new());
        }
        tracing::debug!(
            dao = %dao.name,
            from,
            to,
            "resolving proposal addresses"
        );
        let reader = Arc::clone(&self.reader);
        let governor = dao.address.clone();
        let results: Vec<Result<(u64, String), SourceReadError>> = stream::iter(from..=to)
            .map(move |index| {
                let reader = Arc::clone(&reader);
                let governor = governor.clone();
                async move {
                    let addr = reader.proposal_address(&governor, index).await?;
                    Ok((index, addr))
                }
            })
            .buffered(self.max_in_flight)
            .collect()
            .await;
        results.into_iter().collect()
    }
}
