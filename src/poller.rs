// src/poller.rs
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::{DiffStrategy, MonitorConfig};
use crate::diff::{set_added_indexed, threshold_diff};
use crate::error::SourceReadError;
use crate::fetcher::ProposalFetcher;
use crate::ledger::GovernorReader;
use crate::notify::{render::render, NotifierMux};
use crate::registry::DaoRegistry;
use crate::state::{Baseline, BaselineStore};
use crate::types::{Dao, DiffEvent, DiffKind, GovernorSnapshot};

/// One-time metrics registration (so series show up on the exporter).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("monitor_cycles_total", "Poll cycles started.");
        describe_counter!(
            "monitor_registry_errors_total",
            "Registry fetch/parse errors (whole cycle skipped)."
        );
        describe_counter!(
            "monitor_source_errors_total",
            "Per-governor read failures or timeouts (baseline untouched)."
        );
        describe_counter!("monitor_events_total", "Positive diffs emitted.");
        describe_counter!(
            "monitor_detail_failures_total",
            "Per-proposal detail fetch failures (proposal kept without meta)."
        );
        describe_counter!(
            "monitor_dispatch_failures_total",
            "Sink dispatch failures (logged and dropped)."
        );
        describe_gauge!(
            "monitor_last_cycle_ts",
            "Unix ts when the last cycle finished."
        );
    });
}

/// Owns the scheduling loop: one cycle per tick, governors processed
/// concurrently with per-source isolation. Nothing in a cycle is fatal;
/// failures are contained at the smallest scope (proposal, governor,
/// cycle) and surface only as logs and counters.
pub struct Poller {
    cfg: MonitorConfig,
    registry: Arc<dyn DaoRegistry>,
    fetcher: ProposalFetcher,
    reader: Arc<dyn GovernorReader>,
    store: Arc<BaselineStore>,
    mux: Arc<NotifierMux>,
}

impl Poller {
    pub fn new(
        cfg: MonitorConfig,
        registry: Arc<dyn DaoRegistry>,
        reader: Arc<dyn GovernorReader>,
        store: Arc<BaselineStore>,
        mux: Arc<NotifierMux>,
    ) -> Self {
        let fetcher = ProposalFetcher::new(Arc::clone(&reader), cfg.max_in_flight_details);
        Self {
            cfg,
            registry,
            fetcher,
            reader,
            store,
            mux,
        }
    }

    /// Runs until `shutdown` fires. Ticks stay aligned to
    /// `t0 + k * poll_interval` (a cycle longer than the interval skips
    /// to the next aligned tick instead of bursting). On shutdown the
    /// in-flight cycle is drained to completion; no dispatch is aborted
    /// mid-flight.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        ensure_metrics_described();
        let mut ticker = tokio::time::interval(self.cfg.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval = ?self.cfg.poll_interval,
            strategy = ?self.cfg.strategy,
            "proposal monitor started"
        );

        let mut cycle: u64 = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycle += 1;
                    self.run_cycle(cycle).await;
                }
                _ = shutdown.changed() => {
                    tracing::info!("shutdown requested, stopping ticks");
                    break;
                }
            }
        }
    }

    /// One full poll-diff-notify pass. Public so tests can drive cycles
    /// without the ticker.
    pub async fn run_cycle(&self, cycle: u64) {
        ensure_metrics_described();
        counter!("monitor_cycles_total").increment(1);

        let daos = match self.registry.list_daos().await {
            Ok(daos) => daos,
            Err(e) => {
                tracing::warn!(error = %e, "skipping cycle for all governors");
                return;
            }
        };

        stream::iter(daos)
            .for_each_concurrent(self.cfg.max_concurrent_sources, |dao| async move {
                // The timeout bounds snapshot + fetch + baseline advance
                // only. Dispatch runs after it, so an in-flight dispatch
                // is never force-aborted and a slow sink cannot keep the
                // baseline from advancing.
                let outcome =
                    tokio::time::timeout(self.cfg.source_timeout, self.process_dao(cycle, &dao))
                        .await;
                match outcome {
                    Ok(Ok(Some(event))) => self.emit(&event).await,
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => {
                        counter!("monitor_source_errors_total").increment(1);
                        tracing::warn!(
                            dao = %dao.name,
                            error = %e,
                            "governor skipped this cycle, baseline untouched"
                        );
                    }
                    Err(_) => {
                        counter!("monitor_source_errors_total").increment(1);
                        tracing::warn!(
                            dao = %dao.name,
                            timeout = ?self.cfg.source_timeout,
                            "governor cycle timed out, baseline untouched"
                        );
                    }
                }
            })
            .await;

        gauge!("monitor_last_cycle_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    }

    async fn process_dao(
        &self,
        cycle: u64,
        dao: &Dao,
    ) -> Result<Option<DiffEvent>, SourceReadError> {
        let snapshot = GovernorSnapshot {
            dao: dao.clone(),
            proposal_count: self.reader.proposal_count(&dao.address).await?,
        };
        tracing::info!(
            dao = %snapshot.dao.name,
            proposal_count = snapshot.proposal_count,
            "monitoring data"
        );

        match self.cfg.strategy {
            DiffStrategy::Threshold => self.process_threshold(cycle, &snapshot).await,
            DiffStrategy::SetAdd => self.process_set_add(cycle, &snapshot).await,
        }
    }

    async fn process_threshold(
        &self,
        cycle: u64,
        snapshot: &GovernorSnapshot,
    ) -> Result<Option<DiffEvent>, SourceReadError> {
        let dao = &snapshot.dao;
        let count = snapshot.proposal_count;
        let prev = match self.store.get(&dao.address) {
            Some(Baseline::Count(prev)) => prev,
            Some(Baseline::Keys(_)) => {
                tracing::warn!(dao = %dao.name, "baseline kind mismatch, reseeding count");
                self.advance(dao, cycle, Baseline::Count(count));
                return Ok(None);
            }
            // First observation seeds the baseline; novelty needs two
            // data points.
            None => {
                self.advance(dao, cycle, Baseline::Count(count));
                return Ok(None);
            }
        };

        let mut event = None;
        if let Some((previous, current)) = threshold_diff(prev, count, self.cfg.threshold) {
            let new_proposals = self
                .fetcher
                .resolve_new_proposals(dao, previous + 1, current)
                .await?;
            event = Some(DiffEvent {
                dao: dao.clone(),
                kind: DiffKind::Threshold { previous, current },
                new_proposals,
            });
        } else if count < prev {
            // Should never happen under append-only; re-sync rather than
            // re-notify the same ground truth forever.
            tracing::warn!(
                dao = %dao.name,
                previous = prev,
                current = count,
                "proposal count shrank, re-syncing baseline"
            );
        }

        // Diff computed: the baseline advances here, before any dispatch,
        // so delivery outcome can never cause a re-emission of the same
        // novelty.
        self.advance(dao, cycle, Baseline::Count(count));
        Ok(event)
    }

    async fn process_set_add(
        &self,
        cycle: u64,
        snapshot: &GovernorSnapshot,
    ) -> Result<Option<DiffEvent>, SourceReadError> {
        let dao = &snapshot.dao;
        let current_keys = self
            .fetcher
            .proposal_keys(dao, snapshot.proposal_count)
            .await?;

        let prev = match self.store.get(&dao.address) {
            Some(Baseline::Keys(prev)) => prev,
            Some(Baseline::Count(_)) => {
                tracing::warn!(dao = %dao.name, "baseline kind mismatch, reseeding keys");
                self.advance(dao, cycle, Baseline::Keys(current_keys.into_iter().collect()));
                return Ok(None);
            }
            None => {
                self.advance(dao, cycle, Baseline::Keys(current_keys.into_iter().collect()));
                return Ok(None);
            }
        };

        let added = set_added_indexed(&prev, &current_keys);
        let mut event = None;
        if !added.is_empty() {
            let new_proposals = self.fetcher.hydrate(dao, added).await;
            event = Some(DiffEvent {
                dao: dao.clone(),
                kind: DiffKind::SetAdd,
                new_proposals,
            });
        }

        self.advance(dao, cycle, Baseline::Keys(current_keys.into_iter().collect()));
        Ok(event)
    }

    /// Render and dispatch, after the per-source timeout and after the
    /// baseline already advanced. Dispatch failures never classify the
    /// cycle: delivery is lossy by contract once the diff is computed.
    async fn emit(&self, event: &DiffEvent) {
        counter!("monitor_events_total").increment(1);
        tracing::info!(
            dao = %event.dao.name,
            new_proposals = event.new_proposals.len(),
            kind = ?event.kind,
            "spotted new proposals"
        );
        if let Some(payload) = render(event, self.cfg.max_message_len) {
            self.mux.dispatch(&payload).await;
        }
    }

    fn advance(&self, dao: &Dao, cycle: u64, next: Baseline) {
        if !self.store.advance(&dao.address, cycle, next) {
            tracing::warn!(
                dao = %dao.name,
                cycle,
                "baseline already advanced this cycle, ignoring"
            );
        }
    }
}
