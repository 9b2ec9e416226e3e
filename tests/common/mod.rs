// tests/common/mod.rs
// Shared in-memory doubles for the registry, the governance gateway and
// the notification sink.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tribeca_monitor::error::{DetailUnavailable, RegistryUnavailable, SourceReadError};
use tribeca_monitor::ledger::GovernorReader;
use tribeca_monitor::registry::DaoRegistry;
use tribeca_monitor::types::{Dao, ProposalMeta};
use tribeca_monitor::{MonitorConfig, NotificationPayload, Notifier};

pub fn dao(address: &str, name: &str, slug: &str) -> Dao {
    Dao {
        address: address.into(),
        name: name.into(),
        slug: slug.into(),
    }
}

/// Config tuned for tests: generous message cap so text assertions see
/// every line, everything else defaults.
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        max_message_len: 2_000,
        ..MonitorConfig::default()
    }
}

pub struct StaticRegistry {
    daos: Vec<Dao>,
    fail: AtomicBool,
}

impl StaticRegistry {
    pub fn new(daos: Vec<Dao>) -> Self {
        Self {
            daos,
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DaoRegistry for StaticRegistry {
    async fn list_daos(&self) -> Result<Vec<Dao>, RegistryUnavailable> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryUnavailable::new("catalog offline"));
        }
        Ok(self.daos.clone())
    }
}

#[derive(Default)]
pub struct GovernorFixture {
    pub count: u64,
    pub fail_count_read: bool,
    /// Delay before the count read responds (for timeout scenarios).
    pub stall_count_read: Option<Duration>,
    /// Indices whose detail fetch yields DetailUnavailable.
    pub fail_detail_for: HashSet<u64>,
    /// Titles by index; missing entries fall back to "Proposal {index}".
    pub titles: HashMap<u64, String>,
}

/// In-memory governance gateway. Proposal addresses are deterministic:
/// `{governor}/prop/{index}`.
#[derive(Default)]
pub struct FakeGateway {
    governors: Mutex<HashMap<String, GovernorFixture>>,
    pub count_reads: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, governor: &str, fixture: GovernorFixture) {
        self.governors
            .lock()
            .unwrap()
            .insert(governor.to_string(), fixture);
    }

    pub fn set_count(&self, governor: &str, count: u64) {
        self.governors
            .lock()
            .unwrap()
            .get_mut(governor)
            .expect("unknown governor")
            .count = count;
    }
}

#[async_trait]
impl GovernorReader for FakeGateway {
    async fn proposal_count(&self, governor: &str) -> Result<u64, SourceReadError> {
        self.count_reads.fetch_add(1, Ordering::SeqCst);
        let (stall, fail, count) = {
            let map = self.governors.lock().unwrap();
            let fx = map
                .get(governor)
                .ok_or_else(|| SourceReadError::new(governor, "unknown governor"))?;
            (fx.stall_count_read, fx.fail_count_read, fx.count)
        };
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(SourceReadError::new(governor, "rpc unavailable"));
        }
        Ok(count)
    }

    async fn proposal_address(
        &self,
        governor: &str,
        index: u64,
    ) -> Result<String, SourceReadError> {
        let map = self.governors.lock().unwrap();
        if !map.contains_key(governor) {
            return Err(SourceReadError::new(governor, "unknown governor"));
        }
        Ok(format!("{governor}/prop/{index}"))
    }

    async fn proposal_meta(&self, address: &str) -> Result<ProposalMeta, DetailUnavailable> {
        let (governor, index) = address
            .rsplit_once("/prop/")
            .and_then(|(g, i)| i.parse::<u64>().ok().map(|i| (g, i)))
            .ok_or_else(|| DetailUnavailable::new(address, "malformed address"))?;

        let map = self.governors.lock().unwrap();
        let fx = map
            .get(governor)
            .ok_or_else(|| DetailUnavailable::new(address, "unknown governor"))?;
        if fx.fail_detail_for.contains(&index) {
            return Err(DetailUnavailable::new(address, "not found/uninitialized"));
        }
        let title = fx
            .titles
            .get(&index)
            .cloned()
            .unwrap_or_else(|| format!("Proposal {index}"));
        Ok(ProposalMeta {
            title,
            description_link: String::new(),
        })
    }
}

/// Records every dispatch attempt; optionally fails them all, or stalls
/// for a configurable delay before succeeding.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub fail: Arc<AtomicBool>,
    pub delay_ms: Arc<AtomicU64>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay_ms(&self, millis: u64) {
        self.delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingSink {
    async fn push(&self, payload: &NotificationPayload) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(payload.text.clone());
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("sink down");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
