// tests/cycle_set_add.rs
mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{dao, test_config, FakeGateway, GovernorFixture, RecordingSink, StaticRegistry};
use tribeca_monitor::{Baseline, BaselineStore, DiffStrategy, MonitorConfig, NotifierMux, Poller};

fn set_add_config() -> MonitorConfig {
    MonitorConfig {
        strategy: DiffStrategy::SetAdd,
        ..test_config()
    }
}

fn poller_with(
    gateway: Arc<FakeGateway>,
    store: Arc<BaselineStore>,
    sink: RecordingSink,
) -> Poller {
    let registry = Arc::new(StaticRegistry::new(vec![dao("gov1", "Test DAO", "test-dao")]));
    let mux = Arc::new(NotifierMux::new(vec![Box::new(sink)]));
    Poller::new(set_add_config(), registry, gateway, store, mux)
}

#[tokio::test]
async fn new_keys_are_reported_in_snapshot_order() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.insert(
        "gov1",
        GovernorFixture {
            count: 4,
            titles: [(3, "Third".into()), (4, "Fourth".into())].into(),
            ..Default::default()
        },
    );
    // keys for indices 1 and 2 were already seen
    let seen: HashSet<String> = ["gov1/prop/1".to_string(), "gov1/prop/2".to_string()].into();
    let store = Arc::new(BaselineStore::with_seed([(
        "gov1".to_string(),
        Baseline::Keys(seen),
    )]));
    let sink = RecordingSink::new();
    let poller = poller_with(gateway, Arc::clone(&store), sink.clone());

    poller.run_cycle(1).await;

    let sent = sink.messages();
    assert_eq!(sent.len(), 1);
    let msg = &sent[0];
    assert!(msg.contains("/test-dao/proposals/3 - Third"));
    assert!(msg.contains("/test-dao/proposals/4 - Fourth"));
    assert!(!msg.contains("/test-dao/proposals/1"));
    // index 3 comes before index 4 in the message
    assert!(msg.find("proposals/3").unwrap() < msg.find("proposals/4").unwrap());

    let expected: HashSet<String> = (1..=4).map(|i| format!("gov1/prop/{i}")).collect();
    assert_eq!(store.get("gov1"), Some(Baseline::Keys(expected)));
}

#[tokio::test]
async fn no_new_keys_means_no_dispatch() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.insert(
        "gov1",
        GovernorFixture {
            count: 2,
            ..Default::default()
        },
    );
    let seen: HashSet<String> = ["gov1/prop/1".to_string(), "gov1/prop/2".to_string()].into();
    let store = Arc::new(BaselineStore::with_seed([(
        "gov1".to_string(),
        Baseline::Keys(seen.clone()),
    )]));
    let sink = RecordingSink::new();
    let poller = poller_with(gateway, Arc::clone(&store), sink.clone());

    poller.run_cycle(1).await;

    assert!(sink.messages().is_empty());
    assert_eq!(store.get("gov1"), Some(Baseline::Keys(seen)));
}

#[tokio::test]
async fn first_observation_seeds_key_set_silently() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.insert(
        "gov1",
        GovernorFixture {
            count: 3,
            ..Default::default()
        },
    );
    let store = Arc::new(BaselineStore::new());
    let sink = RecordingSink::new();
    let poller = poller_with(gateway, Arc::clone(&store), sink.clone());

    poller.run_cycle(1).await;

    assert!(sink.messages().is_empty());
    let expected: HashSet<String> = (1..=3).map(|i| format!("gov1/prop/{i}")).collect();
    assert_eq!(store.get("gov1"), Some(Baseline::Keys(expected)));
}
