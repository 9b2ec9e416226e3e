//! Governance Proposal Monitor — Binary Entrypoint
//! Wires the registry adapter, gateway reader, baseline store and sink
//! mux into the poller, then runs until ctrl-c (graceful drain).

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tribeca_monitor::ledger::HttpGovernorReader;
use tribeca_monitor::registry::HttpDaoRegistry;
use tribeca_monitor::{BaselineStore, MonitorConfig, NotifierMux, Poller};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tribeca_monitor=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn init_metrics_exporter() {
    // Exporter is opt-in; the counters are cheap no-ops without it.
    let Ok(addr) = std::env::var("METRICS_ADDR") else {
        tracing::debug!("METRICS_ADDR unset, prometheus exporter disabled");
        return;
    };
    let Ok(addr) = addr.parse::<std::net::SocketAddr>() else {
        tracing::warn!(%addr, "unparseable METRICS_ADDR, prometheus exporter disabled");
        return;
    };
    if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        tracing::warn!(error = %e, "failed to install prometheus exporter");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();
    init_metrics_exporter();

    let cfg = MonitorConfig::load().context("loading monitor config")?;

    let registry = Arc::new(HttpDaoRegistry::new(cfg.registry_url.clone()));
    let reader = Arc::new(HttpGovernorReader::new(cfg.gateway_url.clone()));
    let store = Arc::new(BaselineStore::new());
    let mux = Arc::new(NotifierMux::from_env());

    let poller = Poller::new(cfg, registry, reader, store, mux);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler failed");
            return;
        }
        let _ = shutdown_tx.send(true);
    });

    poller.run(shutdown_rx).await;
    tracing::info!("monitor stopped");
    Ok(())
}
