// src/notify/mod.rs
pub mod render;
pub mod twitter;
pub mod webhook;

use async_trait::async_trait;
use metrics::counter;

/// Rendered text plus nothing else; addressing lives in each sink's own
/// configuration. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub text: String,
}

/// Delivery boundary. Success/failure is all the pipeline sees; retries,
/// if any, are the sink's own business.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn push(&self, payload: &NotificationPayload) -> anyhow::Result<()>;
    fn name(&self) -> &'static str;
}

/// Fans one payload out to every configured sink. A sink failure is
/// logged and counted, never propagated: by the time dispatch runs, the
/// baseline advancement decision is already made, so a persistently
/// broken sink cannot wedge state.
pub struct NotifierMux {
    sinks: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(sinks: Vec<Box<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    /// Twitter when a bearer token is configured, webhook when a URL is.
    /// With neither, dispatch degrades to log-only.
    pub fn from_env() -> Self {
        let mut sinks: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(s) = twitter::TwitterSink::from_env() {
            sinks.push(Box::new(s));
        }
        if let Some(s) = webhook::WebhookSink::from_env() {
            sinks.push(Box::new(s));
        }
        if sinks.is_empty() {
            tracing::info!("no notification sinks configured, running log-only");
        }
        Self { sinks }
    }

    pub async fn dispatch(&self, payload: &NotificationPayload) {
        tracing::info!(text = %payload.text, "dispatching notification");
        for sink in &self.sinks {
            if let Err(e) = sink.push(payload).await {
                counter!("monitor_dispatch_failures_total").increment(1);
                tracing::warn!(sink = sink.name(), error = %format!("{e:#}"), "sink dispatch failed");
            }
        }
    }
}
