// src/notify/twitter.rs
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::{NotificationPayload, Notifier};

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";

/// Posts the payload as a tweet via the v2 API. No retries here: a
/// failed tweet is logged by the mux and dropped, per the lossy
/// dispatch contract.
pub struct TwitterSink {
    bearer: String,
    client: Client,
    timeout: Duration,
}

impl TwitterSink {
    /// `None` when TWITTER_BEARER_TOKEN is unset (sink disabled).
    pub fn from_env() -> Option<Self> {
        let bearer = std::env::var("TWITTER_BEARER_TOKEN").ok()?;
        Some(Self::new(bearer))
    }

    pub fn new(bearer: String) -> Self {
        Self {
            bearer,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait::async_trait]
impl Notifier for TwitterSink {
    async fn push(&self, payload: &NotificationPayload) -> Result<()> {
        let body = serde_json::json!({ "text": payload.text });
        self.client
            .post(TWEETS_URL)
            .bearer_auth(&self.bearer)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("twitter post")?
            .error_for_status()
            .context("twitter non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}
