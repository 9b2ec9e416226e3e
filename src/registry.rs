// src/registry.rs
use anyhow::Context;
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;

use crate::error::RegistryUnavailable;
use crate::types::Dao;

/// Enumerates the governors to monitor. Idempotent and side-effect free;
/// called once per cycle so additions/removals in the catalog show up
/// without a restart.
#[async_trait]
pub trait DaoRegistry: Send + Sync {
    async fn list_daos(&self) -> Result<Vec<Dao>, RegistryUnavailable>;
}

/// Production adapter: the published registry build, a flat JSON array of
/// `{address, name, slug, ...}` records. Unknown fields are ignored.
pub struct HttpDaoRegistry {
    url: String,
    client: Client,
}

impl HttpDaoRegistry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl DaoRegistry for HttpDaoRegistry {
    async fn list_daos(&self) -> Result<Vec<Dao>, RegistryUnavailable> {
        let fetch = async {
            let resp = self
                .client
                .get(&self.url)
                .send()
                .await
                .context("registry get")?
                .error_for_status()
                .context("registry non-2xx")?;
            let daos: Vec<Dao> = resp.json().await.context("registry json")?;
            anyhow::Ok(daos)
        };

        match fetch.await {
            Ok(daos) => {
                tracing::debug!(daos = daos.len(), "registry refreshed");
                Ok(daos)
            }
            Err(e) => {
                counter!("monitor_registry_errors_total").increment(1);
                Err(RegistryUnavailable::new(format!("{e:#}")))
            }
        }
    }
}
