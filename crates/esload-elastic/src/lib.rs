//! Elasticsearch-backed [`DocumentSubmitter`] speaking the plain index HTTP API.

use std::sync::atomic::{AtomicUsize, Ordering};

use esload_common::{config::LoadConfig, LoadError, Result};
use esload_submitter::{Document, DocumentSubmitter, IndexOutcome};
use serde::Deserialize;

#[derive(Deserialize)]
struct IndexResponse {
    result: String,
    #[serde(rename = "_version")]
    version: i64,
}

#[derive(Deserialize)]
struct InfoResponse { version: InfoVersion }

#[derive(Deserialize)]
struct InfoVersion { number: String }

/// Client handle shared read-only by all workers; `reqwest::Client` pools connections internally.
pub struct ElasticSubmitter {
    client: reqwest::Client,
    addresses: Vec<String>,
    index: String,
    refresh: bool,
    next_address: AtomicUsize,
}

impl ElasticSubmitter {
    pub fn new(addresses: Vec<String>, index: impl Into<String>, refresh: bool) -> Result<Self> {
        if addresses.is_empty() {
            return Err(LoadError::Config("at least one address is required".into()));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LoadError::Message(format!("failed to build http client: {e}")))?;
        let addresses = addresses.into_iter().map(|a| a.trim_end_matches('/').to_string()).collect();
        Ok(Self { client, addresses, index: index.into(), refresh, next_address: AtomicUsize::new(0) })
    }

    pub fn from_config(cfg: &LoadConfig) -> Result<Self> {
        Self::new(cfg.addresses.clone(), cfg.index.clone(), cfg.refresh)
    }

    pub fn addresses(&self) -> &[String] { &self.addresses }

    fn next_address(&self) -> &str {
        let i = self.next_address.fetch_add(1, Ordering::Relaxed) % self.addresses.len();
        &self.addresses[i]
    }

    /// Version number reported by the cluster root endpoint.
    pub async fn info(&self) -> Result<String> {
        let url = format!("{}/", self.next_address());
        let resp = self.client.get(&url).send().await.map_err(|e| LoadError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| LoadError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(LoadError::Application { status: status.to_string() });
        }
        let info: InfoResponse = serde_json::from_slice(&body).map_err(|e| LoadError::Decode(e.to_string()))?;
        Ok(info.version.number)
    }
}

impl DocumentSubmitter for ElasticSubmitter {
    async fn submit(&self, document: &Document) -> Result<IndexOutcome> {
        let url = format!("{}/{}/_doc", self.next_address(), self.index);
        let mut req = self.client.post(&url).json(document);
        if self.refresh { req = req.query(&[("refresh", "true")]); }

        let resp = req.send().await.map_err(|e| LoadError::Transport(e.to_string()))?;
        let status = resp.status();
        // read the body even on failure so the connection can go back to the pool
        let body = resp.bytes().await.map_err(|e| LoadError::Transport(e.to_string()))?;
        if !status.is_success() {
            tracing::debug!(target: "elastic", "{} rejected document: {}", url, String::from_utf8_lossy(&body));
            return Err(LoadError::Application { status: status.to_string() });
        }
        let parsed: IndexResponse = serde_json::from_slice(&body).map_err(|e| LoadError::Decode(e.to_string()))?;
        Ok(IndexOutcome { status: status.to_string(), result: parsed.result, version: parsed.version })
    }
}
