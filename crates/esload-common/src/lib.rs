pub type Result<T> = core::result::Result<T, LoadError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The request never produced a response (connect, send, timeout).
    #[error("error getting response: {0}")]
    Transport(String),
    /// The service answered but refused to index the document.
    #[error("[{status}] indexing failed")]
    Application { status: String },
    #[error("error parsing the response body: {0}")]
    Decode(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Message(String),
}

impl LoadError {
    pub fn is_transport(&self) -> bool { matches!(self, LoadError::Transport(_)) }
}

pub mod config {
    use crate::{LoadError, Result};
    use serde::Deserialize;
    use std::env;
    use std::time::Duration;

    /// What a transport failure does to the rest of the run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum FailurePolicy {
        /// Log it, count it, keep the pool going.
        #[default]
        Isolate,
        /// Stop dispatching, drain in-flight workers and fail the run.
        Abort,
    }

    impl std::str::FromStr for FailurePolicy {
        type Err = LoadError;

        fn from_str(s: &str) -> Result<Self> {
            match s.trim().to_ascii_lowercase().as_str() {
                "isolate" => Ok(FailurePolicy::Isolate),
                "abort" => Ok(FailurePolicy::Abort),
                other => Err(LoadError::Config(format!("unknown failure policy '{other}'"))),
            }
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct LoadConfig {
        pub pool_size: usize,
        pub quota: u64,
        pub addresses: Vec<String>,
        pub index: String,
        pub refresh: bool,
        pub submit_timeout_ms: Option<u64>,
        pub failure_policy: FailurePolicy,
    }

    impl Default for LoadConfig {
        fn default() -> Self {
            Self {
                pool_size: 100,
                quota: 10_000,
                addresses: vec![String::from("http://localhost:9200")],
                index: String::from("hockey"),
                refresh: true,
                submit_timeout_ms: None,
                failure_policy: FailurePolicy::Isolate,
            }
        }
    }

    impl LoadConfig {
        pub fn load() -> Self {
            if let Ok(path) = env::var("ESLOAD_CONFIG") {
                let Ok(text) = std::fs::read_to_string(path) else { return Self::default() };
                return Self::from_yaml(&text).unwrap_or_default();
            }
            let mut cfg = Self::default();
            if let Some(v) = env::var("ESLOAD_POOL_SIZE").ok().and_then(|v| v.parse().ok()) { cfg.pool_size = v; }
            if let Some(v) = env::var("ESLOAD_QUOTA").ok().and_then(|v| v.parse().ok()) { cfg.quota = v; }
            if let Ok(v) = env::var("ESLOAD_ADDRESSES") { cfg.addresses = split_addresses(&v); }
            if let Ok(v) = env::var("ESLOAD_INDEX") { cfg.index = v; }
            if let Some(v) = env::var("ESLOAD_REFRESH").ok().and_then(|v| v.parse().ok()) { cfg.refresh = v; }
            if let Some(v) = env::var("ESLOAD_SUBMIT_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()) { cfg.submit_timeout_ms = Some(v); }
            if let Some(v) = env::var("ESLOAD_FAILURE_POLICY").ok().and_then(|v| v.parse().ok()) { cfg.failure_policy = v; }
            cfg
        }

        pub fn from_yaml(text: &str) -> Result<Self> {
            serde_yaml::from_str(text).map_err(|e| LoadError::Config(e.to_string()))
        }

        pub fn validate(&self) -> Result<()> {
            if self.pool_size == 0 {
                return Err(LoadError::Config("pool_size must be at least 1".into()));
            }
            if self.addresses.is_empty() {
                return Err(LoadError::Config("at least one address is required".into()));
            }
            Ok(())
        }

        pub fn submit_timeout(&self) -> Option<Duration> { self.submit_timeout_ms.map(Duration::from_millis) }
    }

    pub fn split_addresses(raw: &str) -> Vec<String> {
        raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(|s| s.trim_end_matches('/').to_string()).collect()
    }

}
