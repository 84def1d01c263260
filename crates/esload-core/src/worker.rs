use std::time::Duration;

use esload_common::{LoadError, Result};
use esload_submitter::{Document, DocumentSubmitter, IndexOutcome};

/// Result of one worker's single submit attempt.
#[derive(Debug)]
pub struct Attempt {
    pub full_name: String,
    pub outcome: Result<IndexOutcome>,
}

/// Submits one document and logs the outcome. Failures are returned, never retried.
pub async fn submit_one<S: DocumentSubmitter>(
    submitter: &S,
    document: Document,
    timeout: Option<Duration>,
) -> Attempt {
    let full_name = document.full_name();
    tracing::debug!(target: "worker", "{}", full_name);

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, submitter.submit(&document)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LoadError::Transport(format!("no response within {limit:?}"))),
        },
        None => submitter.submit(&document).await,
    };
    log_outcome(&full_name, &outcome);
    Attempt { full_name, outcome }
}

fn log_outcome(full_name: &str, outcome: &Result<IndexOutcome>) {
    match outcome {
        Ok(o) => tracing::info!(target: "worker", "[{}] {}; version={}", o.status, o.result, o.version),
        Err(LoadError::Application { status }) => {
            tracing::warn!(target: "worker", "[{}] Error indexing document fullName={}", status, full_name)
        }
        Err(e @ LoadError::Transport(_)) => tracing::error!(target: "worker", "{} fullName={}", e, full_name),
        Err(e) => tracing::warn!(target: "worker", "{} fullName={}", e, full_name),
    }
}
