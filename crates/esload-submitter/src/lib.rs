//! Documents and the capability that ships them to an indexing service.

use std::future::Future;

use esload_common::Result;

pub mod document;

pub use document::{generate, Document, DocumentGenerator};

/// What the service reported for an accepted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutcome {
    pub status: String,
    pub result: String,
    pub version: i64,
}

/// A single-document submit. Implementations are shared by every worker of a run,
/// so they must tolerate concurrent calls.
pub trait DocumentSubmitter: Send + Sync {
    fn submit(&self, document: &Document) -> impl Future<Output = Result<IndexOutcome>> + Send;
}

#[cfg(feature = "mock")]
pub mod mock {
    use super::*;
    use esload_common::LoadError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-process submitter for dry runs and tests. Failure patterns are keyed on the
    /// 1-based call number.
    #[derive(Default)]
    pub struct MockSubmitter {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        fail_every: Option<usize>,
        transport_fail_every: Option<usize>,
        latency: Option<Duration>,
    }

    impl MockSubmitter {
        pub fn new() -> Self { Self::default() }

        /// Every `k`-th call is rejected by the "service".
        pub fn fail_every(mut self, k: usize) -> Self { self.fail_every = (k > 0).then_some(k); self }

        /// Every `k`-th call never reaches the "service".
        pub fn transport_fail_every(mut self, k: usize) -> Self { self.transport_fail_every = (k > 0).then_some(k); self }

        pub fn with_latency(mut self, latency: Duration) -> Self { self.latency = Some(latency); self }

        pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
        pub fn in_flight(&self) -> usize { self.in_flight.load(Ordering::SeqCst) }
        pub fn peak_in_flight(&self) -> usize { self.peak_in_flight.load(Ordering::SeqCst) }
    }

    /// Releases an in-flight slot even when the submit future is dropped mid-call.
    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); }
    }

    impl DocumentSubmitter for MockSubmitter {
        async fn submit(&self, _document: &Document) -> Result<IndexOutcome> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            let _in_flight = InFlight(&self.in_flight);
            match self.latency {
                Some(d) => tokio::time::sleep(d).await,
                None => tokio::task::yield_now().await,
            }

            if self.transport_fail_every.is_some_and(|k| n % k == 0) {
                return Err(LoadError::Transport(format!("connection refused (call {n})")));
            }
            if self.fail_every.is_some_and(|k| n % k == 0) {
                return Err(LoadError::Application { status: "400 Bad Request".into() });
            }
            Ok(IndexOutcome { status: "201 Created".into(), result: "created".into(), version: 1 })
        }
    }
}
