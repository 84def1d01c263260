use std::sync::Arc;
use std::time::Duration;

use esload_core::Coordinator;
use esload_submitter::mock::MockSubmitter;

#[tokio::main]
async fn main() {
    let n: usize = std::env::var("N").ok().and_then(|v| v.parse().ok()).unwrap_or(16);
    let q: u64 = std::env::var("Q").ok().and_then(|v| v.parse().ok()).unwrap_or(1000);
    let latency_ms: u64 = std::env::var("LATENCY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(5);
    let mock = Arc::new(MockSubmitter::new().with_latency(Duration::from_millis(latency_ms)));
    let coordinator = match Coordinator::new(mock.clone(), n, q) {
        Ok(c) => c,
        Err(e) => { eprintln!("{}", e); return; }
    };
    match coordinator.run().await {
        Ok(report) => println!(
            "completed {} submits in {:.2}s (peak in flight {})",
            report.attempted,
            report.elapsed.as_secs_f32(),
            mock.peak_in_flight()
        ),
        Err(e) => eprintln!("run failed: {}", e),
    }
}
