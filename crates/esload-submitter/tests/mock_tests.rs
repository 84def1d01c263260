use esload_common::LoadError;
use esload_submitter::{mock::MockSubmitter, Document, DocumentSubmitter};

#[tokio::test]
async fn mock_follows_failure_pattern() {
    let m = MockSubmitter::new().fail_every(3).transport_fail_every(5);
    let doc = Document::new("Joe", "Biden");
    let mut outcomes = Vec::new();
    for _ in 0..15 { outcomes.push(m.submit(&doc).await); }
    assert_eq!(m.calls(), 15);
    assert!(matches!(outcomes[2], Err(LoadError::Application { .. })));
    assert!(matches!(outcomes[4], Err(LoadError::Transport(_))));
    // 15 is a multiple of both; transport wins
    assert!(matches!(outcomes[14], Err(LoadError::Transport(_))));
    let ok = outcomes[0].as_ref().expect("first call succeeds");
    assert_eq!(ok.result, "created");
    assert_eq!(m.in_flight(), 0);
}

#[tokio::test]
async fn dropped_submit_releases_in_flight_slot() {
    let m = MockSubmitter::new().with_latency(std::time::Duration::from_millis(500));
    let doc = Document::new("Steve", "Peterson");
    let res = tokio::time::timeout(std::time::Duration::from_millis(10), m.submit(&doc)).await;
    assert!(res.is_err());
    assert_eq!(m.calls(), 1);
    assert_eq!(m.peak_in_flight(), 1);
    assert_eq!(m.in_flight(), 0);
}
