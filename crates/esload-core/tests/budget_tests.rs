use std::sync::Arc;

use esload_core::WorkBudget;

#[test]
fn claims_stop_at_quota() {
    let b = WorkBudget::new(3);
    assert!(b.try_claim());
    assert!(b.try_claim());
    assert!(b.try_claim());
    assert!(!b.try_claim());
    assert_eq!(b.unclaimed(), 0);
    assert_eq!(b.remaining(), 3);
}

#[test]
fn completion_saturates_at_zero() {
    let b = WorkBudget::new(1);
    assert_eq!(b.complete(), 0);
    assert_eq!(b.complete(), 0);
    assert_eq!(b.remaining(), 0);
}

#[test]
fn concurrent_claims_never_exceed_quota() {
    let b = Arc::new(WorkBudget::new(1000));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let b = b.clone();
            std::thread::spawn(move || (0..500).filter(|_| b.try_claim()).count())
        })
        .collect();
    let claimed: usize = handles.into_iter().map(|h| h.join().expect("join")).sum();
    assert_eq!(claimed, 1000);
    assert_eq!(b.unclaimed(), 0);
}
