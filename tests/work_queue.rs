// tests/work_queue.rs

mod common;
use crate::common::{init_tracing, wait_until, with_timeout, ConcurrencyProbe};

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use spingroup::errors::SpinError;
use spingroup::exec::{WorkError, WorkQueue};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn runs_work_and_returns_values() -> TestResult {
    init_tracing();

    let queue = WorkQueue::new(2)?;
    let a = queue.enqueue(|_| Ok(1 + 1));
    let b = queue.enqueue(|_| Ok(2 + 2));

    assert_eq!(a.value()?, 2);
    assert_eq!(b.value()?, 4);
    queue.wait();
    Ok(())
}

#[test]
fn zero_concurrency_is_rejected() {
    init_tracing();

    match WorkQueue::new(0) {
        Err(SpinError::InvalidArgument(msg)) => assert!(msg.contains("max_concurrent")),
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}

#[test]
fn never_exceeds_max_concurrent() -> TestResult {
    init_tracing();

    let queue = WorkQueue::new(2)?;
    let probe = ConcurrencyProbe::new();

    let futures: Vec<_> = (0..3)
        .map(|i| {
            let probe = probe.clone();
            queue.enqueue(move |_| {
                let _inside = probe.enter();
                thread::sleep(Duration::from_millis(100));
                Ok(i)
            })
        })
        .collect();

    for (i, future) in futures.iter().enumerate() {
        assert_eq!(future.value()?, i);
    }
    queue.wait();

    assert_eq!(probe.max(), 2, "two sleepers should overlap, never three");
    assert_eq!(probe.entered(), 3);
    assert!(queue.worker_count() <= 2);
    Ok(())
}

#[test]
fn errors_and_panics_stay_with_their_item() -> TestResult {
    init_tracing();

    let queue = WorkQueue::new(1)?;
    let failing = queue.enqueue::<u32, _>(|_| Err(anyhow!("bad input")));
    let panicking = queue.enqueue::<u32, _>(|_| panic!("kaboom"));
    let fine = queue.enqueue(|_| Ok(3u32));

    match failing.value() {
        Err(WorkError::Failed(err)) => assert!(err.to_string().contains("bad input")),
        other => panic!("expected Failed, got {other:?}"),
    }
    match panicking.value() {
        Err(WorkError::Panicked(msg)) => assert!(msg.contains("kaboom")),
        other => panic!("expected Panicked, got {other:?}"),
    }
    assert_eq!(fine.value()?, 3);
    queue.wait();
    Ok(())
}

#[test]
fn interrupt_cancels_pending_and_running_work() -> TestResult {
    init_tracing();

    let queue = Arc::new(WorkQueue::new(1)?);
    let second_ran = Arc::new(AtomicBool::new(false));

    let running = queue.enqueue(|token| {
        token.sleep(Duration::from_secs(30))?;
        Ok("finished")
    });
    let flag = Arc::clone(&second_ran);
    let pending = queue.enqueue(move |_| {
        flag.store(true, Ordering::SeqCst);
        Ok("ran")
    });

    assert!(wait_until(Duration::from_secs(5), || running.is_started()));
    queue.interrupt();
    assert!(queue.is_interrupted());

    let q = Arc::clone(&queue);
    with_timeout(Duration::from_secs(10), move || q.wait());

    assert!(matches!(running.value(), Err(WorkError::Cancelled)));
    assert!(matches!(pending.value(), Err(WorkError::Cancelled)));
    assert!(!second_ran.load(Ordering::SeqCst), "queued work must never run");
    assert_eq!(queue.worker_count(), 0);
    Ok(())
}

#[test]
fn enqueue_after_close_fails_as_cancelled() -> TestResult {
    init_tracing();

    let queue = WorkQueue::new(1)?;
    queue.close();
    let late = queue.enqueue(|_| Ok(()));

    assert!(late.is_completed());
    assert!(matches!(late.value(), Err(WorkError::Cancelled)));
    queue.wait();
    Ok(())
}

#[test]
fn wait_drains_queue_and_is_idempotent() -> TestResult {
    init_tracing();

    let queue = WorkQueue::new(3)?;
    let futures: Vec<_> = (0..10u64)
        .map(|i| {
            queue.enqueue(move |_| {
                thread::sleep(Duration::from_millis(i % 3));
                Ok(i * 10)
            })
        })
        .collect();

    queue.wait();
    queue.wait();

    assert_eq!(queue.queued_count(), 0);
    assert_eq!(queue.running_count(), 0);
    assert_eq!(queue.worker_count(), 0);
    for (i, future) in (0u64..).zip(&futures) {
        assert_eq!(future.try_value().ok_or("future unresolved after wait")??, i * 10);
    }
    Ok(())
}

#[test]
fn work_that_ignores_interrupt_still_resolves_cancelled() -> TestResult {
    init_tracing();

    let queue = WorkQueue::new(1)?;
    let started = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&started);
    let stubborn = queue.enqueue(move |_| {
        flag.store(true, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        Ok(42)
    });

    assert!(wait_until(Duration::from_secs(5), || started.load(Ordering::SeqCst)));
    queue.interrupt();

    assert!(matches!(stubborn.value(), Err(WorkError::Cancelled)));
    queue.wait();
    Ok(())
}
