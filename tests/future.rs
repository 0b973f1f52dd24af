// tests/future.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::thread;
use std::time::Duration;

use spingroup::exec::{Future, WorkError};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn first_outcome_wins() -> TestResult {
    init_tracing();

    let future: Future<u32> = Future::new();
    assert!(!future.is_started());
    assert!(!future.is_completed());

    assert!(future.complete(7));
    assert!(!future.complete(8), "second complete must be ignored");
    assert!(!future.fail(WorkError::Cancelled), "fail after complete must be ignored");

    assert!(future.is_completed());
    assert!(!future.is_failed());
    assert_eq!(future.value()?, 7);
    Ok(())
}

#[test]
fn failure_is_terminal_too() {
    init_tracing();

    let future: Future<u32> = Future::new();
    assert!(future.fail(WorkError::Cancelled));
    assert!(!future.complete(1));

    assert!(future.is_failed());
    assert!(matches!(future.value(), Err(WorkError::Cancelled)));
}

#[test]
fn start_marks_started_but_not_completed() {
    init_tracing();

    let future: Future<()> = Future::new();
    future.start();
    future.start();
    assert!(future.is_started());
    assert!(!future.is_completed());
    assert!(future.try_value().is_none());
}

#[test]
fn value_blocks_every_reader_until_resolved() -> TestResult {
    init_tracing();

    let future: Future<String> = Future::new();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let f = future.clone();
            thread::spawn(move || f.value())
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    future.complete("done".to_string());

    for reader in readers {
        let value = reader.join().map_err(|_| "reader panicked")??;
        assert_eq!(value, "done");
    }
    Ok(())
}

#[test]
fn value_timeout_gives_up_on_pending_future() {
    init_tracing();

    let future: Future<u8> = Future::new();
    assert!(future.value_timeout(Duration::from_millis(30)).is_none());
}

#[test]
fn value_timeout_returns_outcome_resolved_meanwhile() {
    init_tracing();

    let future: Future<u8> = Future::new();
    let writer = future.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        writer.fail(WorkError::Panicked("kaboom".to_string()));
    });

    match future.value_timeout(Duration::from_secs(5)) {
        Some(Err(WorkError::Panicked(msg))) => assert_eq!(msg, "kaboom"),
        other => panic!("expected panicked outcome, got {other:?}"),
    }
    handle.join().expect("writer thread panicked");
}
