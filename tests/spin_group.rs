// tests/spin_group.rs

mod common;
use crate::common::{init_tracing, with_timeout, ConcurrencyProbe, SharedBuffer};

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;
use spingroup::cprintln;
use spingroup::errors::SpinError;
use spingroup::exec::WorkQueue;
use spingroup::group::{SpinGroup, SpinGroupBuilder, TaskError, TaskOutcome, EMPTY_PLACEHOLDER};
use spingroup::ui::glyph::SPINNER_FRAMES;
use spingroup::ui::{RenderState, StatusCounts};

type TestResult = Result<(), Box<dyn Error>>;

/// Group writing plain text into `out`, repainting quickly.
fn quiet_builder(out: &SharedBuffer) -> SpinGroupBuilder {
    SpinGroup::builder()
        .output(out.clone())
        .render_state(RenderState::new(false))
        .period(Duration::from_millis(10))
        .width(80)
}

#[test]
fn all_successful_tasks_report_true() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).build()?;
    group.add("one", |_| Ok(TaskOutcome::Success));
    group.add("two", |_| {
        thread::sleep(Duration::from_millis(30));
        Ok(TaskOutcome::Success)
    });

    assert!(group.wait());
    assert!(group.all_succeeded());
    assert!(!out.plain().contains("Task Failed"));
    assert_eq!(
        group.status_counts(),
        StatusCounts {
            succeeded: 2,
            ..StatusCounts::default()
        }
    );
    Ok(())
}

#[test]
fn failing_task_error_appears_in_debrief() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).build()?;
    group.add("ok", |_| Ok(TaskOutcome::Success));
    group.add("exploding", |_| {
        cprintln!("partial progress");
        Err(anyhow!("boom"))
    });

    assert!(!group.wait());

    let text = out.plain();
    assert!(text.contains("Task Failed: exploding"), "missing header in:\n{text}");
    assert!(text.contains("boom"));
    assert!(text.contains("partial progress"));
    assert!(!text.contains("Task Failed: ok"));
    Ok(())
}

#[test]
fn failed_sentinel_fails_without_error() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).auto_debrief(false).build()?;
    group.add("sentinel", |_| Ok(TaskOutcome::Failed));

    assert!(!group.wait());

    let tasks = group.tasks();
    let finished = tasks[0].finished().ok_or("task not finished")?;
    assert!(!finished.success);
    assert!(finished.error.is_none());
    assert!(!out.plain().contains("Task Failed"), "debrief was disabled");
    Ok(())
}

#[test]
fn panicking_task_is_reported_as_panic() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).build()?;
    group.add("panics", |_| panic!("kaboom"));

    assert!(!group.wait());

    let finished = group.tasks()[0].finished().ok_or("task not finished")?;
    match &finished.error {
        Some(TaskError::Panic(msg)) => assert!(msg.contains("kaboom")),
        other => panic!("expected panic error, got {other:?}"),
    }
    assert!(out.plain().contains("Panic"));
    Ok(())
}

#[test]
fn empty_streams_get_placeholder() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).build()?;
    group.add("silent", |_| Ok(TaskOutcome::Failed));
    group.wait();

    let text = out.plain();
    assert_eq!(text.matches(EMPTY_PLACEHOLDER).count(), 2, "output:\n{text}");
    assert!(text.contains("── STDOUT ──"));
    assert!(text.contains("── STDERR ──"));
    Ok(())
}

#[test]
fn lines_are_drawn_in_add_order() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).build()?;
    for title in ["alpha", "bravo", "charlie"] {
        group.add(title, |_| Ok(TaskOutcome::Success));
    }
    assert!(group.wait());

    let text = out.plain();
    let positions: Vec<usize> = ["alpha", "bravo", "charlie"]
        .iter()
        .map(|t| text.find(t).ok_or("title never drawn"))
        .collect::<Result<_, _>>()?;
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "order: {positions:?}");
    Ok(())
}

#[test]
fn updated_title_is_drawn() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).build()?;
    group.add("old title", |task| {
        thread::sleep(Duration::from_millis(30));
        task.update_title("new title");
        assert_eq!(task.title(), "new title");
        thread::sleep(Duration::from_millis(60));
        Ok(TaskOutcome::Success)
    });

    assert!(group.wait());
    assert!(out.plain().contains("new title"));
    assert_eq!(group.tasks()[0].title(), "new title");
    Ok(())
}

#[test]
fn callbacks_replace_default_failure_report() -> TestResult {
    init_tracing();

    let failures = Arc::new(Mutex::new(Vec::new()));
    let successes = Arc::new(Mutex::new(Vec::new()));
    let (f, s) = (Arc::clone(&failures), Arc::clone(&successes));

    let out = SharedBuffer::new();
    let group = quiet_builder(&out)
        .on_failure(move |report| {
            f.lock().push((report.title.clone(), report.stderr_or_placeholder().to_string()));
        })
        .on_success(move |report| s.lock().push(report.stdout().to_string()))
        .build()?;

    group.add("good", |_| {
        cprintln!("fine");
        Ok(TaskOutcome::Success)
    });
    group.add("bad one", |_| Err(anyhow!("first")));
    group.add("bad two", |_| Ok(TaskOutcome::Failed));

    assert!(!group.wait());

    let failures = failures.lock();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0], ("bad one".to_string(), EMPTY_PLACEHOLDER.to_string()));
    assert_eq!(failures[1].0, "bad two");
    assert_eq!(*successes.lock(), vec!["fine\n".to_string()]);
    assert!(!out.plain().contains("Task Failed"));
    Ok(())
}

#[test]
fn debrief_can_be_run_by_hand() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).auto_debrief(false).build()?;
    group.add("late report", |_| Err(anyhow!("kept for later")));

    assert!(!group.wait());
    assert!(!out.plain().contains("kept for later"));

    assert!(!group.debrief());
    assert!(out.plain().contains("kept for later"));
    Ok(())
}

#[test]
fn conflicting_queue_arguments_are_rejected() -> TestResult {
    init_tracing();

    let queue = Arc::new(WorkQueue::new(1)?);
    let result = SpinGroup::builder().max_concurrent(2).work_queue(queue).build();
    assert!(matches!(result, Err(SpinError::InvalidArgument(_))));

    let result = SpinGroup::builder().max_concurrent(0).build();
    assert!(matches!(result, Err(SpinError::InvalidArgument(_))));
    Ok(())
}

#[test]
fn queue_backed_group_respects_limit() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).max_concurrent(2).build()?;
    let probe = ConcurrencyProbe::new();

    for i in 0..5 {
        let probe = probe.clone();
        group.add(format!("queued {i}"), move |_| {
            let _inside = probe.enter();
            thread::sleep(Duration::from_millis(40));
            Ok(TaskOutcome::Success)
        });
    }

    assert!(group.wait());
    assert!(probe.max() <= 2);
    assert_eq!(probe.entered(), 5);
    Ok(())
}

#[test]
fn shared_queue_is_left_open() -> TestResult {
    init_tracing();

    let queue = Arc::new(WorkQueue::new(2)?);
    let out = SharedBuffer::new();
    let group = quiet_builder(&out).work_queue(Arc::clone(&queue)).build()?;
    group.add("on shared queue", |_| Ok(TaskOutcome::Success));
    assert!(group.wait());

    let after = queue.enqueue(|_| Ok(9));
    assert_eq!(after.value()?, 9);
    queue.wait();
    Ok(())
}

#[test]
fn interrupt_cancels_running_and_queued_tasks() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = Arc::new(quiet_builder(&out).max_concurrent(1).build()?);
    group.add("long", |task| {
        task.cancel_token().sleep(Duration::from_secs(30))?;
        Ok(TaskOutcome::Success)
    });
    group.add("never starts", |_| Ok(TaskOutcome::Success));

    let interrupter = Arc::clone(&group);
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        interrupter.interrupt();
    });

    let waiter = Arc::clone(&group);
    let all_ok = with_timeout(Duration::from_secs(10), move || waiter.wait());
    assert!(!all_ok);

    for task in group.tasks() {
        let finished = task.finished().ok_or("task not finished")?;
        assert!(
            matches!(finished.error, Some(TaskError::Cancelled)),
            "{}: {:?}",
            task.title(),
            finished.error
        );
    }
    assert!(out.plain().contains("Cancelled"));
    Ok(())
}

#[test]
fn task_added_during_wait_runs_on_owned_queue() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = Arc::new(quiet_builder(&out).max_concurrent(2).build()?);
    group.add("first", |_| {
        thread::sleep(Duration::from_millis(200));
        Ok(TaskOutcome::Success)
    });

    let adder = Arc::clone(&group);
    let late = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        adder.add("late", |_| Ok(TaskOutcome::Success));
    });

    let waiter = Arc::clone(&group);
    let all_ok = with_timeout(Duration::from_secs(10), move || waiter.wait());
    late.join().map_err(|_| "adder panicked")?;

    let tasks = group.tasks();
    assert_eq!(tasks.len(), 2);
    let finished = tasks[1].finished().ok_or("late task not finished")?;
    assert!(finished.success, "late task failed: {:?}", finished.error);
    assert!(all_ok);
    Ok(())
}

#[test]
fn running_lines_get_partial_redraws_in_place() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).auto_debrief(false).build()?;
    for title in ["a", "b"] {
        group.add(title, |_| {
            thread::sleep(Duration::from_millis(150));
            Ok(TaskOutcome::Success)
        });
    }
    assert!(group.wait());

    let raw = out.contents();
    assert!(
        raw.contains("⠋ a\x1b[K\n⠋ b\x1b[K\n"),
        "first pass should append both lines: {raw:?}"
    );
    // Second pass, frame 1: only the glyph is redrawn, cursor returns below.
    assert!(raw.contains("\x1b[2A\r⠙\r\x1b[2B"), "raw: {raw:?}");
    assert!(raw.contains("\x1b[1A\r⠙\r\x1b[1B"), "raw: {raw:?}");
    // Finished lines get a full render at the same relative position.
    assert!(raw.contains("\x1b[2A\r✓ a\x1b[K\r\x1b[2B"), "raw: {raw:?}");

    // Lines are only ever appended once each.
    assert_eq!(raw.matches('\n').count(), 2);
    Ok(())
}

#[test]
fn tasks_finishing_together_are_finalized_in_one_pass() -> TestResult {
    init_tracing();

    let gate = Arc::new(AtomicBool::new(false));
    let out = SharedBuffer::new();
    let group = Arc::new(
        quiet_builder(&out)
            .auto_debrief(false)
            .period(Duration::from_millis(100))
            .build()?,
    );
    for title in ["left", "right"] {
        let gate = Arc::clone(&gate);
        group.add(title, move |_| {
            while !gate.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(TaskOutcome::Success)
        });
    }

    let opener = Arc::clone(&gate);
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        opener.store(true, Ordering::SeqCst);
    });

    let waiter = Arc::clone(&group);
    assert!(with_timeout(Duration::from_secs(10), move || waiter.wait()));

    let raw = out.contents();
    let left = raw.find("✓ left").ok_or("left never finalized")?;
    let right = raw.find("✓ right").ok_or("right never finalized")?;
    assert!(left < right);
    let between = &raw[left..right];
    assert!(
        !SPINNER_FRAMES.iter().any(|frame| between.contains(frame)),
        "a spinner was drawn between the two finals: {between:?}"
    );
    assert_eq!(raw.matches("✓ left").count(), 1);
    assert_eq!(raw.matches("✓ right").count(), 1);
    Ok(())
}

#[test]
fn updated_title_shows_before_completion() -> TestResult {
    init_tracing();

    let out = SharedBuffer::new();
    let group = quiet_builder(&out).auto_debrief(false).build()?;
    group.add("old title", |task| {
        thread::sleep(Duration::from_millis(30));
        task.update_title("new title");
        thread::sleep(Duration::from_millis(100));
        Ok(TaskOutcome::Success)
    });
    assert!(group.wait());

    let raw = out.contents();
    let renamed = raw.find("new title").ok_or("new title never drawn")?;
    let done = raw.find('✓').ok_or("check mark never drawn")?;
    assert!(renamed < done, "title only appeared with the final render: {raw:?}");
    // Drawn mid-run by a spinner line, not just by the final render.
    assert!(SPINNER_FRAMES
        .iter()
        .any(|frame| raw.contains(&format!("{frame} new title"))));
    Ok(())
}

#[test]
fn whitespace_output_is_not_replaced_by_placeholder() -> TestResult {
    init_tracing();

    let seen = Arc::new(Mutex::new(None));
    let record = Arc::clone(&seen);
    let out = SharedBuffer::new();
    let group = quiet_builder(&out)
        .on_failure(move |report| {
            *record.lock() = Some(report.stdout_or_placeholder().to_string());
        })
        .build()?;
    group.add("blank line", |_| {
        cprintln!();
        Ok(TaskOutcome::Failed)
    });
    assert!(!group.wait());

    assert_eq!(seen.lock().as_deref(), Some("\n"));
    Ok(())
}
