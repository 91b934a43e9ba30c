//! Re-running reconciliation must never duplicate or overwrite data

mod common;

use common::{date, fast_policy, FakeSheet, FakeTasks};
use daylog_core::DayOutcome;
use daylog_sync::Reconciler;
use pretty_assertions::assert_eq;

#[test]
fn second_run_changes_nothing() {
    let tasks = FakeTasks::new()
        .with_tasks(date(2024, 1, 9), &["A", "B"])
        .with_tasks(date(2024, 1, 4), &["C"]);
    let sheet = FakeSheet::new().with_month("Jan-24", date(2024, 1, 1), 31);
    let reconciler = Reconciler::new(&tasks, &sheet).with_retry_policy(fast_policy());

    let first = reconciler.run("Daily", date(2024, 1, 10)).unwrap();
    let after_first = sheet.snapshot();
    let writes_after_first = sheet.writes.borrow().len();

    let second = reconciler.run("Daily", date(2024, 1, 10)).unwrap();

    assert_eq!(first.written(), 7);
    assert_eq!(sheet.snapshot(), after_first);
    assert_eq!(sheet.writes.borrow().len(), writes_after_first);

    for (before, after) in first.days.iter().zip(&second.days) {
        let DayOutcome::Written { cell, summary } = &before.outcome else {
            panic!("first run should write offset {}", before.offset);
        };
        assert_eq!(
            after.outcome,
            DayOutcome::SkippedAlreadyFilled {
                cell: cell.clone(),
                existing: summary.clone(),
            }
        );
    }
}

#[test]
fn rerun_after_partial_failure_fills_the_gap() {
    let mut tasks = FakeTasks::new().with_tasks(date(2024, 1, 6), &["Late sync"]);
    tasks.broken_days.insert(date(2024, 1, 6));
    let sheet = FakeSheet::new().with_month("Jan-24", date(2024, 1, 1), 31);

    let first = Reconciler::new(&tasks, &sheet)
        .with_retry_policy(fast_policy())
        .run("Daily", date(2024, 1, 10))
        .unwrap();
    assert_eq!(first.failed(), 1);

    tasks.broken_days.clear();
    let second = Reconciler::new(&tasks, &sheet)
        .with_retry_policy(fast_policy())
        .run("Daily", date(2024, 1, 10))
        .unwrap();

    assert_eq!(second.written(), 1);
    assert_eq!(second.skipped(), 6);
    assert_eq!(sheet.summary("Jan-24", "2024-01-06").as_deref(), Some("Late sync"));
}

#[test]
fn next_day_run_only_touches_the_new_day() {
    let tasks = FakeTasks::new().with_tasks(date(2024, 1, 10), &["New"]);
    let sheet = FakeSheet::new().with_month("Jan-24", date(2024, 1, 1), 31);

    Reconciler::new(&tasks, &sheet)
        .with_retry_policy(fast_policy())
        .run("Daily", date(2024, 1, 10))
        .unwrap();
    let report = Reconciler::new(&tasks, &sheet)
        .with_retry_policy(fast_policy())
        .run("Daily", date(2024, 1, 11))
        .unwrap();

    assert_eq!(report.written(), 1);
    assert_eq!(report.days[0].date, date(2024, 1, 10));
    assert_eq!(sheet.summary("Jan-24", "2024-01-10").as_deref(), Some("New"));
}
