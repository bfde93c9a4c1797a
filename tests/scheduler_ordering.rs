// tests/scheduler_ordering.rs

mod common;
use crate::common::{init_tracing, synthetic_directory, with_timeout, Event, RecordingBackend};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use systest::errors::SystestError;
use systest::report::SuiteVerdict;
use systest::sched::{Scheduler, Strategy};
use systest::suite::TestDirectory;

const ALL_STRATEGIES: [Strategy; 3] = [
    Strategy::Sequential,
    Strategy::DirectoryParallel,
    Strategy::CaseParallel,
];

async fn run_with(
    backend: Arc<RecordingBackend>,
    strategy: Strategy,
    dirs: Vec<TestDirectory>,
) -> SuiteVerdict {
    let (_tx, rx) = watch::channel(false);
    let jobs = if strategy.is_parallel() { 4 } else { 1 };
    let scheduler = Scheduler::new(backend, strategy, jobs, Duration::from_secs(10), rx);
    with_timeout(scheduler.run(dirs, Box::new(std::io::sink())))
        .await
        .unwrap()
}

fn position(events: &[Event], wanted: &Event) -> usize {
    events
        .iter()
        .position(|e| e == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not recorded in {events:?}"))
}

fn case_file(dir: &str, i: usize) -> PathBuf {
    PathBuf::from(format!("{dir}/c{i}.testdesc"))
}

#[tokio::test]
async fn cases_in_a_directory_keep_discovery_order() {
    init_tracing();
    for strategy in [Strategy::Sequential, Strategy::DirectoryParallel] {
        let backend = Arc::new(RecordingBackend::new().with_case_delay(Duration::from_millis(5)));
        run_with(Arc::clone(&backend), strategy, vec![synthetic_directory("d", 3)]).await;

        let events = backend.events();
        let finished_c1 = position(&events, &Event::Finished(case_file("d", 1)));
        let started_c2 = position(&events, &Event::Started(case_file("d", 2)));
        let finished_c2 = position(&events, &Event::Finished(case_file("d", 2)));
        let started_c3 = position(&events, &Event::Started(case_file("d", 3)));

        assert!(finished_c1 < started_c2, "{strategy}: {events:?}");
        assert!(finished_c2 < started_c3, "{strategy}: {events:?}");
    }
}

#[tokio::test]
async fn hooks_bracket_every_case_exactly_once() {
    init_tracing();
    for strategy in ALL_STRATEGIES {
        let backend = Arc::new(RecordingBackend::new().with_case_delay(Duration::from_millis(2)));
        let dirs = vec![synthetic_directory("a", 5), synthetic_directory("b", 2)];
        let verdict = run_with(Arc::clone(&backend), strategy, dirs).await;
        assert!(verdict.passed);
        assert_eq!(verdict.total, 7);

        let events = backend.events();
        for (dir, count) in [("a", 5), ("b", 2)] {
            let setup = Event::Setup(PathBuf::from(dir));
            let teardown = Event::Teardown(PathBuf::from(dir));
            assert_eq!(events.iter().filter(|e| **e == setup).count(), 1, "{strategy}");
            assert_eq!(events.iter().filter(|e| **e == teardown).count(), 1, "{strategy}");

            let setup_at = position(&events, &setup);
            let teardown_at = position(&events, &teardown);
            for i in 1..=count {
                let started = position(&events, &Event::Started(case_file(dir, i)));
                let finished = position(&events, &Event::Finished(case_file(dir, i)));
                assert!(setup_at < started, "{strategy}: {events:?}");
                assert!(finished < teardown_at, "{strategy}: {events:?}");
            }
        }
    }
}

#[tokio::test]
async fn case_parallel_initializes_everything_up_front() {
    let backend = Arc::new(RecordingBackend::new());
    let dirs = vec![synthetic_directory("a", 2), synthetic_directory("b", 2)];
    run_with(Arc::clone(&backend), Strategy::CaseParallel, dirs).await;

    let events = backend.events();
    let last_setup = events
        .iter()
        .rposition(|e| matches!(e, Event::Setup(_)))
        .unwrap();
    let first_start = events
        .iter()
        .position(|e| matches!(e, Event::Started(_)))
        .unwrap();
    let last_finish = events
        .iter()
        .rposition(|e| matches!(e, Event::Finished(_)))
        .unwrap();
    let first_teardown = events
        .iter()
        .position(|e| matches!(e, Event::Teardown(_)))
        .unwrap();

    assert!(last_setup < first_start);
    assert!(last_finish < first_teardown);
}

#[tokio::test]
async fn one_failing_case_fails_the_suite_under_every_strategy() {
    for strategy in ALL_STRATEGIES {
        let backend = Arc::new(RecordingBackend::new().failing(case_file("a", 2)));
        let dirs = vec![synthetic_directory("a", 3), synthetic_directory("b", 1)];
        let verdict = run_with(backend, strategy, dirs).await;

        assert!(!verdict.passed, "{strategy}");
        assert_eq!(verdict.failed, 1);
        assert_eq!(verdict.total, 4);
    }
}

#[tokio::test]
async fn parallel_output_is_tagged_with_the_worker() {
    let backend = Arc::new(RecordingBackend::new().failing(case_file("a", 1)));
    let verdict = run_with(backend, Strategy::CaseParallel, vec![synthetic_directory("a", 1)]).await;

    assert_eq!(verdict.log.len(), 1);
    assert!(verdict.log[0].starts_with("[worker "), "{:?}", verdict.log);
    assert!(verdict.log[0].ends_with("a/c1.testdesc: case 1...FAIL (0m0.000s)"));
}

#[tokio::test]
async fn empty_suite_passes() {
    for strategy in ALL_STRATEGIES {
        let verdict = run_with(Arc::new(RecordingBackend::new()), strategy, Vec::new()).await;
        assert!(verdict.passed);
        assert_eq!(verdict.total, 0);
    }
}

#[tokio::test]
async fn interrupted_run_starts_no_cases_but_still_tears_down() {
    let backend = Arc::new(RecordingBackend::new());
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let scheduler = Scheduler::new(
        Arc::clone(&backend),
        Strategy::Sequential,
        1,
        Duration::from_secs(10),
        rx,
    );
    scheduler
        .run(vec![synthetic_directory("a", 2)], Box::new(std::io::sink()))
        .await
        .unwrap();

    let events = backend.events();
    assert_eq!(
        events,
        vec![Event::Setup(PathBuf::from("a")), Event::Teardown(PathBuf::from("a"))]
    );
}

#[tokio::test]
async fn fatal_error_cancels_the_run_without_waiting_for_slower_work() {
    init_tracing();
    for strategy in [Strategy::DirectoryParallel, Strategy::CaseParallel] {
        let backend = Arc::new(
            RecordingBackend::new()
                .slow(case_file("slow", 1), Duration::from_secs(30))
                .fatal(case_file("bad", 1)),
        );
        // `slow` is dispatched first, so joining in dispatch order would stall.
        let dirs = vec![synthetic_directory("slow", 1), synthetic_directory("bad", 1)];
        let (_tx, rx) = watch::channel(false);
        let scheduler = Scheduler::new(Arc::clone(&backend), strategy, 2, Duration::from_secs(60), rx);

        let started = Instant::now();
        let err = with_timeout(scheduler.run(dirs, Box::new(std::io::sink())))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, SystestError::Spawn { .. }), "{strategy}: {err}");
        assert!(elapsed < Duration::from_secs(5), "{strategy}: took {elapsed:?}");
        let events = backend.events();
        assert!(!events.contains(&Event::Finished(case_file("slow", 1))), "{strategy}: {events:?}");
    }
}

#[cfg(unix)]
mod real_cases {
    use super::*;
    use crate::common::{test_context, SuiteFixture};
    use systest::config::RunOptions;
    use systest::report::DiffReport;
    use systest::sched::RealBackend;
    use systest::suite::group_by_directory;

    const WATCHDOG: Duration = Duration::from_secs(1);

    fn scheduler(
        ctx: systest::context::RunContext,
        strategy: Strategy,
    ) -> (Scheduler<RealBackend>, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let jobs = if strategy.is_parallel() { 2 } else { 1 };
        (Scheduler::new(Arc::new(RealBackend::new(ctx)), strategy, jobs, WATCHDOG, rx), tx)
    }

    fn options() -> RunOptions {
        RunOptions {
            watchdog: WATCHDOG,
            ..RunOptions::default()
        }
    }

    #[tokio::test]
    async fn each_pair_gets_its_own_watchdog() {
        init_tracing();
        for strategy in ALL_STRATEGIES {
            let fx = SuiteFixture::new();
            // Together the pairs outlast one watchdog; each alone does not.
            let case = fx.case("d", "steady", "three pairs under the watchdog each", "sleep 0.8; cat");
            for index in ["1_", "2_", "3_"] {
                fx.pair("d", "steady", index, Some("same\n"), "same\n");
            }
            let (ctx, _itx) = test_context(options(), None);
            let (scheduler, _tx) = scheduler(ctx, strategy);

            let verdict = with_timeout(scheduler.run(group_by_directory(vec![case]), Box::new(std::io::sink())))
                .await
                .unwrap();

            assert!(verdict.passed, "{strategy}: {:?}", verdict.log);
            assert_eq!(verdict.total, 1);
        }
    }

    #[tokio::test]
    async fn later_pairs_still_run_after_a_pair_times_out() {
        init_tracing();
        for strategy in [Strategy::Sequential, Strategy::DirectoryParallel] {
            let fx = SuiteFixture::new();
            let case = fx.case(
                "d",
                "mixed",
                "one hang then two quick pairs",
                "read x; if [ $x = slow ]; then sleep 30; fi; echo $x",
            );
            fx.pair("d", "mixed", "1_", Some("slow\n"), "slow\n");
            fx.pair("d", "mixed", "2_", Some("fast\n"), "fast\n");
            fx.pair("d", "mixed", "3_", Some("third\n"), "other\n");
            let label = case.label();

            let report = Arc::new(DiffReport::create(fx.path("difference.txt")).unwrap());
            let (ctx, _itx) = test_context(options(), Some(Arc::clone(&report)));
            let (scheduler, _tx) = scheduler(ctx, strategy);

            let verdict = with_timeout(scheduler.run(group_by_directory(vec![case]), Box::new(std::io::sink())))
                .await
                .unwrap();
            assert!(!verdict.passed, "{strategy}");
            assert_eq!((verdict.total, verdict.failed), (1, 1), "{strategy}");

            assert!(report.finish(false).unwrap());
            let text = fx.read("difference.txt");
            assert!(text.contains(&format!("FAIL (timeout 1s): {label}\n")), "{strategy}: {text}");
            assert!(text.contains(&format!("FAIL: {label}\n")), "{strategy}: {text}");
            assert!(text.lines().any(|l| l == "-other"), "{strategy}: {text}");
            assert!(text.lines().any(|l| l == "+third"), "{strategy}: {text}");
            // The second pair matched, so it left nothing behind.
            assert!(!text.lines().any(|l| l == "+fast"), "{strategy}: {text}");
        }
    }
}

#[cfg(unix)]
mod real_hooks {
    use super::*;
    use crate::common::{quick_options, test_context, SuiteFixture};
    use systest::sched::RealBackend;
    use systest::suite::group_by_directory;

    /// Five cases whose commands append to a shared log, bracketed by
    /// hook scripts that append too.
    fn fixture() -> (SuiteFixture, Vec<TestDirectory>) {
        let fx = SuiteFixture::new();
        fx.script("d/initialize", "echo init >> log.txt");
        fx.script("d/finalize", "echo fini >> log.txt");

        let cases = (1..=5)
            .map(|i| {
                let case = fx.case("d", &format!("c{i}"), &format!("case {i}"), &format!("sh -c 'echo c{i} >> log.txt; echo ok'"));
                fx.pair("d", &format!("c{i}"), "1_", None, "ok\n");
                case
            })
            .collect();
        (fx, group_by_directory(cases))
    }

    #[tokio::test]
    async fn hook_scripts_run_once_around_all_cases() {
        init_tracing();
        for strategy in ALL_STRATEGIES {
            let (fx, dirs) = fixture();
            let (ctx, _tx) = test_context(quick_options(), None);
            let (_itx, rx) = watch::channel(false);
            let jobs = if strategy.is_parallel() { 3 } else { 1 };
            let scheduler = Scheduler::new(
                Arc::new(RealBackend::new(ctx)),
                strategy,
                jobs,
                Duration::from_secs(10),
                rx,
            );

            let verdict = with_timeout(scheduler.run(dirs, Box::new(std::io::sink())))
                .await
                .unwrap();
            assert!(verdict.passed, "{strategy}: {:?}", verdict.log);

            let log = fx.read("d/log.txt");
            let lines: Vec<_> = log.lines().collect();
            assert_eq!(lines.len(), 7, "{strategy}: {lines:?}");
            assert_eq!(lines.first(), Some(&"init"));
            assert_eq!(lines.last(), Some(&"fini"));
            assert_eq!(lines.iter().filter(|l| l.starts_with('c')).count(), 5);
        }
    }
}
