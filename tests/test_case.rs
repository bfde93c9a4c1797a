// tests/test_case.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, quick_options, test_context, SuiteFixture};

use std::sync::Arc;
use std::time::Duration;

use systest::config::RunOptions;
use systest::errors::SystestError;
use systest::report::DiffReport;

#[tokio::test]
async fn matching_output_passes_silently() {
    init_tracing();
    let fx = SuiteFixture::new();
    let case = fx.case("math", "echo", "copies stdin", "cat");
    fx.pair("math", "echo", "1_", Some("1\n2\n"), "1\n2\n");
    fx.pair("math", "echo", "2_", Some(""), "");
    let (ctx, _tx) = test_context(quick_options(), None);

    let mut trace = String::new();
    let passed = case.execute(&ctx, &mut trace).await.unwrap();

    assert!(passed);
    assert!(trace.is_empty(), "unexpected trace: {trace:?}");
}

#[tokio::test]
async fn print_successful_shows_progress() {
    let fx = SuiteFixture::new();
    let case = fx.case("math", "echo", "copies stdin", "cat");
    fx.pair("math", "echo", "1_", Some("a\n"), "a\n");
    fx.pair("math", "echo", "2_", Some("b\n"), "b\n");
    let options = RunOptions {
        print_successful: true,
        ..quick_options()
    };
    let (ctx, _tx) = test_context(options, None);

    let mut trace = String::new();
    assert!(case.execute(&ctx, &mut trace).await.unwrap());

    let expected_head = format!("{}...", case.label());
    assert!(trace.starts_with(&expected_head), "{trace:?}");
    assert!(trace[expected_head.len()..].starts_with("..OK (0m"), "{trace:?}");
    assert!(trace.ends_with("s)\n"));
}

#[tokio::test]
async fn mismatch_fails_and_lands_in_diff_report() {
    init_tracing();
    let fx = SuiteFixture::new();
    let case = fx.case("math", "echo", "copies stdin", "cat");
    fx.pair("math", "echo", "1_", Some("a\nb\nc\n"), "a\nx\nc\n");
    let report = Arc::new(DiffReport::create(fx.path("difference.txt")).unwrap());
    let (ctx, _tx) = test_context(quick_options(), Some(Arc::clone(&report)));

    let mut trace = String::new();
    let passed = case.execute(&ctx, &mut trace).await.unwrap();

    assert!(!passed);
    // The header is printed for failures even without print_successful.
    assert!(trace.starts_with(&format!("{}...FAIL (0m", case.label())), "{trace:?}");

    assert!(report.finish(false).unwrap());
    let text = fx.read("difference.txt");
    assert!(text.starts_with(&format!("FAIL: {}\n", case.label())), "{text}");
    assert!(text.contains("--- expected.stdout\n+++ produced.stdout\n"));
    assert!(text.contains("@@ -1,3 +1,3 @@"));
    assert!(text.lines().any(|l| l == "-x"));
    assert!(text.lines().any(|l| l == "+b"));
}

#[tokio::test]
async fn disabled_case_is_skipped_as_success() {
    let fx = SuiteFixture::new();
    let case = fx.case("math", "broken", "would fail", "echo nope");
    fx.pair("math", "broken", "1_", None, "yes\n");
    fx.file("math/broken.testdesc.disabled", "");
    let (ctx, _tx) = test_context(quick_options(), None);

    let mut trace = String::new();
    assert!(case.execute(&ctx, &mut trace).await.unwrap());
    assert!(trace.is_empty());
}

#[tokio::test]
async fn repeated_execution_gives_the_same_verdict() {
    let fx = SuiteFixture::new();
    let good = fx.case("d", "good", "ok", "echo hi");
    fx.pair("d", "good", "1_", None, "hi\n");
    let bad = fx.case("d", "bad", "not ok", "echo hi");
    fx.pair("d", "bad", "1_", None, "bye\n");
    let (ctx, _tx) = test_context(quick_options(), None);

    for _ in 0..3 {
        assert!(good.execute(&ctx, &mut String::new()).await.unwrap());
        assert!(!bad.execute(&ctx, &mut String::new()).await.unwrap());
    }
}

#[tokio::test]
async fn dump_mode_emits_output_without_judging() {
    let fx = SuiteFixture::new();
    let case = fx.case("d", "dump", "dumps", "echo produced");
    fx.pair("d", "dump", "1_", None, "something else\n");
    let options = RunOptions {
        dump_output: true,
        ..quick_options()
    };
    let (ctx, _tx) = test_context(options, None);

    let mut trace = String::new();
    assert!(case.execute(&ctx, &mut trace).await.unwrap());
    assert_eq!(trace, "produced\n");
}

#[tokio::test]
async fn timeout_is_a_case_failure() {
    init_tracing();
    let fx = SuiteFixture::new();
    let case = fx.case("d", "slow", "hangs", "sleep 30");
    fx.pair("d", "slow", "1_", None, "");
    let report = Arc::new(DiffReport::create(fx.path("difference.txt")).unwrap());
    let options = RunOptions {
        watchdog: Duration::from_secs(1),
        ..quick_options()
    };
    let (ctx, _tx) = test_context(options, Some(Arc::clone(&report)));

    let mut trace = String::new();
    assert!(!case.execute(&ctx, &mut trace).await.unwrap());

    report.finish(false).unwrap();
    assert_eq!(
        fx.read("difference.txt"),
        format!("FAIL (timeout 1s): {}\n", case.label())
    );
}

#[tokio::test]
async fn timed_out_pair_does_not_stop_later_pairs() {
    let fx = SuiteFixture::new();
    let case = fx.case("d", "mixed", "one hang", "read x; if [ $x = slow ]; then sleep 30; fi; echo $x");
    fx.pair("d", "mixed", "1_", Some("slow\n"), "slow\n");
    fx.pair("d", "mixed", "2_", Some("late\n"), "expected\n");
    let report = Arc::new(DiffReport::create(fx.path("difference.txt")).unwrap());
    let options = RunOptions {
        watchdog: Duration::from_secs(1),
        ..quick_options()
    };
    let (ctx, _tx) = test_context(options, Some(Arc::clone(&report)));

    assert!(!case.execute(&ctx, &mut String::new()).await.unwrap());

    report.finish(false).unwrap();
    let text = fx.read("difference.txt");
    let timeout_at = text.find("FAIL (timeout 1s)").unwrap_or_else(|| panic!("{text}"));
    let mismatch_at = text.find("FAIL: ").unwrap_or_else(|| panic!("{text}"));
    assert!(timeout_at < mismatch_at, "{text}");
    assert!(text.lines().any(|l| l == "+late"), "{text}");
}

#[tokio::test]
async fn missing_verification_data_fails_the_case() {
    let fx = SuiteFixture::new();
    let case = fx.case("d", "lonely", "no data", "echo hi");
    let (ctx, _tx) = test_context(quick_options(), None);

    assert!(!case.execute(&ctx, &mut String::new()).await.unwrap());
}

#[tokio::test]
async fn two_inputs_for_one_output_abort_the_run() {
    let fx = SuiteFixture::new();
    let case = fx.case("d", "amb", "ambiguous", "cat");
    fx.pair("d", "amb", "1_", Some("a\n"), "a\n");
    fx.file("d/amb/1_other.txt", "b\n");
    let (ctx, _tx) = test_context(quick_options(), None);

    let err = case.execute(&ctx, &mut String::new()).await.unwrap_err();
    assert!(matches!(err, SystestError::AmbiguousInput { ref inputs, .. } if inputs.len() == 2));
}
