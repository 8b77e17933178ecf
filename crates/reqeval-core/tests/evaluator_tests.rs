use reqeval_core::evaluator::EvaluationError;
use reqeval_core::diagnostics::DiagnosticHandler;
use reqeval_core::request::{Real, SimpleRequest};
use reqeval_test_helpers::create_test_evaluator;
use reqeval_test_helpers::fixtures::{
    calls, fibonacci, reset_counters, square, Counter, Failing, Flaky, NodeDepth, SquareUncached,
    TreeNode,
};
use reqeval_test_helpers::mocks::{RecordingStatsReporter, StatsEvent};

#[test]
fn test_square_memoized() {
    reset_counters();
    let (mut evaluator, _) = create_test_evaluator();

    assert_eq!(evaluator.evaluate(&square(3.0)).unwrap(), 9.0);
    assert_eq!(calls(Counter::Square), 1);

    assert_eq!(evaluator.evaluate(&square(3.0)).unwrap(), 9.0);
    assert_eq!(calls(Counter::Square), 1);

    assert_eq!(evaluator.evaluate(&square(4.0)).unwrap(), 16.0);
    assert_eq!(calls(Counter::Square), 2);

    assert_eq!(evaluator.cache().len(), 2);
    assert!(evaluator.has_cached_result(&square(4.0)));
    assert!(!evaluator.has_cached_result(&square(5.0)));
}

#[test]
fn test_uncached_computes_every_time() {
    reset_counters();
    let (mut evaluator, _) = create_test_evaluator();
    let request = SimpleRequest::<SquareUncached>::new((Real(3.0),));

    for _ in 0..3 {
        assert_eq!(evaluator.evaluate(&request).unwrap(), 9.0);
    }

    assert_eq!(calls(Counter::SquareUncached), 3);
    assert!(evaluator.cache().is_empty());
    assert_eq!(evaluator.metrics().cache_hits, 0);
}

#[test]
fn test_caching_policy_does_not_change_results() {
    let (mut evaluator, _) = create_test_evaluator();
    for value in [0.0, -1.5, 2.25, 1e10] {
        let cached = evaluator.evaluate(&square(value)).unwrap();
        let uncached = evaluator
            .evaluate(&SimpleRequest::<SquareUncached>::new((Real(value),)))
            .unwrap();
        assert_eq!(cached, uncached);
    }
}

#[test]
fn test_recursive_requests_share_cache() {
    reset_counters();
    let (mut evaluator, _) = create_test_evaluator();

    assert_eq!(evaluator.evaluate(&fibonacci(10)).unwrap(), 55);
    assert_eq!(calls(Counter::Fibonacci), 11);

    let metrics = evaluator.metrics();
    assert_eq!(metrics.computations, 11);
    assert_eq!(metrics.cache_hits, 8);
    assert_eq!(evaluator.active_depth(), 0);

    // Every intermediate value is now cached
    assert_eq!(evaluator.evaluate(&fibonacci(7)).unwrap(), 13);
    assert_eq!(calls(Counter::Fibonacci), 11);
}

#[test]
fn test_evaluators_do_not_share_caches() {
    reset_counters();
    let (mut first, _) = create_test_evaluator();
    let (mut second, _) = create_test_evaluator();

    first.evaluate(&square(2.0)).unwrap();
    second.evaluate(&square(2.0)).unwrap();

    assert_eq!(calls(Counter::Square), 2);
}

#[test]
fn test_failures_are_not_cached() {
    reset_counters();
    let (mut evaluator, _) = create_test_evaluator();
    let request = SimpleRequest::<Failing>::new(());

    let error = evaluator.evaluate(&request).unwrap_err();
    assert!(matches!(error, EvaluationError::Computation(_)));
    assert_eq!(error.to_string(), "failing fixture");

    assert!(evaluator.evaluate(&request).is_err());
    assert_eq!(calls(Counter::Failing), 2);
    assert_eq!(evaluator.metrics().failures, 2);
}

#[test]
fn test_retry_after_failure_succeeds_and_caches() {
    reset_counters();
    let (mut evaluator, _) = create_test_evaluator();
    let request = SimpleRequest::<Flaky>::new((42,));

    assert!(evaluator.evaluate(&request).is_err());
    assert!(!evaluator.has_cached_result(&request));

    assert_eq!(evaluator.evaluate(&request).unwrap(), 42);
    assert_eq!(evaluator.evaluate(&request).unwrap(), 42);
    assert_eq!(calls(Counter::Flaky), 2);
}

#[test]
fn test_evaluate_or_default() {
    let (mut evaluator, handler) = create_test_evaluator();

    assert_eq!(evaluator.evaluate_or_default(&square(3.0), 0.0), 9.0);
    assert_eq!(
        evaluator.evaluate_or_default(&SimpleRequest::<Failing>::new(()), 99),
        99
    );

    let diagnostics = handler.get_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Failing() failed: failing fixture");
}

#[test]
fn test_separately_cached_uses_node_storage() {
    reset_counters();
    let leaf = TreeNode::leaf("leaf");
    let mid = TreeNode::with_children("mid", vec![leaf]);
    let root = TreeNode::with_children("root", vec![mid, TreeNode::leaf("other")]);
    let request = SimpleRequest::<NodeDepth>::new((root.clone(),));

    let (mut evaluator, _) = create_test_evaluator();
    assert_eq!(evaluator.evaluate(&request).unwrap(), 2);
    assert_eq!(calls(Counter::NodeDepth), 4);
    assert_eq!(root.0.cached_depth(), Some(2));
    assert!(evaluator.cache().is_empty());

    assert_eq!(evaluator.evaluate(&request).unwrap(), 2);
    assert_eq!(calls(Counter::NodeDepth), 4);
    assert_eq!(evaluator.metrics().external_cache_hits, 1);

    // The value lives on the node, so a fresh evaluator sees it too
    let (mut fresh, _) = create_test_evaluator();
    assert_eq!(fresh.evaluate(&request).unwrap(), 2);
    assert_eq!(fresh.metrics().computations, 0);
}

#[test]
fn test_stats_reporter_sees_computations_only() {
    let reporter = RecordingStatsReporter::new();
    let (evaluator, _) = create_test_evaluator();
    let mut evaluator = evaluator.with_stats_reporter(reporter.clone());

    evaluator.evaluate(&fibonacci(2)).unwrap();
    evaluator.evaluate(&fibonacci(2)).unwrap();

    assert_eq!(
        reporter.events(),
        vec![
            StatsEvent::Started {
                kind: "Fibonacci".to_string(),
                inputs: "(2)".to_string()
            },
            StatsEvent::Started {
                kind: "Fibonacci".to_string(),
                inputs: "(1)".to_string()
            },
            StatsEvent::Finished {
                kind: "Fibonacci".to_string()
            },
            StatsEvent::Started {
                kind: "Fibonacci".to_string(),
                inputs: "(0)".to_string()
            },
            StatsEvent::Finished {
                kind: "Fibonacci".to_string()
            },
            StatsEvent::Finished {
                kind: "Fibonacci".to_string()
            },
        ]
    );
}

#[test]
fn test_request_display() {
    assert_eq!(square(3.0).to_string(), "Square(3.0)");
    assert_eq!(fibonacci(8).to_string(), "Fibonacci(8)");
    assert_eq!(SimpleRequest::<Failing>::new(()).to_string(), "Failing()");
}
