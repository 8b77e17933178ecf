use reqeval_core::request::{AnyRequest, SimpleRequest};
use reqeval_test_helpers::create_recording_evaluator;
use reqeval_test_helpers::fixtures::{fibonacci, CycleA};

#[test]
fn test_fibonacci_tree() {
    let (mut evaluator, _) = create_recording_evaluator();
    evaluator.evaluate(&fibonacci(3)).unwrap();

    let printed = evaluator.print_dependencies(&fibonacci(3)).unwrap();
    insta::assert_snapshot!(printed, @r"
    `--Fibonacci(3)
       |--Fibonacci(2)
       |  |--Fibonacci(1)
       |  `--Fibonacci(0)
       `--Fibonacci(1)
    ");
}

#[test]
fn test_repeated_subtree_elided() {
    let (mut evaluator, _) = create_recording_evaluator();
    evaluator.evaluate(&fibonacci(4)).unwrap();

    let printed = evaluator.print_dependencies(&fibonacci(4)).unwrap();
    insta::assert_snapshot!(printed, @r"
    `--Fibonacci(4)
       |--Fibonacci(3)
       |  |--Fibonacci(2)
       |  |  |--Fibonacci(1)
       |  |  `--Fibonacci(0)
       |  `--Fibonacci(1)
       `--Fibonacci(2) (elided)
    ");
}

#[test]
fn test_cache_hits_are_recorded() {
    let (mut evaluator, _) = create_recording_evaluator();
    evaluator.evaluate(&fibonacci(2)).unwrap();
    evaluator.evaluate(&fibonacci(5)).unwrap();

    let recorder = evaluator.dependencies().unwrap();
    let roots: Vec<_> = recorder.roots().map(ToString::to_string).collect();
    assert_eq!(roots, vec!["Fibonacci(2)", "Fibonacci(5)"]);
    // Fibonacci(3) asked for Fibonacci(2) after the first root cached it
    let deps: Vec<_> = recorder
        .dependencies_of(&AnyRequest::new(fibonacci(3)))
        .into_iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(deps, vec!["Fibonacci(2)", "Fibonacci(1)"]);
}

#[test]
fn test_cycle_marked_in_tree() {
    let (mut evaluator, _) = create_recording_evaluator();
    assert!(evaluator
        .evaluate(&SimpleRequest::<CycleA>::new((1,)))
        .is_err());

    let printed = evaluator.dependencies().unwrap().print_all();
    insta::assert_snapshot!(printed, @r"
    `--CycleA(1)
       `--CycleB(1)
          `--CycleA(1) (cyclic dependency)
    ");
}

#[test]
fn test_graphviz_output() {
    let (mut evaluator, _) = create_recording_evaluator();
    evaluator.evaluate(&fibonacci(3)).unwrap();

    let dot = evaluator.dump_dependencies_graphviz().unwrap();
    insta::assert_snapshot!(dot, @r#"
    digraph Dependencies {
      request_0 [label="Fibonacci(3)"];
      request_1 [label="Fibonacci(2)"];
      request_2 [label="Fibonacci(1)"];
      request_3 [label="Fibonacci(0)"];

      request_0 -> request_1;
      request_0 -> request_2;
      request_1 -> request_2;
      request_1 -> request_3;
    }
    "#);
}
