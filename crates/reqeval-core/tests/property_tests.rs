//! Property-based tests for request identity
//!
//! Equality, hashing and display of requests must depend only on the kind
//! and the inputs, never on how or where the request value was built.

use proptest::prelude::*;
use reqeval_core::evaluator::Evaluator;
use reqeval_core::request::{AnyRequest, Real, SimpleRequest};
use reqeval_core::diagnostics::CollectingDiagnosticHandler;
use reqeval_test_helpers::fixtures::{fibonacci, CycleA, Square, SquareUncached};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn equality_follows_inputs(a in 0u32..1000, b in 0u32..1000) {
        prop_assert_eq!(fibonacci(a) == fibonacci(b), a == b);
        prop_assert_eq!(
            AnyRequest::new(fibonacci(a)) == AnyRequest::new(fibonacci(b)),
            a == b
        );
    }

    #[test]
    fn equal_requests_hash_equally(a in any::<u32>()) {
        prop_assert_eq!(hash_of(&fibonacci(a)), hash_of(&fibonacci(a)));
        prop_assert_eq!(
            hash_of(&AnyRequest::new(fibonacci(a))),
            hash_of(&AnyRequest::new(fibonacci(a)))
        );
    }

    #[test]
    fn kinds_with_equal_inputs_differ(a in any::<u32>()) {
        let fib = AnyRequest::new(fibonacci(a));
        let cycle = AnyRequest::new(SimpleRequest::<CycleA>::new((a,)));
        prop_assert_ne!(fib, cycle);
    }

    #[test]
    fn float_inputs_compare_by_bits(x in any::<f64>()) {
        let request = SimpleRequest::<Square>::new((Real(x),));
        prop_assert_eq!(request.clone(), SimpleRequest::<Square>::new((Real(x),)));
        prop_assert_eq!(request.to_string(), format!("Square({:?})", x));
    }

    #[test]
    fn policy_never_changes_results(x in -1.0e6f64..1.0e6) {
        let mut evaluator = Evaluator::new(Arc::new(CollectingDiagnosticHandler::new()));
        let cached = evaluator.evaluate(&SimpleRequest::<Square>::new((Real(x),))).unwrap();
        let again = evaluator.evaluate(&SimpleRequest::<Square>::new((Real(x),))).unwrap();
        let uncached = evaluator
            .evaluate(&SimpleRequest::<SquareUncached>::new((Real(x),)))
            .unwrap();
        prop_assert_eq!(cached, again);
        prop_assert_eq!(cached, uncached);
    }
}
