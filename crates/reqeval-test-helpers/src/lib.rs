//! Test utilities and fixtures for reqeval
//!
//! This crate provides shared request kinds and mocks for the integration
//! tests (tests/ directory) and benchmarks of the other crates.

pub mod fixtures;
pub mod mocks;

use reqeval_core::config::{EvaluatorConfig, EvaluatorOptions};
use reqeval_core::di::Container;
use reqeval_core::diagnostics::CollectingDiagnosticHandler;
use reqeval_core::evaluator::Evaluator;
use std::sync::Arc;

/// An evaluator with default options reporting into a collecting handler
pub fn create_test_evaluator() -> (Evaluator, Arc<CollectingDiagnosticHandler>) {
    create_test_evaluator_with(EvaluatorOptions::default())
}

pub fn create_test_evaluator_with(
    options: EvaluatorOptions,
) -> (Evaluator, Arc<CollectingDiagnosticHandler>) {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let evaluator = Evaluator::new(handler.clone()).with_options(options);
    (evaluator, handler)
}

/// An evaluator that records its dependency graph
pub fn create_recording_evaluator() -> (Evaluator, Arc<CollectingDiagnosticHandler>) {
    create_test_evaluator_with(EvaluatorOptions {
        record_dependencies: true,
        ..EvaluatorOptions::default()
    })
}

pub fn create_test_container(config: EvaluatorConfig) -> (Container, Arc<CollectingDiagnosticHandler>) {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let container = Container::with_dependencies(config, handler.clone());
    (container, handler)
}
