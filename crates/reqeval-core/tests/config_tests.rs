use indoc::indoc;
use reqeval_core::config::{CliOverrides, EvaluatorConfig};
use reqeval_core::diagnostics::DiagnosticHandler;
use reqeval_core::errors::ConfigError;
use reqeval_core::request::SimpleRequest;
use reqeval_test_helpers::create_test_container;
use reqeval_test_helpers::fixtures::{fibonacci, CycleA};
use std::fs;

#[test]
fn test_yaml_config_drives_container() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reqeval.yaml");
    fs::write(
        &path,
        indoc! {"
            evaluatorOptions:
              recordDependencies: true
              collectStatistics: true
        "},
    )
    .unwrap();

    let config = EvaluatorConfig::from_file(&path).unwrap();
    let (container, _) = create_test_container(config);
    let mut evaluator = container.evaluator();

    assert_eq!(evaluator.evaluate(&fibonacci(5)).unwrap(), 5);
    assert!(evaluator.dependencies().is_some());

    let stats = container.stats().unwrap();
    assert_eq!(stats.stats_for("Fibonacci").map(|s| s.calls), Some(6));
    assert!(stats.summary().contains("Fibonacci: 6 computations"));
}

#[test]
fn test_json_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reqeval.json");
    fs::write(&path, r#"{ "evaluatorOptions": { "debugCycles": true } }"#).unwrap();

    let config = EvaluatorConfig::from_file(&path).unwrap();
    assert!(config.evaluator_options.debug_cycles);
    assert!(!config.evaluator_options.record_dependencies);
}

#[test]
fn test_invalid_yaml_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yml");
    fs::write(&path, "evaluatorOptions: [not, a, map]").unwrap();

    assert!(matches!(
        EvaluatorConfig::from_file(&path),
        Err(ConfigError::Yaml(_))
    ));
}

#[test]
fn test_missing_file_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result = EvaluatorConfig::from_file(&dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_cli_overrides_win() {
    let mut config = EvaluatorConfig::default();
    config.merge_with_cli(&CliOverrides {
        record_dependencies: Some(true),
        ..CliOverrides::default()
    });

    let (container, _) = create_test_container(config);
    assert!(container.evaluator().dependencies().is_some());
}

#[test]
fn test_container_counts_cycle_errors() {
    let (container, handler) = create_test_container(EvaluatorConfig::default());
    let mut evaluator = container.evaluator();

    assert!(evaluator.evaluate(&SimpleRequest::<CycleA>::new((1,))).is_err());
    assert!(container.has_errors());
    assert_eq!(container.error_count(), 1);
    assert_eq!(container.warning_count(), 0);
    assert_eq!(handler.get_diagnostics().len(), 3);
}
