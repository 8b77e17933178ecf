use crate::config::EvaluatorConfig;
use crate::diagnostics::{ConsoleDiagnosticHandler, DiagnosticHandler};
use crate::evaluator::Evaluator;
use crate::stats::{StatsReporter, UnifiedStatsReporter};
use std::sync::Arc;

/// Dependency injection container
/// Manages all shared dependencies and creates evaluators with proper wiring
pub struct Container {
    config: Arc<EvaluatorConfig>,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
    stats: Option<Arc<UnifiedStatsReporter>>,
}

impl Container {
    /// Create a new container with production dependencies
    pub fn new(config: EvaluatorConfig) -> Self {
        let diagnostic_handler = Arc::new(ConsoleDiagnosticHandler::new(
            config.evaluator_options.pretty,
        ));

        Self::with_dependencies(config, diagnostic_handler)
    }

    /// Create a container with a custom diagnostic handler (for testing)
    pub fn with_dependencies(
        config: EvaluatorConfig,
        diagnostic_handler: Arc<dyn DiagnosticHandler>,
    ) -> Self {
        let stats = config
            .evaluator_options
            .collect_statistics
            .then(|| Arc::new(UnifiedStatsReporter::new()));

        Container {
            config: Arc::new(config),
            diagnostic_handler,
            stats,
        }
    }

    /// Create an evaluator wired to this container's configuration,
    /// diagnostics and statistics. Evaluators share nothing else; each has
    /// its own cache and active stack.
    pub fn evaluator(&self) -> Evaluator {
        self.evaluator_reporting_to(self.diagnostic_handler.clone())
    }

    /// Like [`Container::evaluator`], but reporting diagnostics to
    /// `diagnostics`, e.g. to keep the output of parallel workers apart
    pub fn evaluator_reporting_to(&self, diagnostics: Arc<dyn DiagnosticHandler>) -> Evaluator {
        let evaluator =
            Evaluator::new(diagnostics).with_options(self.config.evaluator_options.clone());

        match &self.stats {
            Some(stats) => evaluator.with_stats_reporter(stats.clone() as Arc<dyn StatsReporter>),
            None => evaluator,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Arc<EvaluatorConfig> {
        &self.config
    }

    /// Get the diagnostic handler
    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }

    /// Statistics shared by every evaluator, if collection is enabled
    pub fn stats(&self) -> Option<&Arc<UnifiedStatsReporter>> {
        self.stats.as_ref()
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.diagnostic_handler.has_errors()
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.diagnostic_handler.error_count()
    }

    /// Get the warning count
    pub fn warning_count(&self) -> usize {
        self.diagnostic_handler.warning_count()
    }
}
