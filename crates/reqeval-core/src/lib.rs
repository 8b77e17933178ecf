pub mod config;
pub mod di;
pub mod diagnostics;
pub mod display;
pub mod errors;
pub mod evaluator;
pub mod request;
pub mod span;
pub mod stats;
pub mod type_id;

pub use config::{CliOverrides, EvaluatorConfig, EvaluatorOptions};
pub use di::Container;
pub use diagnostics::{
    error_codes, Diag, Diagnostic, DiagnosticCode, DiagnosticHandler, DiagnosticLevel,
};
pub use display::SimpleDisplay;
pub use errors::ConfigError;
pub use evaluator::{
    CycleError, EvaluationError, Evaluator, EvaluatorMetrics, ResultCache,
};
pub use request::{
    caching, AnyRequest, CacheKind, CachePolicy, ExternalCache, Real, RequestInputs, RequestKind,
    SimpleRequest,
};
pub use span::Span;
pub use stats::{FrontendStatsTracer, StatsReporter, UnifiedStatsReporter};
pub use type_id::{identity_of, TypeIdentified, TypeIdentity, TypeRegistry, ZoneId};
