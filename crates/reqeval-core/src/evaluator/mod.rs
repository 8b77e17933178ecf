//! The demand-driven engine.
//!
//! [`Evaluator::evaluate`] answers a request from a cache when it can and
//! otherwise runs the request's computation, which may recursively evaluate
//! further requests through the same evaluator. Requests currently being
//! computed form the active stack; asking for one of them again is a cycle,
//! diagnosed through the diagnostics handler and reported as a
//! [`CycleError`].

mod cache;
mod dependencies;
mod error;

pub use cache::ResultCache;
pub use dependencies::DependencyRecorder;
pub use error::{CycleError, EvaluationError, Result};

use crate::config::EvaluatorOptions;
use crate::diagnostics::{Diag, DiagnosticHandler};
use crate::display::display_string;
use crate::request::{AnyRequest, CacheKind, RequestKind, SimpleRequest};
use crate::span::Span;
use crate::stats::{FrontendStatsTracer, StatsReporter};
use crate::type_id::{self, ZoneDefinition};
use indexmap::IndexSet;
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::BuildHasherDefault;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Counters describing what an evaluator has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluatorMetrics {
    /// Answers served from the evaluator's own cache
    pub cache_hits: u64,
    /// Answers served from storage owned by the request kind
    pub external_cache_hits: u64,
    /// Computations started
    pub computations: u64,
    /// Computations that returned an error, including errors passed up from
    /// nested requests
    pub failures: u64,
    pub cycles_detected: u64,
}

pub struct Evaluator {
    diagnostics: Arc<dyn DiagnosticHandler>,
    stats: Option<Arc<dyn StatsReporter>>,
    options: EvaluatorOptions,
    cache: ResultCache,
    active: IndexSet<AnyRequest, BuildHasherDefault<FxHasher>>,
    dependencies: Option<DependencyRecorder>,
    metrics: EvaluatorMetrics,
    /// Zones already checked against the global registry
    registered_zones: FxHashSet<*const ZoneDefinition>,
}

impl Evaluator {
    pub fn new(diagnostics: Arc<dyn DiagnosticHandler>) -> Self {
        Self {
            diagnostics,
            stats: None,
            options: EvaluatorOptions::default(),
            cache: ResultCache::new(),
            active: IndexSet::default(),
            dependencies: None,
            metrics: EvaluatorMetrics::default(),
            registered_zones: FxHashSet::default(),
        }
    }

    pub fn with_options(mut self, options: EvaluatorOptions) -> Self {
        self.dependencies = options
            .record_dependencies
            .then(DependencyRecorder::new);
        self.options = options;
        self
    }

    pub fn with_stats_reporter(mut self, reporter: Arc<dyn StatsReporter>) -> Self {
        self.stats = Some(reporter);
        self
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostics
    }

    /// Evaluate a request, computing it only when no cached answer exists.
    ///
    /// Failures are never cached: evaluating a failed request again runs
    /// its computation again, and a cycle is diagnosed again every time it
    /// is hit.
    ///
    /// # Panics
    /// Panics when `K`'s zone id is already claimed by another zone.
    pub fn evaluate<K: RequestKind>(&mut self, request: &SimpleRequest<K>) -> Result<K::Output> {
        self.register_kind::<K>();

        if let Some(recorder) = self.dependencies.as_mut() {
            recorder.record(self.active.last(), &AnyRequest::new(request.clone()));
        }

        match SimpleRequest::<K>::CACHING {
            CacheKind::Cached => {
                if let Some(value) = self.cache.get::<K>(request.inputs()) {
                    self.metrics.cache_hits += 1;
                    debug!(request = %request, "cache hit");
                    return Ok(value.clone());
                }
            }
            CacheKind::SeparatelyCached => {
                if let Some(value) = request.cached_result() {
                    self.metrics.external_cache_hits += 1;
                    debug!(request = %request, "external cache hit");
                    return Ok(value);
                }
            }
            CacheKind::Uncached => {}
        }

        let erased = AnyRequest::new(request.clone());
        if let Some(index) = self.active.get_index_of(&erased) {
            return Err(self.diagnose_cycle(index, &erased).into());
        }

        self.active.insert(erased);
        trace!(depth = self.active.len(), request = %request, "push");

        self.metrics.computations += 1;
        debug!(request = %request, "computing");
        let tracer = self.stats.clone().map(|reporter| {
            FrontendStatsTracer::new(reporter, K::type_name(), &display_string(request.inputs()))
        });
        let result = request.evaluate_request(self);
        drop(tracer);

        self.active.pop();
        trace!(depth = self.active.len(), request = %request, "pop");

        match result {
            Ok(value) => {
                match SimpleRequest::<K>::CACHING {
                    CacheKind::Cached => {
                        self.cache.insert::<K>(request.inputs().clone(), value.clone());
                    }
                    CacheKind::SeparatelyCached => request.cache_result(value.clone()),
                    CacheKind::Uncached => {}
                }
                Ok(value)
            }
            Err(error) => {
                self.metrics.failures += 1;
                debug!(request = %request, %error, "computation failed");
                Err(error)
            }
        }
    }

    /// Evaluate a request, falling back to `default` on failure.
    ///
    /// Cycles have already been diagnosed when they surface here; other
    /// failures are reported to the diagnostics handler before the default
    /// is returned.
    pub fn evaluate_or_default<K: RequestKind>(
        &mut self,
        request: &SimpleRequest<K>,
        default: K::Output,
    ) -> K::Output {
        match self.evaluate(request) {
            Ok(value) => value,
            Err(EvaluationError::Cycle(_)) => default,
            Err(EvaluationError::Computation(error)) => {
                self.diagnostics.diagnose(
                    Span::dummy(),
                    &Diag::REQUEST_FAILED,
                    &[request.to_string(), format!("{:#}", error)],
                );
                default
            }
        }
    }

    /// Register `K`'s zone the first time this evaluator sees it, so that
    /// two zones sharing an id are caught before their kinds share a cache
    /// table
    fn register_kind<K: RequestKind>(&mut self) {
        let zone = K::zone();
        if self.registered_zones.insert(zone as *const ZoneDefinition) {
            type_id::register::<K>();
        }
    }

    /// Emit the primary diagnostic on the re-entered request and a note for
    /// every step from there to the top of the stack, then for the
    /// rejected request itself.
    fn diagnose_cycle(&mut self, index: usize, request: &AnyRequest) -> CycleError {
        self.metrics.cycles_detected += 1;
        let diags = self.diagnostics.as_ref();

        let mut chain = Vec::with_capacity(self.active.len() - index + 1);
        for (position, step) in self.active.iter().enumerate().skip(index) {
            if position == index {
                step.diagnose_cycle(diags);
            } else {
                step.note_cycle_step(diags);
            }
            chain.push(step.to_string());
        }
        request.note_cycle_step(diags);
        chain.push(request.to_string());

        let error = CycleError {
            request: request.to_string(),
            chain,
        };
        if self.options.debug_cycles {
            warn!(request = %request, "{}", error);
        } else {
            debug!(request = %request, "cycle detected");
        }
        error
    }

    /// Whether `request` is currently being computed
    pub fn has_active_request<K: RequestKind>(&self, request: &SimpleRequest<K>) -> bool {
        self.active.contains(&AnyRequest::new(request.clone()))
    }

    /// Whether the evaluator's own cache holds an answer for `request`.
    ///
    /// Always `false` for kinds that are not `Cached`.
    pub fn has_cached_result<K: RequestKind>(&self, request: &SimpleRequest<K>) -> bool {
        self.cache.contains::<K>(request.inputs())
    }

    pub fn active_depth(&self) -> usize {
        self.active.len()
    }

    /// Display forms of the active requests, outermost first
    pub fn active_requests(&self) -> Vec<String> {
        self.active.iter().map(ToString::to_string).collect()
    }

    pub fn metrics(&self) -> EvaluatorMetrics {
        self.metrics
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The recorded dependency graph, if recording is enabled
    pub fn dependencies(&self) -> Option<&DependencyRecorder> {
        self.dependencies.as_ref()
    }

    pub fn print_dependencies<K: RequestKind>(&self, request: &SimpleRequest<K>) -> Option<String> {
        let recorder = self.dependencies.as_ref()?;
        Some(recorder.print_dependencies(&AnyRequest::new(request.clone())))
    }

    pub fn dump_dependencies_graphviz(&self) -> Option<String> {
        self.dependencies.as_ref().map(DependencyRecorder::to_graphviz)
    }
}
