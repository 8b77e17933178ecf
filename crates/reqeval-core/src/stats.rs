//! Observational statistics about evaluated requests.

use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Receives a notification around every request computation.
///
/// Reporters only observe; nothing they do affects evaluation.
pub trait StatsReporter: Send + Sync {
    fn request_started(&self, kind: &str, inputs: &str);
    fn request_finished(&self, kind: &str, elapsed: Duration);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStats {
    pub calls: u64,
    pub total_time: Duration,
}

/// Aggregates call counts and time per request kind
#[derive(Debug, Default)]
pub struct UnifiedStatsReporter {
    entries: Mutex<IndexMap<String, RequestStats>>,
}

impl UnifiedStatsReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-kind totals, in the order each kind was first computed
    pub fn stats(&self) -> Vec<(String, RequestStats)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(kind, stats)| (kind.clone(), *stats))
            .collect()
    }

    pub fn stats_for(&self, kind: &str) -> Option<RequestStats> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .copied()
    }

    pub fn summary(&self) -> String {
        let mut out = String::from("request statistics:\n");
        for (kind, stats) in self.stats() {
            let _ = writeln!(
                out,
                "  {}: {} computations, {:.3}ms",
                kind,
                stats.calls,
                stats.total_time.as_secs_f64() * 1000.0
            );
        }
        out
    }
}

impl StatsReporter for UnifiedStatsReporter {
    fn request_started(&self, kind: &str, _inputs: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get_mut(kind) {
            Some(stats) => stats.calls += 1,
            None => {
                entries.insert(
                    kind.to_string(),
                    RequestStats {
                        calls: 1,
                        total_time: Duration::ZERO,
                    },
                );
            }
        }
    }

    fn request_finished(&self, kind: &str, elapsed: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stats) = entries.get_mut(kind) {
            stats.total_time += elapsed;
        }
    }
}

/// Reports the start of a computation on creation and its end on drop
pub struct FrontendStatsTracer {
    reporter: Arc<dyn StatsReporter>,
    kind: Cow<'static, str>,
    start: Instant,
}

impl FrontendStatsTracer {
    pub fn new(reporter: Arc<dyn StatsReporter>, kind: Cow<'static, str>, inputs: &str) -> Self {
        reporter.request_started(&kind, inputs);
        Self {
            reporter,
            kind,
            start: Instant::now(),
        }
    }
}

impl Drop for FrontendStatsTracer {
    fn drop(&mut self) {
        self.reporter
            .request_finished(&self.kind, self.start.elapsed());
    }
}
