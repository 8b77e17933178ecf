//! Mock implementations for testing

use reqeval_core::stats::StatsReporter;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsEvent {
    Started { kind: String, inputs: String },
    Finished { kind: String },
}

/// A stats reporter that records every notification in order
#[derive(Debug, Default)]
pub struct RecordingStatsReporter {
    events: Mutex<Vec<StatsEvent>>,
}

impl RecordingStatsReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<StatsEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Kinds whose computation started, in order
    pub fn started_kinds(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                StatsEvent::Started { kind, .. } => Some(kind.clone()),
                StatsEvent::Finished { .. } => None,
            })
            .collect()
    }
}

impl StatsReporter for RecordingStatsReporter {
    fn request_started(&self, kind: &str, inputs: &str) {
        self.events.lock().unwrap().push(StatsEvent::Started {
            kind: kind.to_string(),
            inputs: inputs.to_string(),
        });
    }

    fn request_finished(&self, kind: &str, _elapsed: Duration) {
        self.events.lock().unwrap().push(StatsEvent::Finished {
            kind: kind.to_string(),
        });
    }
}
