use std::{
    collections::HashMap,
    fmt,
    sync::Mutex,
    time::Duration,
};

/// The service pipelines, each with its own pools and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pipeline {
    Blob,
    Rs,
    Kzg,
}

impl Pipeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::Blob => "blob",
            Pipeline::Rs => "rs",
            Pipeline::Kzg => "kzg",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a request ended. Every request records exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failure,
    RateLimited,
    Cancelled,
}

/// Sink for the service's latency observations and outcome counters.
///
/// Latency stages are `queuing`, `encoding`, `serialization` and `total`.
pub trait Metrics: Send + Sync {
    fn observe_latency(&self, pipeline: Pipeline, stage: &'static str, duration: Duration);

    fn record_outcome(&self, pipeline: Pipeline, outcome: Outcome, data_size: usize);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn observe_latency(&self, _: Pipeline, _: &'static str, _: Duration) {}

    fn record_outcome(&self, _: Pipeline, _: Outcome, _: usize) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutcomeCount {
    pub requests: u64,
    pub bytes: u64,
}

/// Keeps every observation in memory.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    outcomes: Mutex<HashMap<(Pipeline, Outcome), OutcomeCount>>,
    latencies: Mutex<HashMap<(Pipeline, &'static str), Vec<Duration>>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(&self, pipeline: Pipeline, outcome: Outcome) -> OutcomeCount {
        self.outcomes
            .lock()
            .ok()
            .and_then(|outcomes| outcomes.get(&(pipeline, outcome)).copied())
            .unwrap_or_default()
    }

    /// Total number of outcomes recorded for `pipeline`.
    pub fn total_requests(&self, pipeline: Pipeline) -> u64 {
        self.outcomes
            .lock()
            .map(|outcomes| {
                outcomes
                    .iter()
                    .filter(|((p, _), _)| *p == pipeline)
                    .map(|(_, count)| count.requests)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn latencies(&self, pipeline: Pipeline, stage: &str) -> Vec<Duration> {
        self.latencies
            .lock()
            .ok()
            .and_then(|latencies| {
                latencies
                    .iter()
                    .find(|((p, s), _)| *p == pipeline && *s == stage)
                    .map(|(_, observed)| observed.clone())
            })
            .unwrap_or_default()
    }
}

impl Metrics for RecordingMetrics {
    fn observe_latency(&self, pipeline: Pipeline, stage: &'static str, duration: Duration) {
        if let Ok(mut latencies) = self.latencies.lock() {
            latencies.entry((pipeline, stage)).or_default().push(duration);
        }
    }

    fn record_outcome(&self, pipeline: Pipeline, outcome: Outcome, data_size: usize) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            let count = outcomes.entry((pipeline, outcome)).or_default();
            count.requests += 1;
            count.bytes += data_size as u64;
        }
    }
}
