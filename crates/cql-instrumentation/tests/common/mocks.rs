// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock agent collaborators that remember every report

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use cql_instrumentation::{
    agent::{
        AgentHandle, FullSampleRecorder, MetricRecorder, SlowSampleRecorder, SqlSample,
        TransactionState,
    },
    error::ReportError,
    instrumentation::StatementLogger,
    metric::MetricSet,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One report, copied out of the borrowed sample
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Scoped {
        metrics: MetricSet,
        elapsed: Duration,
    },
    Slow {
        statement: String,
        label: String,
        metric: String,
        in_tracked_context: bool,
        explain: String,
        elapsed: Duration,
    },
    Full {
        statement: String,
        label: String,
        metric: String,
        in_tracked_context: bool,
        elapsed: Duration,
    },
}

/// Transaction state with fixed answers that counts how often it is asked
pub struct MockState {
    pub tracing_enabled: bool,
    pub in_tracked_context: bool,
    pub reads: AtomicUsize,
}

impl MockState {
    pub fn new(tracing_enabled: bool, in_tracked_context: bool) -> Self {
        Self {
            tracing_enabled,
            in_tracked_context,
            reads: AtomicUsize::new(0),
        }
    }
}

impl TransactionState for MockState {
    fn is_tracing_enabled(&self) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.tracing_enabled
    }

    fn is_in_tracked_context(&self) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.in_tracked_context
    }
}

/// Stores every report it receives, optionally failing them
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Recorded>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn scoped(&self) -> Vec<MetricSet> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Scoped { metrics, .. } => Some(metrics),
                _ => None,
            })
            .collect()
    }

    pub fn slow_samples(&self) -> Vec<Recorded> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, Recorded::Slow { .. }))
            .collect()
    }

    pub fn full_samples(&self) -> Vec<Recorded> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, Recorded::Full { .. }))
            .collect()
    }

    fn push(&self, event: Recorded) -> Result<(), ReportError> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            return Err(ReportError::Rejected("mock failure".to_string()));
        }
        Ok(())
    }
}

impl MetricRecorder for RecordingSink {
    fn record_scoped(&self, metrics: &MetricSet, elapsed: Duration) -> Result<(), ReportError> {
        self.push(Recorded::Scoped {
            metrics: metrics.clone(),
            elapsed,
        })
    }
}

impl SlowSampleRecorder for RecordingSink {
    fn record_slow_sample(&self, sample: &SqlSample<'_>) -> Result<(), ReportError> {
        self.push(Recorded::Slow {
            statement: sample.statement.to_string(),
            label: sample.label.to_string(),
            metric: sample.metric.to_string(),
            in_tracked_context: sample.in_tracked_context,
            explain: sample.explain(),
            elapsed: sample.elapsed,
        })
    }
}

impl FullSampleRecorder for RecordingSink {
    fn record_full_sample(&self, sample: &SqlSample<'_>) -> Result<(), ReportError> {
        self.push(Recorded::Full {
            statement: sample.statement.to_string(),
            label: sample.label.to_string(),
            metric: sample.metric.to_string(),
            in_tracked_context: sample.in_tracked_context,
            elapsed: sample.elapsed,
        })
    }
}

/// Builds an agent handle whose three recorders share one sink
pub fn mock_agent(
    tracing_enabled: bool,
    in_tracked_context: bool,
) -> (AgentHandle, Arc<MockState>, Arc<RecordingSink>) {
    let state = Arc::new(MockState::new(tracing_enabled, in_tracked_context));
    let sink = Arc::new(RecordingSink::default());
    let agent = AgentHandle::new(state.clone(), sink.clone(), sink.clone(), sink.clone());
    (agent, state, sink)
}

/// Statement logger standing in for the CQL client's request logger
#[derive(Debug, Default)]
pub struct MockRequestLogger {
    pub logged: Mutex<Vec<(String, String)>>,
}

impl MockRequestLogger {
    pub fn logged(&self) -> Vec<(String, String)> {
        self.logged.lock().unwrap().clone()
    }
}

impl StatementLogger for MockRequestLogger {
    fn log<T, F>(&self, label: &str, statement: &str, execute: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.logged
            .lock()
            .unwrap()
            .push((label.to_string(), statement.to_string()));
        execute()
    }
}
