// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Interfaces of the monitoring agent consumed by the instrumentation.
//!
//! The agent itself lives in the host process. These traits describe the
//! small part of it the CQL instrumentation calls into, and [`AgentHandle`]
//! bundles one implementation of each so it can be injected at construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ReportError;
use crate::metric::{MetricName, MetricSet};

/// Produces an explain plan for a statement, or a message saying why not.
pub type Explainer = fn(&str) -> String;

/// CQL has no explain plans.
pub fn cql_explainer(_statement: &str) -> String {
    "No explain plans support for CQL currently".to_string()
}

/// Per-thread transaction state owned by the agent.
pub trait TransactionState: Send + Sync {
    /// Whether the current execution is being traced at all.
    fn is_tracing_enabled(&self) -> bool;

    /// Whether the current execution belongs to a tracked (web) transaction.
    fn is_in_tracked_context(&self) -> bool;
}

/// Attributes elapsed wall-clock time to each metric in a set.
pub trait MetricRecorder: Send + Sync {
    fn record_scoped(&self, metrics: &MetricSet, elapsed: Duration) -> Result<(), ReportError>;
}

/// The transaction sampler: keeps slow statements attached to the current
/// transaction trace.
pub trait SlowSampleRecorder: Send + Sync {
    fn record_slow_sample(&self, sample: &SqlSample<'_>) -> Result<(), ReportError>;
}

/// The SQL sampler: keeps every statement keyed by its primary metric.
pub trait FullSampleRecorder: Send + Sync {
    fn record_full_sample(&self, sample: &SqlSample<'_>) -> Result<(), ReportError>;
}

/// One timed statement, handed to both sample recorders.
#[derive(Clone)]
pub struct SqlSample<'a> {
    pub statement: &'a str,
    pub label: &'a str,
    pub metric: &'a MetricName,
    pub metadata: HashMap<String, String>,
    pub elapsed: Duration,
    pub in_tracked_context: bool,
    pub explainer: Explainer,
}

impl SqlSample<'_> {
    pub fn explain(&self) -> String {
        (self.explainer)(self.statement)
    }
}

impl fmt::Debug for SqlSample<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlSample")
            .field("statement", &self.statement)
            .field("label", &self.label)
            .field("metric", &self.metric)
            .field("metadata", &self.metadata)
            .field("elapsed", &self.elapsed)
            .field("in_tracked_context", &self.in_tracked_context)
            .finish_non_exhaustive()
    }
}

/// The agent collaborators used by the instrumentation.
#[derive(Clone)]
pub struct AgentHandle {
    pub state: Arc<dyn TransactionState>,
    pub metrics: Arc<dyn MetricRecorder>,
    pub transaction_sampler: Arc<dyn SlowSampleRecorder>,
    pub sql_sampler: Arc<dyn FullSampleRecorder>,
}

impl AgentHandle {
    pub fn new(
        state: Arc<dyn TransactionState>,
        metrics: Arc<dyn MetricRecorder>,
        transaction_sampler: Arc<dyn SlowSampleRecorder>,
        sql_sampler: Arc<dyn FullSampleRecorder>,
    ) -> Self {
        Self {
            state,
            metrics,
            transaction_sampler,
            sql_sampler,
        }
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle").finish_non_exhaustive()
    }
}
