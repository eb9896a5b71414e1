// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Timing and reporting around the CQL client's statement logging hook.
//!
//! [`Instrumentation`] wraps a call, classifies its statement, and reports the
//! elapsed time to the agent once the call finishes. Reporting happens from a
//! drop guard, so it runs whether the call returns normally, returns an error,
//! or unwinds. Reporting is fail-open: a collaborator error or panic is logged
//! and never changes what the wrapped call produced.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cql_instrumentation::instrumentation::{Instrumentation, Instrumented};
//!
//! let instrumentation = Instrumentation::new(agent);
//! let logger = Instrumented::new(request_logger, instrumentation);
//! let rows = logger.log("CQL", "SELECT * FROM users", || session.execute(statement))?;
//! ```

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::warn;

use crate::agent::{cql_explainer, AgentHandle, SqlSample};
use crate::classifier::correctly_encoded;
use crate::error::ReportError;
use crate::metric::{metric_for_cql, statement_metric, MetricName, MetricSet};

/// The logging hook of a CQL client: runs `execute` on behalf of a labelled
/// statement and returns whatever it returns.
pub trait StatementLogger {
    fn log<T, F>(&self, label: &str, statement: &str, execute: F) -> T
    where
        F: FnOnce() -> T;
}

/// Times statements and reports them to the agent collaborators.
#[derive(Debug, Clone)]
pub struct Instrumentation {
    agent: AgentHandle,
}

impl Instrumentation {
    pub fn new(agent: AgentHandle) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }

    /// Runs `original` for `statement`, then reports its timing under
    /// `Database/CQL/<operation>` and the datastore rollups.
    ///
    /// When tracing is disabled `original` runs with no recording at all.
    /// The return value of `original` is passed through untouched, and a
    /// panic in `original` keeps unwinding after the report is made.
    pub fn trace_log<T, F>(&self, label: &str, statement: &str, original: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _scope = self.log_scope(label, statement);
        original()
    }

    /// [`Instrumentation::trace_log`] for statements only available as raw
    /// bytes. Invalid UTF-8 is replaced before classification and sampling.
    pub fn trace_log_bytes<T, F>(&self, label: &str, statement: &[u8], original: F) -> T
    where
        F: FnOnce() -> T,
    {
        let statement = correctly_encoded(statement);
        let _scope = self.log_scope(label, &statement);
        original()
    }

    /// Async form of [`Instrumentation::trace_log`]. The timer spans the
    /// whole future; a future dropped before completion still reports once.
    pub async fn trace_log_async<T, F, Fut>(&self, label: &str, statement: &str, original: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _scope = self.log_scope(label, statement);
        original().await
    }

    /// Tracer for the client's execute-with-consistency path. Only the
    /// scoped `Database/Cassandra/<words>` metric is recorded; no samples.
    pub fn trace_execution<T, F>(&self, statement: &str, original: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _scope = self.execution_scope(statement);
        original()
    }

    /// A panicking state read counts as tracing off.
    fn is_tracing_enabled(&self) -> bool {
        read_state("is_tracing_enabled", || self.agent.state.is_tracing_enabled())
    }

    /// A panicking state read counts as background work.
    fn is_in_tracked_context(&self) -> bool {
        read_state("is_in_tracked_context", || self.agent.state.is_in_tracked_context())
    }

    fn log_scope<'a>(&'a self, label: &'a str, statement: &'a str) -> Option<TimedScope<'a>> {
        if !self.is_tracing_enabled() {
            return None;
        }

        let in_tracked_context = self.is_in_tracked_context();
        let primary = metric_for_cql(statement);
        let metrics = MetricSet::for_call(primary.clone(), in_tracked_context);

        Some(TimedScope {
            agent: &self.agent,
            statement,
            metrics,
            samples: Some(SampleTarget {
                label,
                primary,
                in_tracked_context,
            }),
            start: Instant::now(),
        })
    }

    fn execution_scope<'a>(&'a self, statement: &'a str) -> Option<TimedScope<'a>> {
        if !self.is_tracing_enabled() {
            return None;
        }

        Some(TimedScope {
            agent: &self.agent,
            statement,
            metrics: MetricSet::from_iter([statement_metric(statement)]),
            samples: None,
            start: Instant::now(),
        })
    }
}

/// A [`StatementLogger`] decorated with [`Instrumentation`].
#[derive(Debug, Clone)]
pub struct Instrumented<L> {
    inner: L,
    instrumentation: Instrumentation,
}

impl<L> Instrumented<L> {
    pub fn new(inner: L, instrumentation: Instrumentation) -> Self {
        Self {
            inner,
            instrumentation,
        }
    }

    /// The undecorated logger.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn into_inner(self) -> L {
        self.inner
    }

    pub fn instrumentation(&self) -> &Instrumentation {
        &self.instrumentation
    }
}

impl<L: StatementLogger> StatementLogger for Instrumented<L> {
    fn log<T, F>(&self, label: &str, statement: &str, execute: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.instrumentation
            .trace_log(label, statement, || self.inner.log(label, statement, execute))
    }
}

struct SampleTarget<'a> {
    label: &'a str,
    primary: MetricName,
    in_tracked_context: bool,
}

/// Reports on drop. Created only when tracing is enabled.
struct TimedScope<'a> {
    agent: &'a AgentHandle,
    statement: &'a str,
    metrics: MetricSet,
    samples: Option<SampleTarget<'a>>,
    start: Instant,
}

impl Drop for TimedScope<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();

        if let Some(target) = &self.samples {
            let sample = SqlSample {
                statement: self.statement,
                label: target.label,
                metric: &target.primary,
                metadata: Default::default(),
                elapsed,
                in_tracked_context: target.in_tracked_context,
                explainer: cql_explainer,
            };

            report("transaction sampler", || {
                self.agent.transaction_sampler.record_slow_sample(&sample)
            });
            report("sql sampler", || self.agent.sql_sampler.record_full_sample(&sample));
        }

        report("metric recorder", || {
            self.agent.metrics.record_scoped(&self.metrics, elapsed)
        });
    }
}

/// Runs one collaborator call, containing both errors and panics.
fn report<F>(collaborator: &str, f: F)
where
    F: FnOnce() -> Result<(), ReportError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to report CQL statement to {collaborator}: {e}"),
        Err(_) => warn!("The {collaborator} panicked while reporting a CQL statement"),
    }
}

/// Reads one transaction-state flag, answering `false` if the read panics.
fn read_state<F>(query: &str, f: F) -> bool
where
    F: FnOnce() -> bool,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        warn!("Transaction state panicked in {query}; treating it as false");
        false
    })
}
