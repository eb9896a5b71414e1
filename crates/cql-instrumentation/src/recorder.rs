// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Stand-in collaborators for hosts that run without an agent.
//!
//! [`LoggingRecorder`] turns every report into a `debug` event and
//! [`StaticState`] answers the transaction-state questions with fixed values.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::agent::{
    AgentHandle, FullSampleRecorder, MetricRecorder, SlowSampleRecorder, SqlSample,
    TransactionState,
};
use crate::error::ReportError;
use crate::metric::MetricSet;

/// Fixed transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticState {
    pub tracing_enabled: bool,
    pub in_tracked_context: bool,
}

impl StaticState {
    /// Tracing on, outside any tracked transaction.
    pub fn background() -> Self {
        Self {
            tracing_enabled: true,
            in_tracked_context: false,
        }
    }

    /// Tracing on, inside a tracked (web) transaction.
    pub fn tracked() -> Self {
        Self {
            tracing_enabled: true,
            in_tracked_context: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            tracing_enabled: false,
            in_tracked_context: false,
        }
    }
}

impl TransactionState for StaticState {
    fn is_tracing_enabled(&self) -> bool {
        self.tracing_enabled
    }

    fn is_in_tracked_context(&self) -> bool {
        self.in_tracked_context
    }
}

/// Emits each report as a `debug` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRecorder;

impl LoggingRecorder {
    /// An [`AgentHandle`] whose recorders are all a `LoggingRecorder`.
    pub fn agent(state: impl TransactionState + 'static) -> AgentHandle {
        let recorder = Arc::new(LoggingRecorder);
        AgentHandle::new(Arc::new(state), recorder.clone(), recorder.clone(), recorder)
    }
}

impl MetricRecorder for LoggingRecorder {
    fn record_scoped(&self, metrics: &MetricSet, elapsed: Duration) -> Result<(), ReportError> {
        let names = metrics
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(",");
        debug!(metrics = %names, elapsed_us = elapsed.as_micros() as u64, "Recorded scoped metrics");
        Ok(())
    }
}

impl SlowSampleRecorder for LoggingRecorder {
    fn record_slow_sample(&self, sample: &SqlSample<'_>) -> Result<(), ReportError> {
        debug!(
            statement = sample.statement,
            label = sample.label,
            elapsed_us = sample.elapsed.as_micros() as u64,
            in_tracked_context = sample.in_tracked_context,
            "Recorded transaction sample"
        );
        Ok(())
    }
}

impl FullSampleRecorder for LoggingRecorder {
    fn record_full_sample(&self, sample: &SqlSample<'_>) -> Result<(), ReportError> {
        debug!(
            statement = sample.statement,
            metric = %sample.metric,
            elapsed_us = sample.elapsed.as_micros() as u64,
            "Recorded sql sample"
        );
        Ok(())
    }
}
