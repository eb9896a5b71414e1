// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Startup registration of the CQL instrumentation.
//!
//! The host builds its statement logger, wraps it in a [`CallSite`], and hands
//! it to [`Registration::install`] during startup. The site is rebound to an
//! [`Instrumented`] logger only when the CQL client is present and no
//! configuration flag disables the instrumentation. Installing into a site
//! that is already instrumented leaves it as it is.

use tracing::{debug, info};

use crate::config::{DisableFlag, InstrumentationConfig};
use crate::instrumentation::{Instrumentation, Instrumented, StatementLogger};

/// Reports whether the instrumented client is part of the running process.
pub trait TargetDetector: Send + Sync {
    fn is_loaded(&self) -> bool;
}

impl<F> TargetDetector for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_loaded(&self) -> bool {
        self()
    }
}

/// Result of an installation attempt. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    AlreadyInstalled,
    TargetMissing,
    Disabled(DisableFlag),
}

/// The client's logging call site, either as shipped or instrumented.
#[derive(Debug, Clone)]
pub enum CallSite<L> {
    Original(L),
    Instrumented(Instrumented<L>),
}

impl<L> CallSite<L> {
    pub fn new(logger: L) -> Self {
        CallSite::Original(logger)
    }

    pub fn is_instrumented(&self) -> bool {
        matches!(self, CallSite::Instrumented(_))
    }

    /// The undecorated logger, whichever variant is active.
    pub fn original(&self) -> &L {
        match self {
            CallSite::Original(logger) => logger,
            CallSite::Instrumented(instrumented) => instrumented.inner(),
        }
    }

    pub fn into_original(self) -> L {
        match self {
            CallSite::Original(logger) => logger,
            CallSite::Instrumented(instrumented) => instrumented.into_inner(),
        }
    }
}

impl<L: StatementLogger> StatementLogger for CallSite<L> {
    fn log<T, F>(&self, label: &str, statement: &str, execute: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self {
            CallSite::Original(logger) => logger.log(label, statement, execute),
            CallSite::Instrumented(instrumented) => instrumented.log(label, statement, execute),
        }
    }
}

/// Decides at startup whether the instrumentation goes in.
#[derive(Debug)]
pub struct Registration<D> {
    config: InstrumentationConfig,
    detector: D,
}

impl<D: TargetDetector> Registration<D> {
    pub const NAME: &'static str = "cql";

    pub fn new(config: InstrumentationConfig, detector: D) -> Self {
        Self { config, detector }
    }

    pub fn config(&self) -> &InstrumentationConfig {
        &self.config
    }

    /// Why installation would be skipped, or `None` when both the target
    /// and the configuration allow it.
    pub fn blocked_by(&self) -> Option<InstallOutcome> {
        if !self.detector.is_loaded() {
            return Some(InstallOutcome::TargetMissing);
        }
        self.config.disabled_by().map(InstallOutcome::Disabled)
    }

    /// Rebinds `site` to an instrumented logger when allowed.
    ///
    /// Returns the site to keep using together with what happened.
    pub fn install<L>(
        &self,
        site: CallSite<L>,
        instrumentation: &Instrumentation,
    ) -> (CallSite<L>, InstallOutcome) {
        if site.is_instrumented() {
            return (site, InstallOutcome::AlreadyInstalled);
        }

        if let Some(outcome) = self.blocked_by() {
            debug!(
                "Skipping {} instrumentation: {:?}",
                Self::NAME,
                outcome
            );
            return (site, outcome);
        }

        info!("Installing CQL instrumentation");
        let logger = site.into_original();
        (
            CallSite::Instrumented(Instrumented::new(logger, instrumentation.clone())),
            InstallOutcome::Installed,
        )
    }
}
