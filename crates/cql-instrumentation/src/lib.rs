// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Timing and metric tagging for the statement logging hook of a CQL client.
//!
//! Each logged statement is classified by its leading verb, named as
//! `Database/CQL/<operation>` with the `Datastore/all` (and, for background
//! work, `Datastore/allOther`) rollups, timed, and reported to the monitoring
//! agent's metric recorder, transaction sampler and SQL sampler.
//!
//! The agent is never reached through globals: its collaborators are passed
//! in as an [`agent::AgentHandle`]. Instrumentation is fail-open, so the
//! wrapped call's result is always returned exactly as the client produced it.
//!
//! # Example
//!
//! ```
//! use cql_instrumentation::{
//!     config::InstrumentationConfig,
//!     instrumentation::{Instrumentation, StatementLogger},
//!     recorder::{LoggingRecorder, StaticState},
//!     registration::{CallSite, InstallOutcome, Registration},
//! };
//!
//! struct RequestLogger;
//!
//! impl StatementLogger for RequestLogger {
//!     fn log<T, F: FnOnce() -> T>(&self, _label: &str, _statement: &str, execute: F) -> T {
//!         execute()
//!     }
//! }
//!
//! let instrumentation = Instrumentation::new(LoggingRecorder::agent(StaticState::tracked()));
//! let registration = Registration::new(InstrumentationConfig::default(), || true);
//! let (logger, outcome) = registration.install(CallSite::new(RequestLogger), &instrumentation);
//!
//! assert_eq!(outcome, InstallOutcome::Installed);
//! assert_eq!(logger.log("CQL", "SELECT * FROM users", || 3), 3);
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod agent;
pub mod classifier;
pub mod config;
pub mod error;
pub mod instrumentation;
pub mod logger;
pub mod metric;
pub mod recorder;
pub mod registration;
