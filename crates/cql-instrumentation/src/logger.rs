// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log setup for hosts that do not install their own subscriber.

use tracing_subscriber::EnvFilter;

use crate::config::InstrumentationConfig;
use crate::error::ConfigError;

/// Installs a global fmt subscriber filtered at `config.log_level`.
///
/// Fails if the level is invalid or a global subscriber is already set.
pub fn init(config: &InstrumentationConfig) -> Result<(), ConfigError> {
    config.validate()?;

    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| ConfigError::Logger(format!("could not parse log level: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_level(true)
        .with_target(false)
        .with_thread_names(false)
        .with_thread_ids(false)
        .try_init()
        .map_err(|e| ConfigError::Logger(e.to_string()))
}
