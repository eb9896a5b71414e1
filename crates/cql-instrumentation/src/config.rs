// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use std::env;
use std::fmt;

use crate::error::ConfigError;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// The flag that turned the CQL instrumentation off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableFlag {
    Cql,
    Database,
}

impl DisableFlag {
    pub fn key(&self) -> &'static str {
        match self {
            DisableFlag::Cql => "disable_cql_instrumentation",
            DisableFlag::Database => "disable_database_instrumentation",
        }
    }
}

impl fmt::Display for DisableFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Configuration for the CQL instrumentation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InstrumentationConfig {
    /// Turns off only the CQL instrumentation. Also accepted under the
    /// `disable_cequel_instrumentation` key.
    #[serde(alias = "disable_cequel_instrumentation")]
    pub disable_cql_instrumentation: bool,
    /// Turns off every database instrumentation, CQL included
    pub disable_database_instrumentation: bool,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            disable_cql_instrumentation: false,
            disable_database_instrumentation: false,
            log_level: "info".to_string(),
        }
    }
}

impl InstrumentationConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let disable_cql_instrumentation = env_flag("APM_DISABLE_CQL_INSTRUMENTATION")
            || env_flag("APM_DISABLE_CEQUEL_INSTRUMENTATION");
        let disable_database_instrumentation = env_flag("APM_DISABLE_DATABASE_INSTRUMENTATION");
        let log_level = env::var("APM_LOG_LEVEL")
            .map(|val| val.trim().to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            disable_cql_instrumentation,
            disable_database_instrumentation,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// The first flag that disables the CQL instrumentation, if any.
    pub fn disabled_by(&self) -> Option<DisableFlag> {
        if self.disable_cql_instrumentation {
            Some(DisableFlag::Cql)
        } else if self.disable_database_instrumentation {
            Some(DisableFlag::Database)
        } else {
            None
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|val| matches!(val.trim().to_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false)
}
