// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors a reporting collaborator may return.
///
/// These never reach the caller of an instrumented statement; the wrapper
/// logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Sampler unavailable: {0}")]
    Unavailable(String),

    #[error("Sample rejected: {0}")]
    Rejected(String),
}

/// Errors raised while loading configuration or setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to initialize logger: {0}")]
    Logger(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_error_display() {
        let error = ReportError::Unavailable("agent not connected".to_string());
        assert_eq!(error.to_string(), "Sampler unavailable: agent not connected");

        let error = ReportError::Rejected("buffer full".to_string());
        assert_eq!(error.to_string(), "Sample rejected: buffer full");
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::InvalidConfig("bad log level".to_string());
        assert_eq!(error.to_string(), "Invalid configuration: bad log level");
    }

    #[test]
    fn test_error_debug() {
        let error = ConfigError::Logger("already set".into());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Logger"));
    }
}
