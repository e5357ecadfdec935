//! Error types for stage cache operations

use thiserror::Error;

/// Malformed textual input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid stage id {input:?}: {reason}")]
    InvalidStageId { input: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for stage cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StageCacheError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for stage cache operations.
pub type StageCacheResult<T> = Result<T, StageCacheError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = FormatError::InvalidStageId {
            input: "abc".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid stage id"));
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("invalid digit"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "debug_name".to_string(),
            value: "a\\nb".to_string(),
            reason: "must not contain control characters".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("debug_name"));
        assert!(msg.contains("control characters"));
    }

    #[test]
    fn test_stage_cache_error_from_variants() {
        let format = StageCacheError::from(FormatError::InvalidStageId {
            input: String::new(),
            reason: "empty".to_string(),
        });
        assert!(matches!(format, StageCacheError::Format(_)));

        let config = StageCacheError::from(ConfigError::InvalidValue {
            field: "trace".to_string(),
            value: "maybe".to_string(),
            reason: "expected boolean".to_string(),
        });
        assert!(matches!(config, StageCacheError::Config(_)));
        assert!(config.to_string().starts_with("Config error:"));
    }
}
