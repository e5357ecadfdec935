//! Configuration types

use crate::{ConfigError, StageCacheResult};
use serde::{Deserialize, Serialize};

/// Per-cache configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Label emitted in diagnostic output; `None` falls back to the
    /// instance identity
    pub debug_name: Option<String>,
    /// Emit a tracing event for every find, insert, erase and clear
    pub trace: bool,
}

impl CacheConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `STAGECACHE_DEBUG_NAME`: debug name for the cache (default: unset)
    /// - `STAGECACHE_TRACE`: `1` or `true` enables operation tracing (default: off)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            debug_name: std::env::var("STAGECACHE_DEBUG_NAME")
                .ok()
                .filter(|s| !s.is_empty())
                .or(defaults.debug_name),
            trace: std::env::var("STAGECACHE_TRACE")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.trace),
        }
    }

    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = Some(name.into());
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> StageCacheResult<()> {
        if let Some(name) = &self.debug_name {
            Self::validate_debug_name(name)?;
        }
        Ok(())
    }

    /// Check a debug name, however it is supplied.
    ///
    /// Debug names end up in single-line diagnostic output, so they may not
    /// contain control characters.
    pub fn validate_debug_name(name: &str) -> StageCacheResult<()> {
        if name.chars().any(char::is_control) {
            return Err(ConfigError::InvalidValue {
                field: "debug_name".to_string(),
                value: name.escape_debug().to_string(),
                reason: "debug_name must not contain control characters".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StageCacheError;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.debug_name, None);
        assert!(!config.trace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::default()
            .with_debug_name("shots")
            .with_trace(true);
        assert_eq!(config.debug_name.as_deref(), Some("shots"));
        assert!(config.trace);
    }

    #[test]
    fn test_validate_rejects_control_characters() {
        let config = CacheConfig::default().with_debug_name("bad\nname");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, StageCacheError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "debug_name"));
    }

    #[test]
    fn test_validate_debug_name_directly() {
        assert!(CacheConfig::validate_debug_name("").is_ok());
        assert!(CacheConfig::validate_debug_name("shots/seq 010").is_ok());
        assert!(CacheConfig::validate_debug_name("a\tb").is_err());
    }

    // The only test touching these variables, so it cannot race another test.
    #[test]
    fn test_from_env() {
        const NAME: &str = "STAGECACHE_DEBUG_NAME";
        const TRACE: &str = "STAGECACHE_TRACE";

        std::env::remove_var(NAME);
        std::env::remove_var(TRACE);
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        std::env::set_var(NAME, "shots");
        std::env::set_var(TRACE, "1");
        let config = CacheConfig::from_env();
        assert_eq!(config.debug_name.as_deref(), Some("shots"));
        assert!(config.trace);

        std::env::set_var(TRACE, "true");
        assert!(CacheConfig::from_env().trace);

        for off in ["0", "false", "yes", "TRUE", ""] {
            std::env::set_var(TRACE, off);
            assert!(!CacheConfig::from_env().trace, "{:?} enabled tracing", off);
        }

        std::env::set_var(NAME, "");
        assert_eq!(CacheConfig::from_env().debug_name, None);

        std::env::remove_var(NAME);
        std::env::remove_var(TRACE);
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());
    }

    #[test]
    fn test_config_serde() {
        let config = CacheConfig::default().with_debug_name("x").with_trace(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
