//! Ingestion Configuration Module
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for a local run; command-line flags override individual fields.

use carvekit_core::ConfigError;
use std::path::PathBuf;

// ============================================================================
// INGEST CONFIGURATION
// ============================================================================

/// Settings for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Project records are stored under.
    pub project: String,

    /// JSON-lines store file.
    pub store_path: PathBuf,

    // ========================================================================
    // Filters
    // ========================================================================
    /// Keep only dumps whose carve key equals this function name.
    pub target_function: Option<String>,

    /// Keep only dumps captured at this call index.
    pub call_index: Option<u64>,

    // ========================================================================
    // Output
    // ========================================================================
    /// Store raw dump text instead of the canonical form.
    pub raw: bool,

    /// Write `<dump>.processed` with the canonical form next to each dump.
    pub debug: bool,

    /// Emit logs as JSON.
    pub log_json: bool,

    // ========================================================================
    // Record metadata
    // ========================================================================
    /// Input that produced the dumps.
    pub testcase: Option<String>,

    /// Whether that input crashed the target.
    pub is_crash: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            project: "default".to_string(),
            store_path: PathBuf::from("carves.jsonl"),
            target_function: None,
            call_index: None,
            raw: false,
            debug: false,
            log_json: false,
            testcase: None,
            is_crash: false,
        }
    }
}

impl IngestConfig {
    /// Create IngestConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CARVEKIT_PROJECT`: Project name (default: "default")
    /// - `CARVEKIT_STORE_PATH`: Store file (default: "carves.jsonl")
    /// - `CARVEKIT_TARGET_FUNCTION`: Only ingest this function's dumps
    /// - `CARVEKIT_CALL_INDEX`: Only ingest this call index
    /// - `CARVEKIT_RAW`: "true" or "false" (default: false)
    /// - `CARVEKIT_DEBUG`: "true" or "false" (default: false)
    /// - `CARVEKIT_LOG_JSON`: "true" or "false" (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`IngestConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let flag = |key: &str| {
            lookup(key)
                .map(|s| matches!(s.to_lowercase().as_str(), "true" | "1"))
                .unwrap_or(false)
        };

        let call_index = match lookup("CARVEKIT_CALL_INDEX") {
            Some(value) => Some(value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "CARVEKIT_CALL_INDEX".to_string(),
                value: value.clone(),
                reason: "expected a non-negative integer".to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            project: lookup("CARVEKIT_PROJECT").unwrap_or(defaults.project),
            store_path: lookup("CARVEKIT_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            target_function: lookup("CARVEKIT_TARGET_FUNCTION").filter(|s| !s.is_empty()),
            call_index,
            raw: flag("CARVEKIT_RAW"),
            debug: flag("CARVEKIT_DEBUG"),
            log_json: flag("CARVEKIT_LOG_JSON"),
            testcase: None,
            is_crash: false,
        })
    }

    /// Restrict to the first invocation of `function`.
    pub fn unit(mut self, function: impl Into<String>) -> Result<Self, ConfigError> {
        if let Some(index) = self.call_index.filter(|i| *i != 1) {
            return Err(ConfigError::IncompatibleOptions {
                option_a: "unit".to_string(),
                option_b: format!("call_index={}", index),
            });
        }
        self.target_function = Some(function.into());
        self.call_index = Some(1);
        Ok(self)
    }

    /// Whether a dump with this carve key and call index is kept.
    pub fn accepts(&self, function: &str, call_index: u64) -> bool {
        self.target_function.as_deref().map_or(true, |f| f == function)
            && self.call_index.map_or(true, |i| i == call_index)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "project".to_string(),
            });
        }
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "store_path".to_string(),
            });
        }
        if self.is_crash && self.testcase.is_none() {
            return Err(ConfigError::IncompatibleOptions {
                option_a: "is_crash".to_string(),
                option_b: "no testcase".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.project, "default");
        assert!(config.target_function.is_none());
        assert!(!config.raw);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() -> Result<(), ConfigError> {
        let config = IngestConfig::from_lookup(lookup(&[
            ("CARVEKIT_PROJECT", "libpng"),
            ("CARVEKIT_STORE_PATH", "/tmp/png.jsonl"),
            ("CARVEKIT_TARGET_FUNCTION", "png_read_info"),
            ("CARVEKIT_CALL_INDEX", "3"),
            ("CARVEKIT_RAW", "TRUE"),
            ("CARVEKIT_LOG_JSON", "1"),
        ]))?;
        assert_eq!(config.project, "libpng");
        assert_eq!(config.store_path, PathBuf::from("/tmp/png.jsonl"));
        assert_eq!(config.target_function.as_deref(), Some("png_read_info"));
        assert_eq!(config.call_index, Some(3));
        assert!(config.raw);
        assert!(!config.debug);
        assert!(config.log_json);
        Ok(())
    }

    #[test]
    fn test_bad_call_index() {
        let err = IngestConfig::from_lookup(lookup(&[("CARVEKIT_CALL_INDEX", "first")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_unit_mode() -> Result<(), ConfigError> {
        let config = IngestConfig::default().unit("png_read_info")?;
        assert!(config.accepts("png_read_info", 1));
        assert!(!config.accepts("png_read_info", 2));
        assert!(!config.accepts("png_read_row", 1));
        Ok(())
    }

    #[test]
    fn test_unit_mode_conflicting_call_index() {
        let config = IngestConfig {
            call_index: Some(4),
            ..IngestConfig::default()
        };
        assert!(matches!(
            config.unit("f"),
            Err(ConfigError::IncompatibleOptions { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_project() {
        let config = IngestConfig {
            project: " ".to_string(),
            ..IngestConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn test_crash_requires_testcase() {
        let config = IngestConfig {
            is_crash: true,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
