//! Error types for carvekit operations

use thiserror::Error;

/// Carve artifact name errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("Carve name {name:?} has fewer than two '_' separators")]
    MissingSeparator { name: String },

    #[error("Carve name {name:?} has a non-numeric {segment} segment: {value:?}")]
    InvalidIndex {
        name: String,
        segment: &'static str,
        value: String,
    },

    #[error("Carve name {name:?} has an empty carve key")]
    EmptyKey { name: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Insert failed for {function_name}: {reason}")]
    InsertFailed {
        function_name: String,
        reason: String,
    },

    #[error("Store file {path} is corrupt at line {line}: {reason}")]
    Corrupt {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },
}

/// Master error type for all carvekit errors.
#[derive(Debug, Clone, Error)]
pub enum CarveError {
    #[error("Name error: {0}")]
    Name(#[from] NameError),

    #[error("Context error at line {line}: {reason}")]
    Context { line: usize, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },
}

impl CarveError {
    /// Wrap an I/O failure with the path it happened on.
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        CarveError::Io {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias for carvekit operations.
pub type CarveResult<T> = Result<T, CarveError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_error_display_invalid_index() {
        let err = NameError::InvalidIndex {
            name: "png_read_x_7".to_string(),
            segment: "call index",
            value: "x".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("png_read_x_7"));
        assert!(msg.contains("call index"));
    }

    #[test]
    fn test_storage_error_display_corrupt() {
        let err = StorageError::Corrupt {
            path: "carves.jsonl".to_string(),
            line: 3,
            reason: "expected value".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("carves.jsonl"));
        assert!(msg.contains("line 3"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "CARVEKIT_CALL_INDEX".to_string(),
            value: "first".to_string(),
            reason: "must be an integer".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("CARVEKIT_CALL_INDEX"));
        assert!(msg.contains("first"));
        assert!(msg.contains("must be an integer"));
    }

    #[test]
    fn test_carve_error_from_variants() {
        let name = CarveError::from(NameError::EmptyKey {
            name: "_1_2".to_string(),
        });
        assert!(matches!(name, CarveError::Name(_)));

        let storage = CarveError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, CarveError::Storage(_)));

        let config = CarveError::from(ConfigError::MissingRequired {
            field: "project".to_string(),
        });
        assert!(matches!(config, CarveError::Config(_)));
    }

    #[test]
    fn test_carve_error_io_keeps_path() {
        let err = CarveError::io(
            "/tmp/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = format!("{}", err);
        assert!(msg.contains("/tmp/missing"));
        assert!(msg.contains("gone"));
    }
}
