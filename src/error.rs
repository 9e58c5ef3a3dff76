use std::path::PathBuf;

use thiserror::Error;

/// Main error type for every failure the validation core can surface
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status error: {status} for {url} - {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Request timeout: {url} after {timeout_seconds} seconds")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("XML is not well-formed at line {line}, column {column}: {message}")]
    Wellformedness {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Unsupported ERN version: {version}")]
    UnsupportedVersion { version: String },

    #[error("Schema unavailable for ERN {version}: {details}")]
    SchemaUnavailable { version: String, details: String },

    #[error("Schema parsing error: {path} - {details}")]
    SchemaParsing { path: PathBuf, details: String },

    #[error("Schema integrity mismatch for {path}: expected {expected}, found {actual}")]
    IntegrityMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

/// Failures of a schema load.
///
/// Cloneable so that every caller waiting on the same single-flight load
/// observes the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unsupported ERN version: {0}")]
    UnsupportedVersion(String),

    #[error("Schemas for version {version} not found. Please run the schema download script.")]
    Unavailable { version: String },

    #[error("Schema parsing failed for {path}: {details}")]
    Parse { path: String, details: String },

    #[error("Schema download failed for {url}: {details}")]
    Fetch { url: String, details: String },

    #[error("Integrity check failed for {path}: expected {expected}, found {actual}")]
    Integrity {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Configuration-specific error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {details}")]
    InvalidFormat { details: String },

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value: {field} = {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: null pointer returned")]
    SchemaParseFailed,

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Document could not be parsed by libxml2")]
    DocumentParseFailed,

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,
}

/// Failure raised by a single rule predicate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("{0}")]
    Message(String),
}

impl From<ConfigError> for ValidationError {
    fn from(err: ConfigError) -> Self {
        ValidationError::Config(err.to_string())
    }
}

impl From<LibXml2Error> for ValidationError {
    fn from(err: LibXml2Error) -> Self {
        ValidationError::LibXml2Internal {
            details: err.to_string(),
        }
    }
}

impl From<SchemaError> for ValidationError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnsupportedVersion(version) => {
                ValidationError::UnsupportedVersion { version }
            }
            SchemaError::Unavailable { ref version } => ValidationError::SchemaUnavailable {
                version: version.clone(),
                details: err.to_string(),
            },
            SchemaError::Parse { path, details } => ValidationError::SchemaParsing {
                path: PathBuf::from(path),
                details,
            },
            SchemaError::Fetch { url, details } => ValidationError::HttpStatus {
                url,
                status: 0,
                message: details,
            },
            SchemaError::Integrity {
                path,
                expected,
                actual,
            } => ValidationError::IntegrityMismatch {
                path: PathBuf::from(path),
                expected,
                actual,
            },
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;

/// Schema load result type alias
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wellformedness_display_carries_position() {
        let err = ValidationError::Wellformedness {
            line: 3,
            column: 7,
            message: "unexpected end of stream".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("line 3"));
        assert!(text.contains("column 7"));
        assert!(text.contains("unexpected end of stream"));
    }

    #[test]
    fn test_schema_unavailable_message_matches_download_hint() {
        let err = SchemaError::Unavailable {
            version: "4.3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Schemas for version 4.3 not found. Please run the schema download script."
        );

        let converted: ValidationError = err.into();
        match converted {
            ValidationError::SchemaUnavailable { version, details } => {
                assert_eq!(version, "4.3");
                assert!(details.contains("download script"));
            }
            other => panic!("Expected SchemaUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_error_conversion_keeps_unsupported_version() {
        let converted: ValidationError = SchemaError::UnsupportedVersion("5.0".to_string()).into();
        match converted {
            ValidationError::UnsupportedVersion { version } => assert_eq!(version, "5.0"),
            other => panic!("Expected UnsupportedVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_error_is_cloneable_for_waiters() {
        let err = SchemaError::Integrity {
            path: "schemas/ern/4.3/release-notification.xsd".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert_eq!(err.clone(), err);
        assert!(err.to_string().contains("expected aa"));
    }

    #[test]
    fn test_config_error_display() {
        let invalid_value = ConfigError::InvalidValue {
            field: "schemas.cache_capacity".to_string(),
            value: "0".to_string(),
            reason: "must be greater than 0".to_string(),
        };
        let text = invalid_value.to_string();
        assert!(text.contains("Invalid configuration value"));
        assert!(text.contains("schemas.cache_capacity"));
        assert!(text.contains("must be greater than 0"));

        let converted: ValidationError = invalid_value.into();
        assert!(matches!(converted, ValidationError::Config(_)));
    }

    #[test]
    fn test_libxml2_error_conversion() {
        let converted: ValidationError = LibXml2Error::SchemaParseFailed.into();
        match converted {
            ValidationError::LibXml2Internal { details } => {
                assert!(details.contains("Schema parsing failed"))
            }
            other => panic!("Expected LibXml2Internal, got {:?}", other),
        }
    }

    #[test]
    fn test_io_error_source_chain() {
        use std::error::Error;

        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let validation_error = ValidationError::Io(io_error);

        let source = validation_error.source();
        assert!(source.is_some());
        assert_eq!(source.map(|s| s.to_string()).unwrap_or_default(), "File not found");
    }

    #[test]
    fn test_rule_error_display_is_bare_message() {
        let err = RuleError::Message("missing index".to_string());
        assert_eq!(err.to_string(), "missing index");
    }
}
