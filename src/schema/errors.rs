//! Schema registry error types
//!
//! Error codes:
//! - EALGIS_INVALID_NAMESPACE
//! - EALGIS_REGISTRY_UNAVAILABLE
//! - EALGIS_INVALID_BUNDLE
//!
//! The registry only ever raises configuration errors. Integrity errors belong
//! to the storage layer (see `crate::store`).

use std::fmt;

/// Broad class an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid or disallowed input (namespace name, configuration)
    Configuration,
    /// The registry itself is unusable (poisoned lock)
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Configuration => write!(f, "ConfigurationError"),
            ErrorClass::Internal => write!(f, "InternalError"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Namespace name is not a valid storage identifier
    EalgisInvalidNamespace,
    /// Registry lock was poisoned by a panicking thread
    EalgisRegistryUnavailable,
    /// Deserialized bundle is inconsistent with its namespace or entity order
    EalgisInvalidBundle,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::EalgisInvalidNamespace => "EALGIS_INVALID_NAMESPACE",
            SchemaErrorCode::EalgisRegistryUnavailable => "EALGIS_REGISTRY_UNAVAILABLE",
            SchemaErrorCode::EalgisInvalidBundle => "EALGIS_INVALID_BUNDLE",
        }
    }

    /// Returns the error class for this code
    pub fn class(&self) -> ErrorClass {
        match self {
            SchemaErrorCode::EalgisInvalidNamespace | SchemaErrorCode::EalgisInvalidBundle => {
                ErrorClass::Configuration
            }
            SchemaErrorCode::EalgisRegistryUnavailable => ErrorClass::Internal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    namespace: Option<String>,
}

impl SchemaError {
    /// Create an invalid namespace error
    pub fn invalid_namespace(namespace: impl Into<String>, reason: impl Into<String>) -> Self {
        let ns = namespace.into();
        Self {
            code: SchemaErrorCode::EalgisInvalidNamespace,
            message: format!("Invalid namespace '{}': {}", ns, reason.into()),
            namespace: Some(ns),
        }
    }

    /// Create a registry unavailable error
    pub fn registry_unavailable() -> Self {
        Self {
            code: SchemaErrorCode::EalgisRegistryUnavailable,
            message: "Schema registry lock poisoned".into(),
            namespace: None,
        }
    }

    /// Create an invalid bundle error
    pub fn invalid_bundle(namespace: impl Into<String>, reason: impl Into<String>) -> Self {
        let ns = namespace.into();
        Self {
            code: SchemaErrorCode::EalgisInvalidBundle,
            message: format!("Invalid bundle for '{}': {}", ns, reason.into()),
            namespace: Some(ns),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error class
    pub fn class(&self) -> ErrorClass {
        self.code.class()
    }

    /// Returns true for `ConfigurationError`s
    pub fn is_configuration(&self) -> bool {
        self.class() == ErrorClass::Configuration
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending namespace if applicable
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.class(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
