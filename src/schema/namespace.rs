//! Namespace handle
//!
//! A namespace is the PostgreSQL schema every table of one bundle lives in.
//! Names are restricted to identifiers that never need quoting.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{SchemaError, SchemaResult};

/// PostgreSQL truncates identifiers beyond NAMEDATALEN - 1 bytes.
pub const MAX_NAMESPACE_LEN: usize = 63;

const RESERVED_NAMESPACES: &[&str] = &["public", "information_schema"];

/// A validated namespace name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Validates `name` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` (EALGIS_INVALID_NAMESPACE) when `name`
    /// is empty, too long, reserved, or contains characters outside
    /// `[a-z0-9_]` (first character must not be a digit).
    pub fn new(name: &str) -> SchemaResult<Self> {
        validate(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix for namespaced entity type names: underscores removed,
    /// upper-cased (`survey_2016` -> `SURVEY2016`).
    pub fn type_prefix(&self) -> String {
        self.0.replace('_', "").to_ascii_uppercase()
    }

    /// `<namespace>.<table>`
    pub fn qualify(&self, table: &str) -> String {
        format!("{}.{}", self.0, table)
    }
}

fn validate(name: &str) -> SchemaResult<()> {
    if name.is_empty() {
        return Err(SchemaError::invalid_namespace(name, "name is empty"));
    }

    if name.len() > MAX_NAMESPACE_LEN {
        return Err(SchemaError::invalid_namespace(
            name,
            format!("longer than {} bytes", MAX_NAMESPACE_LEN),
        ));
    }

    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !(first.is_ascii_lowercase() || first == '_') {
            return Err(SchemaError::invalid_namespace(
                name,
                format!("must start with a lower-case letter or '_', found '{}'", first),
            ));
        }
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')) {
        return Err(SchemaError::invalid_namespace(
            name,
            format!("disallowed character '{}'", bad),
        ));
    }

    if name.starts_with("pg_") {
        return Err(SchemaError::invalid_namespace(name, "'pg_' prefix is reserved"));
    }

    if RESERVED_NAMESPACES.contains(&name) {
        return Err(SchemaError::invalid_namespace(name, "reserved namespace"));
    }

    Ok(())
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Namespace {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value))
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}
