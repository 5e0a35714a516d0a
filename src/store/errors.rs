//! # Store Errors

use std::fmt;

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Which integrity rule a write or lookup broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityKind {
    /// NULL in a NOT NULL column
    NotNull,
    /// Duplicate value under a unique or composite-unique constraint
    Unique,
    /// Reference to a missing row, or delete of a row still referenced
    ForeignKey,
    /// More than one reprojection for the same geometry source and srid
    AmbiguousProjection,
}

impl IntegrityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrityKind::NotNull => "not_null",
            IntegrityKind::Unique => "unique",
            IntegrityKind::ForeignKey => "foreign_key",
            IntegrityKind::AmbiguousProjection => "ambiguous_projection",
        }
    }
}

impl fmt::Display for IntegrityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Integrity violation ({kind}) on {table}: {detail}")]
    Integrity {
        kind: IntegrityKind,
        table: String,
        detail: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown column {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error("Type mismatch for {table}.{column}: expected {expected}, got {actual}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Value too long for {table}.{column}: {len} characters (max: {max})")]
    ValueTooLong {
        table: String,
        column: String,
        len: usize,
        max: usize,
    },

    #[error("Id {id} out of range for {table} (expected 1..={max})")]
    IdOutOfRange { table: String, id: i64, max: i64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub(crate) fn integrity(kind: IntegrityKind, table: impl Into<String>, detail: impl Into<String>) -> Self {
        StoreError::Integrity {
            kind,
            table: table.into(),
            detail: detail.into(),
        }
    }

    /// Returns true for integrity violations
    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::Integrity { .. })
    }

    /// The violated rule, for integrity violations
    pub fn integrity_kind(&self) -> Option<IntegrityKind> {
        match self {
            StoreError::Integrity { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_display() {
        let err = StoreError::integrity(IntegrityKind::Unique, "survey_2016.column_info", "(name, tableinfo_id)");
        assert!(err.is_integrity());
        assert_eq!(err.integrity_kind(), Some(IntegrityKind::Unique));
        assert_eq!(
            err.to_string(),
            "Integrity violation (unique) on survey_2016.column_info: (name, tableinfo_id)"
        );
    }

    #[test]
    fn test_not_found() {
        let err = StoreError::NotFound("GeometrySource 7".into());
        assert!(err.is_not_found());
        assert!(!err.is_integrity());
        assert_eq!(err.integrity_kind(), None);
    }

    #[test]
    fn test_id_out_of_range_display() {
        let err = StoreError::IdOutOfRange {
            table: "abs_2011.table_info".into(),
            id: 0,
            max: 2147483647,
        };
        assert!(!err.is_integrity());
        assert_eq!(
            err.to_string(),
            "Id 0 out of range for abs_2011.table_info (expected 1..=2147483647)"
        );
    }
}
