//! Observable events
//!
//! Events are explicit and typed; each maps to a stable upper-case name.

use std::fmt;

use super::logger::Severity;

/// Observable events in the schema registry and store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Registry configuration loaded from disk
    ConfigLoaded,
    /// A namespace bundle was constructed and cached
    SchemaRegistered,
    /// A namespace bundle was served from the cache
    SchemaCacheHit,
    /// A namespace name failed validation
    NamespaceRejected,
    /// All cached bundles were dropped
    RegistryCleared,
    /// A row was inserted into a store
    RowInserted,
    /// A row was deleted on request
    RowDeleted,
    /// A dependent row was deleted by cascade
    CascadeDelete,
    /// A store rejected a write
    IntegrityViolation,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaRegistered => "SCHEMA_REGISTERED",
            Event::SchemaCacheHit => "SCHEMA_CACHE_HIT",
            Event::NamespaceRejected => "NAMESPACE_REJECTED",
            Event::RegistryCleared => "REGISTRY_CLEARED",
            Event::RowInserted => "ROW_INSERTED",
            Event::RowDeleted => "ROW_DELETED",
            Event::CascadeDelete => "CASCADE_DELETE",
            Event::IntegrityViolation => "INTEGRITY_VIOLATION",
        }
    }

    /// Default severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaCacheHit | Event::RowInserted | Event::CascadeDelete => Severity::Trace,
            Event::NamespaceRejected | Event::IntegrityViolation => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        let events = [
            Event::ConfigLoaded,
            Event::SchemaRegistered,
            Event::SchemaCacheHit,
            Event::NamespaceRejected,
            Event::RegistryCleared,
            Event::RowInserted,
            Event::RowDeleted,
            Event::CascadeDelete,
            Event::IntegrityViolation,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::SchemaCacheHit.severity(), Severity::Trace);
        assert_eq!(Event::SchemaRegistered.severity(), Severity::Info);
        assert_eq!(Event::NamespaceRejected.severity(), Severity::Warn);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::SchemaRegistered), "SCHEMA_REGISTERED");
    }
}
