//! Observability for the schema registry
//!
//! Structured JSON-line logging of typed lifecycle events.
//!
//! ```ignore
//! use ealgis_schema::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::SchemaRegistered, &[("namespace", "survey_2016")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // no panic
        log_event(Event::RegistryCleared);
        log_event_with_fields(Event::SchemaRegistered, &[("namespace", "test")]);
    }
}
