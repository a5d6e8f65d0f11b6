//! Observability for aggtree
//!
//! - Structured logging (JSON lines)
//! - Typed event names
//!
//! Logging never changes what is compiled or extracted. Per-call events are
//! emitted at TRACE and failures at WARN. Both are dropped under the default
//! ERROR threshold; WARN and above go to stderr once enabled.
//!
//! ```ignore
//! use aggtree::observability::{Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Trace);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an event with fields.
///
/// Failure events go out at WARN, everything else at TRACE.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Warn
    } else {
        Severity::Trace
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_with_fields() {
        // Only verifies no panic
        log_event_with_fields(Event::AggregationsBuilt, &[]);
        log_event_with_fields(Event::AggregationMissing, &[("name", "SumWeight")]);
    }
}
