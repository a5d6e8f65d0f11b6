//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events emitted by the compiler, builder and navigator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Compilation
    /// Predicate lowered to a query tree
    FilterCompiled,
    /// Two comparisons on one field merged into a single range
    RangeMerged,
    /// Predicate rejected
    FilterRejected,

    // Aggregation building
    /// Aggregation request built
    AggregationsBuilt,
    /// Aggregation spec rejected
    AggregationsRejected,

    // Extraction
    /// Result lookup missed
    AggregationMissing,
    /// Stored value could not be coerced
    ValueCoercionFailed,

    // Collaborator
    /// Search body handed to the engine client
    SearchDispatched,
    /// Delete-by-query body handed to the engine client
    DeleteByQueryDispatched,
    /// Engine client reported a failure
    EngineFailed,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::FilterCompiled => "FILTER_COMPILED",
            Event::RangeMerged => "RANGE_MERGED",
            Event::FilterRejected => "FILTER_REJECTED",
            Event::AggregationsBuilt => "AGGREGATIONS_BUILT",
            Event::AggregationsRejected => "AGGREGATIONS_REJECTED",
            Event::AggregationMissing => "AGGREGATION_MISSING",
            Event::ValueCoercionFailed => "VALUE_COERCION_FAILED",
            Event::SearchDispatched => "SEARCH_DISPATCHED",
            Event::DeleteByQueryDispatched => "DELETE_BY_QUERY_DISPATCHED",
            Event::EngineFailed => "ENGINE_FAILED",
        }
    }

    /// Returns true if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::FilterRejected
                | Event::AggregationsRejected
                | Event::AggregationMissing
                | Event::ValueCoercionFailed
                | Event::EngineFailed
        )
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
    fn test_event_names() {
        assert_eq!(Event::FilterCompiled.as_str(), "FILTER_COMPILED");
        assert_eq!(Event::AggregationMissing.to_string(), "AGGREGATION_MISSING");
    }

    #[test]
    fn test_failure_classification() {
        assert!(Event::EngineFailed.is_failure());
        assert!(!Event::RangeMerged.is_failure());
    }
}
