//! Aggregation subsystem
//!
//! Fluent specs (`AggSpec`) are lowered by `AggregationBuilder` into named
//! engine aggregation nodes. Every node is named through `crate::naming`.

mod builder;
mod node;
mod spec;

pub use builder::AggregationBuilder;
pub use node::{AggKind, AggNode, Aggregations, MetricOp};
pub use spec::{
    AggSpec, CalendarInterval, GroupKey, MetricDecl, MetricKind, SortDirection, SpecEntry,
    TopHitsSpec,
};
