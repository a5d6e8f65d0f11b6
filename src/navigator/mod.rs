//! Result navigation
//!
//! Reads typed values out of the engine's `aggregations` response. Names are
//! recomputed through `crate::naming`, so a navigator call with the same
//! field and predicate as the `AggSpec` declaration finds the node the builder
//! emitted.

mod container;
mod convert;
mod extract;
mod result;

pub use container::AggregationContainer;
pub use convert::FromMetricValue;
pub use extract::{Percentile, ResultNavigator, StatsValue};
pub use result::{Bucket, BucketKey, ResultTree};
