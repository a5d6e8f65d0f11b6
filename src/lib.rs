//! aggtree - Typed predicate and aggregation compiler for search-engine
//! query trees
//!
//! Predicates compile to engine filter queries, fluent aggregation specs
//! compile to deterministically named aggregation trees, and the navigator
//! reads typed values back out of the engine's response by recomputing the
//! same names.

pub mod aggregation;
pub mod config;
pub mod errors;
pub mod expr;
pub mod field;
pub mod filter;
pub mod naming;
pub mod navigator;
pub mod observability;
pub mod request;

pub use aggregation::{AggSpec, AggregationBuilder, Aggregations, CalendarInterval, SortDirection};
pub use config::{BuilderOptions, CompilerOptions};
pub use errors::{AggError, AggResult};
pub use expr::{FieldExpr, Literal, PredicateExpr};
pub use filter::{FilterCompiler, QueryNode};
pub use navigator::{AggregationContainer, Bucket, ResultNavigator, ResultTree};
pub use request::{DeleteByQueryRequest, SearchClient, SearchRequest, SearchResponse};
