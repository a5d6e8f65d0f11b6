//! Filter compilation subsystem
//!
//! Lowers predicate expressions into the engine's query grammar (`bool`,
//! `term`, `range`, `exists`, `nested`, `match_all`). The output embeds as the
//! `query` of a search request, the body of a `filter` aggregation, or the
//! filter of a delete-by-query request.

mod compiler;
mod query;

pub use compiler::FilterCompiler;
pub use query::{BoolQuery, QueryNode, RangeBounds, RangeKind};
