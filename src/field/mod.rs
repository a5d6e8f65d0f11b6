//! Field resolution subsystem
//!
//! Turns field-access expressions into the dotted names the engine indexes
//! under. The same resolution feeds filter compilation, aggregation naming and
//! result lookup, so one expression always maps to one name.

mod path;
mod resolver;

pub use path::FieldPath;
pub use resolver::FieldResolver;
