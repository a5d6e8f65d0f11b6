//! Expression trees accepted by the compiler and builder
//!
//! These are closed sum types: every shape the compiler understands is a
//! variant, and shapes it does not understand (`FieldExpr::Call`,
//! `PredicateExpr::Call`) are explicit variants that fail at compile time.

mod field;
mod literal;
mod predicate;

pub use field::{field, named, FieldExpr, StringExpr};
pub use literal::{format_datetime, Literal};
pub use predicate::{CompareOp, PredicateExpr};
