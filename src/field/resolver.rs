//! Field resolution
//!
//! Maps a `FieldExpr` to its canonical `FieldPath`:
//! - member access: first character lower-cased, rest unchanged
//! - member chains: each segment resolved independently
//! - named-field marker: constant string used verbatim
//!
//! Resolution is a pure function of the expression.

use crate::errors::{AggError, AggResult};
use crate::expr::{FieldExpr, StringExpr};

use super::path::{lower_first, FieldPath};

/// Resolves field expressions to wire paths
pub struct FieldResolver;

impl FieldResolver {
    /// Resolves a field expression
    pub fn resolve(expr: &FieldExpr) -> AggResult<FieldPath> {
        let mut segments = Vec::new();
        Self::collect(expr, expr, &mut segments)?;
        FieldPath::new(segments)
    }

    /// Resolves a field expression under an optional nested path
    pub fn resolve_with_prefix(expr: &FieldExpr, prefix: Option<&FieldPath>) -> AggResult<FieldPath> {
        let path = Self::resolve(expr)?;
        Ok(match prefix {
            Some(prefix) => path.prefixed(prefix),
            None => path,
        })
    }

    /// Folds a constant string expression
    pub fn fold_constant(expr: &StringExpr) -> AggResult<String> {
        match expr {
            StringExpr::Literal(s) => Ok(s.clone()),
            StringExpr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&Self::fold_constant(part)?);
                }
                Ok(out)
            }
            StringExpr::Variable(name) => Err(AggError::UnresolvableField(format!(
                "named field argument '{}' is not a constant",
                name
            ))),
        }
    }

    fn collect(whole: &FieldExpr, expr: &FieldExpr, out: &mut Vec<String>) -> AggResult<()> {
        match expr {
            FieldExpr::Member { target, name } => {
                if !matches!(**target, FieldExpr::Root) {
                    Self::collect(whole, target, out)?;
                }
                out.push(lower_first(name));
                Ok(())
            }
            FieldExpr::Named { target, name } => {
                if !matches!(**target, FieldExpr::Root) {
                    Self::collect(whole, target, out)?;
                }
                let folded = Self::fold_constant(name)?;
                out.extend(folded.split('.').map(str::to_string));
                Ok(())
            }
            FieldExpr::Root => Err(AggError::UnresolvableField(format!(
                "'{}' is the document, not a field",
                whole
            ))),
            FieldExpr::Call { method, .. } => Err(AggError::UnresolvableField(format!(
                "'{}' calls '{}', which is not a field access",
                whole, method
            ))),
            FieldExpr::Constant(_) => Err(AggError::UnresolvableField(format!(
                "'{}' is a constant, not a field access",
                whole
            ))),
        }
    }
}
