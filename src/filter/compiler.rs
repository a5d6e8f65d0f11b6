//! Predicate lowering
//!
//! Lowers a `PredicateExpr` into a `QueryNode` tree:
//! - `And` chains flatten into one `bool.must`
//! - two comparisons on one field under a single `And` merge into one range
//! - `Or` becomes `bool.should` with `minimum_should_match: 1`
//! - comparisons against null are no-ops (`match_all`) and drop out of `must`

use crate::config::CompilerOptions;
use crate::errors::{AggError, AggResult};
use crate::expr::{CompareOp, FieldExpr, Literal, PredicateExpr};
use crate::field::{FieldPath, FieldResolver};
use crate::observability::{log_event_with_fields, Event};

use super::query::{BoolQuery, QueryNode, RangeBounds, RangeKind};

/// Compiles predicates into query trees
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    options: CompilerOptions,
}

impl FilterCompiler {
    /// Creates a compiler with the given options
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Returns the compiler options
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles a predicate. All-or-nothing: any unsupported node fails the
    /// whole tree.
    pub fn compile(&self, predicate: &PredicateExpr) -> AggResult<QueryNode> {
        match self.lower(predicate, None) {
            Ok(node) => {
                log_event_with_fields(Event::FilterCompiled, &[("root", node.kind_name())]);
                Ok(node)
            }
            Err(err) => {
                log_event_with_fields(
                    Event::FilterRejected,
                    &[("code", err.code().code()), ("shape", predicate.shape())],
                );
                Err(err)
            }
        }
    }

    fn lower(&self, predicate: &PredicateExpr, prefix: Option<&FieldPath>) -> AggResult<QueryNode> {
        match predicate {
            PredicateExpr::And(left, right) => {
                if let Some(merged) = self.try_merge_range(left, right, prefix)? {
                    return Ok(merged);
                }
                self.lower_and_chain(predicate, prefix)
            }
            PredicateExpr::Or(left, right) => Ok(QueryNode::Bool(BoolQuery::should_any(vec![
                self.lower(left, prefix)?,
                self.lower(right, prefix)?,
            ]))),
            PredicateExpr::Not(inner) => Ok(QueryNode::Bool(BoolQuery::must_not(
                self.lower(inner, prefix)?,
            ))),
            PredicateExpr::Compare { op, field, value } => {
                self.lower_compare(*op, field, value, prefix)
            }
            PredicateExpr::Equals { field, value } => self.lower_equals(field, value, prefix),
            PredicateExpr::NotEquals { field, value } => {
                if value.is_null() {
                    return Ok(QueryNode::Exists {
                        field: resolve(field, prefix)?,
                    });
                }
                Ok(QueryNode::Bool(BoolQuery::must_not(
                    self.lower_equals(field, value, prefix)?,
                )))
            }
            PredicateExpr::BoolFlag(field) => Ok(QueryNode::Term {
                field: resolve(field, prefix)?,
                value: serde_json::Value::Bool(true),
            }),
            PredicateExpr::MethodPredicate(field) => {
                if !field.is_named() {
                    return Err(AggError::UnsupportedPredicate(format!(
                        "'{}' is not a named-field call",
                        field
                    )));
                }
                Ok(QueryNode::Term {
                    field: resolve(field, prefix)?,
                    value: serde_json::Value::Bool(true),
                })
            }
            PredicateExpr::Exists(field) => Ok(QueryNode::Exists {
                field: resolve(field, prefix)?,
            }),
            PredicateExpr::Any {
                collection,
                predicate,
            } => self.lower_any(collection, predicate, prefix),
            PredicateExpr::Call { target, method } => Err(AggError::UnsupportedPredicate(
                format!("method '{}' on '{}' has no query form", method, target),
            )),
        }
    }

    /// Flattens a left- or right-recursive `And` chain into one `must` array.
    /// An `And` whose operands merge into a range stays a single clause.
    fn lower_and_chain(
        &self,
        predicate: &PredicateExpr,
        prefix: Option<&FieldPath>,
    ) -> AggResult<QueryNode> {
        let mut operands = Vec::new();
        self.collect_and(predicate, prefix, &mut operands)?;

        let mut must = Vec::with_capacity(operands.len());
        for operand in operands {
            let node = match operand {
                PredicateExpr::And(left, right) => self
                    .try_merge_range(left, right, prefix)?
                    .ok_or_else(|| AggError::UnsupportedPredicate("unmergeable range pair".into()))?,
                other => self.lower(other, prefix)?,
            };
            if !node.is_match_all() {
                must.push(node);
            }
        }

        if must.is_empty() {
            return Ok(QueryNode::MatchAll);
        }
        Ok(QueryNode::Bool(BoolQuery::must(must)))
    }

    fn collect_and<'p>(
        &self,
        predicate: &'p PredicateExpr,
        prefix: Option<&FieldPath>,
        out: &mut Vec<&'p PredicateExpr>,
    ) -> AggResult<()> {
        match predicate {
            PredicateExpr::And(left, right) => {
                if self.merge_target(left, right, prefix)?.is_none() {
                    self.collect_and(left, prefix, out)?;
                    self.collect_and(right, prefix, out)
                } else {
                    out.push(predicate);
                    Ok(())
                }
            }
            other => {
                out.push(other);
                Ok(())
            }
        }
    }

    /// Merges `x <op1> a && x <op2> b` into one two-sided range when enabled
    fn try_merge_range(
        &self,
        left: &PredicateExpr,
        right: &PredicateExpr,
        prefix: Option<&FieldPath>,
    ) -> AggResult<Option<QueryNode>> {
        let Some(field) = self.merge_target(left, right, prefix)? else {
            return Ok(None);
        };

        let mut merged: Option<QueryNode> = None;
        for side in [left, right] {
            let PredicateExpr::Compare { op, field: f, value } = side else {
                return Ok(None);
            };
            let node = self.lower_compare(*op, f, value, prefix)?;
            merged = Some(match (merged, node) {
                (None, node) => node,
                (
                    Some(QueryNode::Range {
                        field,
                        kind,
                        mut bounds,
                    }),
                    QueryNode::Range { bounds: other, .. },
                ) => {
                    for (key, slot) in [
                        ("gt", other.gt),
                        ("gte", other.gte),
                        ("lt", other.lt),
                        ("lte", other.lte),
                    ] {
                        if let Some(v) = slot {
                            bounds.set(key, v);
                        }
                    }
                    QueryNode::Range {
                        field,
                        kind,
                        bounds,
                    }
                }
                _ => return Ok(None),
            });
        }

        log_event_with_fields(Event::RangeMerged, &[("field", field.as_str())]);
        Ok(merged)
    }

    /// Returns the shared field if `left && right` is a mergeable range pair:
    /// both comparisons, same field, same range kind, one lower and one upper
    /// bound, neither against null.
    fn merge_target(
        &self,
        left: &PredicateExpr,
        right: &PredicateExpr,
        prefix: Option<&FieldPath>,
    ) -> AggResult<Option<String>> {
        if !self.options.merge_adjacent_ranges {
            return Ok(None);
        }
        let (
            PredicateExpr::Compare {
                op: lop,
                field: lf,
                value: lv,
            },
            PredicateExpr::Compare {
                op: rop,
                field: rf,
                value: rv,
            },
        ) = (left, right)
        else {
            return Ok(None);
        };
        if lv.is_null() || rv.is_null() || lop.is_lower_bound() == rop.is_lower_bound() {
            return Ok(None);
        }
        if range_kind(lv) != range_kind(rv) || range_kind(lv).is_none() {
            return Ok(None);
        }
        let left_field = resolve(lf, prefix)?;
        if left_field != resolve(rf, prefix)? {
            return Ok(None);
        }
        Ok(Some(left_field))
    }

    fn lower_equals(
        &self,
        field: &FieldExpr,
        value: &Literal,
        prefix: Option<&FieldPath>,
    ) -> AggResult<QueryNode> {
        let field = resolve(field, prefix)?;
        if value.is_null() {
            return Ok(QueryNode::Bool(BoolQuery::must_not(QueryNode::Exists {
                field,
            })));
        }
        let value = value.to_json(&format!("term on '{}'", field))?;
        Ok(QueryNode::Term { field, value })
    }

    fn lower_compare(
        &self,
        op: CompareOp,
        field: &FieldExpr,
        value: &Literal,
        prefix: Option<&FieldPath>,
    ) -> AggResult<QueryNode> {
        let field = resolve(field, prefix)?;
        if value.is_null() {
            return Ok(QueryNode::MatchAll);
        }
        let context = format!("range on '{}'", field);
        let kind = range_kind(value)
            .ok_or_else(|| AggError::unsupported_literal(value.kind_name(), context.as_str()))?;

        let mut bounds = RangeBounds::default();
        bounds.set(op.range_key(), value.to_json(&context)?);
        Ok(QueryNode::Range {
            field,
            kind,
            bounds,
        })
    }

    fn lower_any(
        &self,
        collection: &FieldExpr,
        predicate: &PredicateExpr,
        prefix: Option<&FieldPath>,
    ) -> AggResult<QueryNode> {
        let path = FieldResolver::resolve_with_prefix(collection, prefix)?;
        let inner = self.lower(predicate, Some(&path))?;
        let wire = path.wire();

        if self.options.is_nested(&wire) {
            return Ok(QueryNode::Nested {
                path: wire,
                query: Box::new(inner),
            });
        }
        Ok(QueryNode::Bool(BoolQuery::must(vec![inner])))
    }
}

fn resolve(field: &FieldExpr, prefix: Option<&FieldPath>) -> AggResult<String> {
    Ok(FieldResolver::resolve_with_prefix(field, prefix)?.wire())
}

fn range_kind(value: &Literal) -> Option<RangeKind> {
    match value {
        Literal::Int(_) | Literal::Float(_) => Some(RangeKind::Numeric),
        Literal::DateTime(_) => Some(RangeKind::Date),
        Literal::Str(_) => Some(RangeKind::Term),
        _ => None,
    }
}
