//! Canonical aggregation names
//!
//! The builder names every aggregation node here and the navigator recomputes
//! the same names here to find them again. No other module formats names.
//!
//! - metric: `<Tag><FieldPascal>` (`SumWeight`, `CountEnginePower`)
//! - top hits: `TopHits`, or `TopHits<SortPascal><Asc|Desc>` when sorted
//! - terms group-by: the field's wire name (`carType`)
//! - histograms: `Histogram<FieldPascal>`, `DateHistogram<FieldPascal>`
//! - conditional metric: wrapped in a filter named by the predicate signature

use crate::aggregation::{MetricKind, SortDirection};
use crate::errors::{AggError, AggResult};
use crate::expr::PredicateExpr;
use crate::field::FieldResolver;

/// The aggregation a name is computed for
#[derive(Debug, Clone, Copy)]
pub enum AggTarget<'a> {
    Metric {
        kind: MetricKind,
        field: &'a str,
    },
    TopHits {
        sort: Option<(&'a str, SortDirection)>,
    },
    Terms {
        field: &'a str,
    },
    Histogram {
        field: &'a str,
    },
    DateHistogram {
        field: &'a str,
    },
}

/// Name of an aggregation, plus the enclosing filter for conditional metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalName {
    pub filter: Option<String>,
    pub name: String,
}

/// Canonical name for `target`, optionally scoped by a predicate signature.
///
/// Field arguments are wire names (`engine.power`).
pub fn canonical_name(target: &AggTarget<'_>, signature: Option<&str>) -> CanonicalName {
    let name = match target {
        AggTarget::Metric { kind, field } => format!("{}{}", kind.tag(), pascal(field)),
        AggTarget::TopHits { sort: None } => MetricKind::TopHits.tag().to_string(),
        AggTarget::TopHits {
            sort: Some((field, direction)),
        } => format!(
            "{}{}{}",
            MetricKind::TopHits.tag(),
            pascal(field),
            direction.tag()
        ),
        AggTarget::Terms { field } => field.to_string(),
        AggTarget::Histogram { field } => format!("Histogram{}", pascal(field)),
        AggTarget::DateHistogram { field } => format!("DateHistogram{}", pascal(field)),
    };
    CanonicalName {
        filter: signature.map(str::to_string),
        name,
    }
}

/// Deterministic serialization of a predicate, used as a filter name.
///
/// Operands are joined by operator names (`weight_GreaterThan_5_AndAlso_carType_Equal_Sedan`).
/// Structurally different predicates get different names even when they are
/// logically equivalent. Literal text is folded by `sanitize`, so two
/// predicates may still share a name; the builder rejects those.
pub fn predicate_signature(predicate: &PredicateExpr) -> AggResult<String> {
    let mut out = String::new();
    write_signature(predicate, &mut out)?;
    Ok(sanitize(&out))
}

fn write_signature(predicate: &PredicateExpr, out: &mut String) -> AggResult<()> {
    match predicate {
        PredicateExpr::And(l, r) => write_binary(l, "AndAlso", r, out),
        PredicateExpr::Or(l, r) => write_binary(l, "OrElse", r, out),
        PredicateExpr::Not(inner) => {
            out.push_str("Not_");
            write_grouped(inner, out)
        }
        PredicateExpr::Compare { op, field, value } => {
            let field = FieldResolver::resolve(field)?.wire();
            let text = value.signature_text(&field)?;
            out.push_str(&format!("{}_{}_{}", field, op.signature_name(), text));
            Ok(())
        }
        PredicateExpr::Equals { field, value } => {
            let field = FieldResolver::resolve(field)?.wire();
            let text = value.signature_text(&field)?;
            out.push_str(&format!("{}_Equal_{}", field, text));
            Ok(())
        }
        PredicateExpr::NotEquals { field, value } => {
            let field = FieldResolver::resolve(field)?.wire();
            let text = value.signature_text(&field)?;
            out.push_str(&format!("{}_NotEqual_{}", field, text));
            Ok(())
        }
        PredicateExpr::BoolFlag(field) | PredicateExpr::MethodPredicate(field) => {
            out.push_str(&FieldResolver::resolve(field)?.wire());
            Ok(())
        }
        PredicateExpr::Exists(field) => {
            out.push_str(&FieldResolver::resolve(field)?.wire());
            out.push_str("_HasValue");
            Ok(())
        }
        PredicateExpr::Any {
            collection,
            predicate,
        } => {
            out.push_str(&FieldResolver::resolve(collection)?.wire());
            out.push_str("_Any_");
            write_grouped(predicate, out)
        }
        PredicateExpr::Call { target, method } => Err(AggError::UnsupportedPredicate(format!(
            "method '{}' on '{}' has no query form",
            method, target
        ))),
    }
}

/// Left-nested chains of one operator stay flat (`A_AndAlso_B_AndAlso_C`);
/// any other nested `And`/`Or` operand is parenthesized.
fn write_binary(
    left: &PredicateExpr,
    op: &str,
    right: &PredicateExpr,
    out: &mut String,
) -> AggResult<()> {
    if binary_op(left) == Some(op) {
        write_signature(left, out)?;
    } else {
        write_grouped(left, out)?;
    }
    out.push('_');
    out.push_str(op);
    out.push('_');
    write_grouped(right, out)
}

fn write_grouped(predicate: &PredicateExpr, out: &mut String) -> AggResult<()> {
    if binary_op(predicate).is_none() {
        return write_signature(predicate, out);
    }
    out.push('(');
    write_signature(predicate, out)?;
    out.push(')');
    Ok(())
}

fn binary_op(predicate: &PredicateExpr) -> Option<&'static str> {
    match predicate {
        PredicateExpr::And(..) => Some("AndAlso"),
        PredicateExpr::Or(..) => Some("OrElse"),
        _ => None,
    }
}

/// The engine rejects `[`, `]` and `>` in aggregation names
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '[' | ']' | '>' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

fn pascal(wire: &str) -> String {
    wire.split('.')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{field, Literal};

    #[test]
    fn test_metric_names() {
        let name = canonical_name(
            &AggTarget::Metric {
                kind: MetricKind::Sum,
                field: "weight",
            },
            None,
        );
        assert_eq!(name.name, "SumWeight");
        assert_eq!(name.filter, None);

        let nested = canonical_name(
            &AggTarget::Metric {
                kind: MetricKind::Average,
                field: "engine.horsePower",
            },
            None,
        );
        assert_eq!(nested.name, "AverageEngineHorsePower");
    }

    #[test]
    fn test_top_hits_direction_distinct() {
        let asc = canonical_name(
            &AggTarget::TopHits {
                sort: Some(("weight", SortDirection::Asc)),
            },
            None,
        );
        let desc = canonical_name(
            &AggTarget::TopHits {
                sort: Some(("weight", SortDirection::Desc)),
            },
            None,
        );
        assert_eq!(asc.name, "TopHitsWeightAsc");
        assert_eq!(desc.name, "TopHitsWeightDesc");
        assert_eq!(canonical_name(&AggTarget::TopHits { sort: None }, None).name, "TopHits");
    }

    #[test]
    fn test_group_names() {
        assert_eq!(canonical_name(&AggTarget::Terms { field: "carType" }, None).name, "carType");
        assert_eq!(
            canonical_name(&AggTarget::DateHistogram { field: "created" }, None).name,
            "DateHistogramCreated"
        );
    }

    #[test]
    fn test_predicate_signature() {
        let pred = field("Weight")
            .gt(5)
            .and(field("CarType").eq(Literal::enum_value("Sedan")));
        assert_eq!(
            predicate_signature(&pred).unwrap(),
            "weight_GreaterThan_5_AndAlso_carType_Equal_Sedan"
        );
    }

    #[test]
    fn test_signature_order_sensitive() {
        let a = field("A").is_true().and(field("B").is_true());
        let b = field("B").is_true().and(field("A").is_true());
        assert_ne!(predicate_signature(&a).unwrap(), predicate_signature(&b).unwrap());
    }

    #[test]
    fn test_signature_sanitized() {
        let pred = field("Name").eq("a > b [x]");
        assert_eq!(predicate_signature(&pred).unwrap(), "name_Equal_a___b__x_");
    }

    #[test]
    fn test_signature_grouping() {
        let heavy = || field("Weight").gt(1500);
        let light = || field("Weight").lt(1100);
        let electric = || field("Electric").is_true();

        let left = heavy().or(light()).and(electric());
        let right = heavy().or(light().and(electric()));
        assert_eq!(
            predicate_signature(&left).unwrap(),
            "(weight_GreaterThan_1500_OrElse_weight_LessThan_1100)_AndAlso_electric"
        );
        assert_eq!(
            predicate_signature(&right).unwrap(),
            "weight_GreaterThan_1500_OrElse_(weight_LessThan_1100_AndAlso_electric)"
        );

        let chain = heavy().and(light()).and(electric());
        assert_eq!(
            predicate_signature(&chain).unwrap(),
            "weight_GreaterThan_1500_AndAlso_weight_LessThan_1100_AndAlso_electric"
        );

        let negated = heavy().and(electric()).negate();
        assert_eq!(
            predicate_signature(&negated).unwrap(),
            "Not_(weight_GreaterThan_1500_AndAlso_electric)"
        );
    }

    #[test]
    fn test_signature_shapes() {
        let pred = field("Passengers")
            .any(field("Age").le(3))
            .or(field("Spare").has_value().negate());
        assert_eq!(
            predicate_signature(&pred).unwrap(),
            "passengers_Any_age_LessThanOrEqual_3_OrElse_Not_spare_HasValue"
        );
    }
}
