//! Predicate expressions

use std::fmt;

use super::field::FieldExpr;
use super::literal::Literal;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Operator name used in predicate signatures
    pub fn signature_name(&self) -> &'static str {
        match self {
            CompareOp::Lt => "LessThan",
            CompareOp::Le => "LessThanOrEqual",
            CompareOp::Gt => "GreaterThan",
            CompareOp::Ge => "GreaterThanOrEqual",
        }
    }

    /// Range bound key on the wire
    pub fn range_key(&self) -> &'static str {
        match self {
            CompareOp::Lt => "lt",
            CompareOp::Le => "lte",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "gte",
        }
    }

    /// Returns true for `>` and `>=`
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, CompareOp::Gt | CompareOp::Ge)
    }

    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Boolean-valued expression over a document
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateExpr {
    And(Box<PredicateExpr>, Box<PredicateExpr>),
    Or(Box<PredicateExpr>, Box<PredicateExpr>),
    Not(Box<PredicateExpr>),
    Compare {
        op: CompareOp,
        field: FieldExpr,
        value: Literal,
    },
    Equals {
        field: FieldExpr,
        value: Literal,
    },
    NotEquals {
        field: FieldExpr,
        value: Literal,
    },
    /// Boolean member access
    BoolFlag(FieldExpr),
    /// `.HasValue` on a nullable member
    Exists(FieldExpr),
    /// Boolean-returning named-field call
    MethodPredicate(FieldExpr),
    /// `collection.any(predicate)`
    Any {
        collection: FieldExpr,
        predicate: Box<PredicateExpr>,
    },
    /// Any other boolean method call; has no query lowering
    Call { target: FieldExpr, method: String },
}

impl PredicateExpr {
    /// `self && other`
    pub fn and(self, other: PredicateExpr) -> Self {
        PredicateExpr::And(Box::new(self), Box::new(other))
    }

    /// `self || other`
    pub fn or(self, other: PredicateExpr) -> Self {
        PredicateExpr::Or(Box::new(self), Box::new(other))
    }

    /// `!self`
    pub fn negate(self) -> Self {
        PredicateExpr::Not(Box::new(self))
    }

    /// Short description of the node shape, for diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            PredicateExpr::And(..) => "and",
            PredicateExpr::Or(..) => "or",
            PredicateExpr::Not(_) => "not",
            PredicateExpr::Compare { .. } => "compare",
            PredicateExpr::Equals { .. } => "equals",
            PredicateExpr::NotEquals { .. } => "not-equals",
            PredicateExpr::BoolFlag(_) => "bool-flag",
            PredicateExpr::Exists(_) => "exists",
            PredicateExpr::MethodPredicate(_) => "method-predicate",
            PredicateExpr::Any { .. } => "any",
            PredicateExpr::Call { .. } => "call",
        }
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateExpr::And(l, r) => write!(f, "({} && {})", l, r),
            PredicateExpr::Or(l, r) => write!(f, "({} || {})", l, r),
            PredicateExpr::Not(inner) => write!(f, "!{}", inner),
            PredicateExpr::Compare { op, field, value } => {
                write!(f, "{} {} {}", field, op.symbol(), value)
            }
            PredicateExpr::Equals { field, value } => write!(f, "{} == {}", field, value),
            PredicateExpr::NotEquals { field, value } => write!(f, "{} != {}", field, value),
            PredicateExpr::BoolFlag(field) | PredicateExpr::MethodPredicate(field) => {
                write!(f, "{}", field)
            }
            PredicateExpr::Exists(field) => write!(f, "{}.HasValue", field),
            PredicateExpr::Any {
                collection,
                predicate,
            } => write!(f, "{}.Any({})", collection, predicate),
            PredicateExpr::Call { target, method } => write!(f, "{}.{}()", target, method),
        }
    }
}
