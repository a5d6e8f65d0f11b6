//! Field-access expressions
//!
//! A `FieldExpr` is the shape of the code that reaches a document field:
//! `d.Engine.Power`, `d.Field("raw_name")`, or something the resolver cannot
//! map to a field (`d.Name.Trim()`).

use std::fmt;

use super::literal::Literal;
use super::predicate::{CompareOp, PredicateExpr};

/// A constant-foldable string expression
#[derive(Debug, Clone, PartialEq)]
pub enum StringExpr {
    Literal(String),
    Concat(Vec<StringExpr>),
    /// A runtime value; never foldable
    Variable(String),
}

impl From<&str> for StringExpr {
    fn from(v: &str) -> Self {
        StringExpr::Literal(v.to_string())
    }
}

impl From<String> for StringExpr {
    fn from(v: String) -> Self {
        StringExpr::Literal(v)
    }
}

impl fmt::Display for StringExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringExpr::Literal(s) => write!(f, "\"{}\"", s),
            StringExpr::Concat(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            StringExpr::Variable(name) => write!(f, "{}", name),
        }
    }
}

/// Field-access expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum FieldExpr {
    /// The document parameter itself
    Root,
    /// Property access
    Member { target: Box<FieldExpr>, name: String },
    /// Explicit engine field name, bypassing property-name inference
    Named { target: Box<FieldExpr>, name: StringExpr },
    /// Any other method call on a field
    Call { target: Box<FieldExpr>, method: String },
    /// A constant in field position
    Constant(Literal),
}

/// Property access on the document root
pub fn field(name: impl Into<String>) -> FieldExpr {
    FieldExpr::Root.member(name)
}

/// Named-field access on the document root
pub fn named(name: impl Into<StringExpr>) -> FieldExpr {
    FieldExpr::Root.named(name)
}

impl FieldExpr {
    /// Access a property of this expression
    pub fn member(self, name: impl Into<String>) -> Self {
        FieldExpr::Member {
            target: Box::new(self),
            name: name.into(),
        }
    }

    /// Access an explicitly named field under this expression
    pub fn named(self, name: impl Into<StringExpr>) -> Self {
        FieldExpr::Named {
            target: Box::new(self),
            name: name.into(),
        }
    }

    /// Call a method on this expression
    pub fn call(self, method: impl Into<String>) -> Self {
        FieldExpr::Call {
            target: Box::new(self),
            method: method.into(),
        }
    }

    /// Returns true for a named-field marker
    pub fn is_named(&self) -> bool {
        matches!(self, FieldExpr::Named { .. })
    }

    fn compare(self, op: CompareOp, value: impl Into<Literal>) -> PredicateExpr {
        PredicateExpr::Compare {
            op,
            field: self,
            value: value.into(),
        }
    }

    /// `self < value`
    pub fn lt(self, value: impl Into<Literal>) -> PredicateExpr {
        self.compare(CompareOp::Lt, value)
    }

    /// `self <= value`
    pub fn le(self, value: impl Into<Literal>) -> PredicateExpr {
        self.compare(CompareOp::Le, value)
    }

    /// `self > value`
    pub fn gt(self, value: impl Into<Literal>) -> PredicateExpr {
        self.compare(CompareOp::Gt, value)
    }

    /// `self >= value`
    pub fn ge(self, value: impl Into<Literal>) -> PredicateExpr {
        self.compare(CompareOp::Ge, value)
    }

    /// `self == value`
    pub fn eq(self, value: impl Into<Literal>) -> PredicateExpr {
        PredicateExpr::Equals {
            field: self,
            value: value.into(),
        }
    }

    /// `self != value`
    pub fn ne(self, value: impl Into<Literal>) -> PredicateExpr {
        PredicateExpr::NotEquals {
            field: self,
            value: value.into(),
        }
    }

    /// Boolean member used as a predicate
    pub fn is_true(self) -> PredicateExpr {
        PredicateExpr::BoolFlag(self)
    }

    /// `.HasValue` on a nullable member
    pub fn has_value(self) -> PredicateExpr {
        PredicateExpr::Exists(self)
    }

    /// Boolean-returning named-field call used as a predicate
    pub fn holds(self) -> PredicateExpr {
        PredicateExpr::MethodPredicate(self)
    }

    /// `collection.any(predicate)` over a nested-object collection
    pub fn any(self, predicate: PredicateExpr) -> PredicateExpr {
        PredicateExpr::Any {
            collection: self,
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Display for FieldExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldExpr::Root => write!(f, "d"),
            FieldExpr::Member { target, name } => write!(f, "{}.{}", target, name),
            FieldExpr::Named { target, name } => write!(f, "{}.Field({})", target, name),
            FieldExpr::Call { target, method } => write!(f, "{}.{}()", target, method),
            FieldExpr::Constant(lit) => write!(f, "{}", lit),
        }
    }
}
