//! Compiled query nodes and their wire form

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Value typing of a range node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Numeric,
    Date,
    /// Lexicographic range over keyword values
    Term,
}

/// Bounds of a range node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeBounds {
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
}

impl RangeBounds {
    /// Returns true if a lower bound is set
    pub fn has_lower(&self) -> bool {
        self.gt.is_some() || self.gte.is_some()
    }

    /// Returns true if an upper bound is set
    pub fn has_upper(&self) -> bool {
        self.lt.is_some() || self.lte.is_some()
    }

    /// Sets the bound slot named by `key` (`gt`, `gte`, `lt`, `lte`)
    pub(crate) fn set(&mut self, key: &str, value: Value) {
        match key {
            "gt" => self.gt = Some(value),
            "gte" => self.gte = Some(value),
            "lt" => self.lt = Some(value),
            _ => self.lte = Some(value),
        }
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, slot) in [
            ("gt", &self.gt),
            ("gte", &self.gte),
            ("lt", &self.lt),
            ("lte", &self.lte),
        ] {
            if let Some(v) = slot {
                map.insert(key.to_string(), v.clone());
            }
        }
        Value::Object(map)
    }
}

/// Boolean combination of clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<QueryNode>,
    pub should: Vec<QueryNode>,
    pub must_not: Vec<QueryNode>,
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    /// `bool.must` over the given clauses
    pub fn must(clauses: Vec<QueryNode>) -> Self {
        Self {
            must: clauses,
            ..Default::default()
        }
    }

    /// `bool.must_not` over one clause
    pub fn must_not(clause: QueryNode) -> Self {
        Self {
            must_not: vec![clause],
            ..Default::default()
        }
    }

    /// `bool.should` requiring at least one match
    pub fn should_any(clauses: Vec<QueryNode>) -> Self {
        Self {
            should: clauses,
            minimum_should_match: Some(1),
            ..Default::default()
        }
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, clauses) in [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
        ] {
            if !clauses.is_empty() {
                map.insert(
                    key.to_string(),
                    Value::Array(clauses.iter().map(QueryNode::to_json).collect()),
                );
            }
        }
        if let Some(n) = self.minimum_should_match {
            map.insert("minimum_should_match".to_string(), json!(n));
        }
        Value::Object(map)
    }
}

/// Compiled query tree
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Matches every document; the lowering of a no-op predicate
    MatchAll,
    Term {
        field: String,
        value: Value,
    },
    Range {
        field: String,
        kind: RangeKind,
        bounds: RangeBounds,
    },
    Exists {
        field: String,
    },
    Bool(BoolQuery),
    Nested {
        path: String,
        query: Box<QueryNode>,
    },
}

impl QueryNode {
    /// Returns true for the no-op node
    pub fn is_match_all(&self) -> bool {
        matches!(self, QueryNode::MatchAll)
    }

    /// Wire keyword of the node
    pub fn kind_name(&self) -> &'static str {
        match self {
            QueryNode::MatchAll => "match_all",
            QueryNode::Term { .. } => "term",
            QueryNode::Range { .. } => "range",
            QueryNode::Exists { .. } => "exists",
            QueryNode::Bool(_) => "bool",
            QueryNode::Nested { .. } => "nested",
        }
    }

    /// Engine JSON for this node
    pub fn to_json(&self) -> Value {
        match self {
            QueryNode::MatchAll => json!({ "match_all": {} }),
            QueryNode::Term { field, value } => {
                json!({ "term": { field.as_str(): { "value": value } } })
            }
            QueryNode::Range { field, bounds, .. } => {
                json!({ "range": { field.as_str(): bounds.to_json() } })
            }
            QueryNode::Exists { field } => json!({ "exists": { "field": field } }),
            QueryNode::Bool(b) => json!({ "bool": b.to_json() }),
            QueryNode::Nested { path, query } => {
                json!({ "nested": { "path": path, "query": query.to_json() } })
            }
        }
    }
}

impl Serialize for QueryNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
