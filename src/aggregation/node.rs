//! Compiled aggregation nodes and their wire form

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::filter::QueryNode;

use super::spec::{CalendarInterval, SortDirection};

/// Single-value and multi-value metric operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricOp {
    Sum,
    Avg,
    Min,
    Max,
    ValueCount,
    Cardinality,
    Stats,
}

impl MetricOp {
    /// Wire keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricOp::Sum => "sum",
            MetricOp::Avg => "avg",
            MetricOp::Min => "min",
            MetricOp::Max => "max",
            MetricOp::ValueCount => "value_count",
            MetricOp::Cardinality => "cardinality",
            MetricOp::Stats => "stats",
        }
    }
}

/// Aggregation node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum AggKind {
    Metric {
        op: MetricOp,
        field: String,
    },
    Percentiles {
        field: String,
        percents: Vec<f64>,
    },
    Terms {
        field: String,
        size: u32,
    },
    Histogram {
        field: String,
        interval: f64,
    },
    DateHistogram {
        field: String,
        interval: CalendarInterval,
    },
    Filter {
        query: QueryNode,
    },
    TopHits {
        size: u32,
        sort: Option<(String, SortDirection)>,
        includes: Vec<String>,
    },
}

impl AggKind {
    fn to_json(&self) -> Value {
        match self {
            AggKind::Metric { op, field } => json!({ op.as_str(): { "field": field } }),
            AggKind::Percentiles { field, percents } => {
                json!({ "percentiles": { "field": field, "percents": percents } })
            }
            AggKind::Terms { field, size } => {
                json!({ "terms": { "field": field, "size": size } })
            }
            AggKind::Histogram { field, interval } => {
                json!({ "histogram": { "field": field, "interval": interval } })
            }
            AggKind::DateHistogram { field, interval } => json!({
                "date_histogram": { "field": field, "calendar_interval": interval.as_str() }
            }),
            AggKind::Filter { query } => json!({ "filter": query.to_json() }),
            AggKind::TopHits {
                size,
                sort,
                includes,
            } => {
                let mut body = Map::new();
                body.insert("size".into(), json!(size));
                if let Some((field, direction)) = sort {
                    body.insert(
                        "sort".into(),
                        json!([{ field.as_str(): { "order": direction.as_str() } }]),
                    );
                }
                if !includes.is_empty() {
                    body.insert("_source".into(), json!({ "includes": includes }));
                }
                json!({ "top_hits": Value::Object(body) })
            }
        }
    }
}

/// A named aggregation node
#[derive(Debug, Clone, PartialEq)]
pub struct AggNode {
    pub name: String,
    pub kind: AggKind,
    pub children: Vec<AggNode>,
}

impl AggNode {
    /// Creates a node without children
    pub fn leaf(name: impl Into<String>, kind: AggKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Finds a direct child by name
    pub fn child(&self, name: &str) -> Option<&AggNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Engine JSON for this node's body (without its name)
    pub fn to_json(&self) -> Value {
        let mut body = self.kind.to_json();
        if !self.children.is_empty() {
            if let Value::Object(map) = &mut body {
                map.insert("aggs".into(), nodes_to_json(&self.children));
            }
        }
        body
    }
}

fn nodes_to_json(nodes: &[AggNode]) -> Value {
    let mut map = Map::new();
    for node in nodes {
        map.insert(node.name.clone(), node.to_json());
    }
    Value::Object(map)
}

/// A complete aggregation request, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregations {
    nodes: Vec<AggNode>,
}

impl Aggregations {
    pub(crate) fn new(nodes: Vec<AggNode>) -> Self {
        Self { nodes }
    }

    /// Top-level nodes
    pub fn nodes(&self) -> &[AggNode] {
        &self.nodes
    }

    /// Finds a top-level node by name
    pub fn get(&self, name: &str) -> Option<&AggNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Top-level names
    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// Returns true if no aggregation was requested
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of top-level nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Engine JSON for the `aggs` section
    pub fn to_json(&self) -> Value {
        nodes_to_json(&self.nodes)
    }
}

impl Serialize for Aggregations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
