//! Result trees and buckets
//!
//! A `ResultTree` is the engine's `aggregations` object, keyed by
//! aggregation name in engine order. Buckets and filter results carry their
//! sub-aggregations next to bookkeeping keys (`key`, `doc_count`, ...);
//! those keys are stripped when a sub-tree is taken.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::errors::{AggError, AggResult};
use crate::observability::{log_event_with_fields, Event};

use super::container::AggregationContainer;

/// Keys the engine places beside sub-aggregations
const RESERVED_KEYS: &[&str] = &[
    "key",
    "key_as_string",
    "doc_count",
    "doc_count_error_upper_bound",
    "sum_other_doc_count",
    "buckets",
    "meta",
];

/// Aggregation results keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTree {
    aggs: Map<String, Value>,
}

impl ResultTree {
    /// Wraps an `aggregations` object
    pub fn new(aggs: Map<String, Value>) -> Self {
        Self { aggs }
    }

    /// Builds a tree from the response's `aggregations` value. A missing
    /// (`null`) value yields an empty tree.
    pub fn from_json(value: Value) -> AggResult<Self> {
        match value {
            Value::Null => Ok(Self::empty()),
            Value::Object(aggs) => Ok(Self::new(aggs)),
            other => Err(AggError::Engine(format!(
                "aggregations must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// A tree without aggregations
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the tree carries no aggregations
    pub fn is_empty(&self) -> bool {
        self.aggs.is_empty()
    }

    /// Aggregation names in engine order
    pub fn names(&self) -> Vec<&str> {
        self.aggs.keys().map(String::as_str).collect()
    }

    /// Raw result of one aggregation
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.aggs.get(name)
    }

    /// Raw result of one aggregation, failing with the names that are present
    pub fn lookup(&self, name: &str) -> AggResult<&Value> {
        lookup_in(&self.aggs, name)
    }

    /// Buckets of a `terms`, `histogram` or `date_histogram` result
    pub fn buckets(&self, name: &str) -> AggResult<Vec<Bucket>> {
        buckets_of(name, self.lookup(name)?)
    }

    /// Sub-tree of a single-bucket (`filter`) result
    pub fn sub_tree(&self, name: &str) -> AggResult<ResultTree> {
        let body = self.lookup(name)?;
        Ok(ResultTree::new(sub_aggregations(object_of(name, body)?)))
    }

    /// The tree as engine JSON
    pub fn to_json(&self) -> Value {
        Value::Object(self.aggs.clone())
    }

    /// Binds a container to this tree
    pub fn container(&self) -> AggregationContainer<'_> {
        AggregationContainer::new(self)
    }
}

/// One bucket of a bucketing aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    key: BucketKey,
    doc_count: u64,
    tree: ResultTree,
}

impl Bucket {
    /// Parses one entry of a `buckets` array
    pub fn from_json(name: &str, value: &Value) -> AggResult<Self> {
        let obj = object_of(name, value)?;
        let key = obj
            .get("key")
            .cloned()
            .ok_or_else(|| AggError::coercion(name, "a bucket without a key", "bucket"))?;
        let key_as_string = obj
            .get("key_as_string")
            .and_then(Value::as_str)
            .map(str::to_string);
        let doc_count = obj.get("doc_count").and_then(Value::as_u64).unwrap_or(0);

        Ok(Self {
            key: BucketKey {
                raw: key,
                as_string: key_as_string,
            },
            doc_count,
            tree: ResultTree::new(sub_aggregations(obj)),
        })
    }

    pub fn key(&self) -> &BucketKey {
        &self.key
    }

    /// The bucket key converted to `T`
    pub fn key_as<T: FromStr>(&self) -> AggResult<T> {
        self.key.parse("key")
    }

    pub fn doc_count(&self) -> u64 {
        self.doc_count
    }

    /// Sub-aggregations of this bucket
    pub fn tree(&self) -> &ResultTree {
        &self.tree
    }

    /// Binds a container to this bucket's sub-aggregations
    pub fn container(&self) -> AggregationContainer<'_> {
        AggregationContainer::new(&self.tree)
    }
}

/// A bucket key as returned by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct BucketKey {
    raw: Value,
    as_string: Option<String>,
}

impl BucketKey {
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// `key_as_string`, when the engine sent one
    pub fn as_string(&self) -> Option<&str> {
        self.as_string.as_deref()
    }

    /// Converts the key through `FromStr`.
    ///
    /// Tries `key_as_string`, then the raw key text, then the integral form
    /// of a whole float key (`3.0` → `3`).
    pub fn parse<T: FromStr>(&self, name: &str) -> AggResult<T> {
        let mut candidates: Vec<String> = Vec::with_capacity(3);
        if let Some(s) = &self.as_string {
            candidates.push(s.clone());
        }
        match &self.raw {
            Value::String(s) => candidates.push(s.clone()),
            Value::Number(n) => {
                candidates.push(n.to_string());
                if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                        candidates.push((f as i64).to_string());
                    }
                }
            }
            Value::Bool(b) => candidates.push(b.to_string()),
            _ => {}
        }

        candidates
            .iter()
            .find_map(|text| text.parse::<T>().ok())
            .ok_or_else(|| {
                let err = AggError::coercion(name, &self.raw, std::any::type_name::<T>());
                log_event_with_fields(Event::ValueCoercionFailed, &[("name", name)]);
                err
            })
    }
}

/// Finds `name` among the sub-aggregations of `aggs`
pub(crate) fn lookup_in<'t>(aggs: &'t Map<String, Value>, name: &str) -> AggResult<&'t Value> {
    if let Some(value) = aggs.get(name) {
        return Ok(value);
    }

    let present: Vec<String> = aggs
        .keys()
        .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
        .cloned()
        .collect();
    log_event_with_fields(Event::AggregationMissing, &[("name", name)]);
    if present.is_empty() {
        return Err(AggError::NoAggregations(name.to_string()));
    }
    Err(AggError::NoSuchAggregation {
        name: name.to_string(),
        present,
    })
}

pub(crate) fn object_of<'v>(name: &str, value: &'v Value) -> AggResult<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AggError::coercion(name, json_kind(value), "object"))
}

pub(crate) fn buckets_of(name: &str, body: &Value) -> AggResult<Vec<Bucket>> {
    let buckets = body
        .get("buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| AggError::coercion(name, json_kind(body), "buckets"))?;
    buckets.iter().map(|b| Bucket::from_json(name, b)).collect()
}

fn sub_aggregations(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .filter(|(k, v)| !RESERVED_KEYS.contains(&k.as_str()) && v.is_object())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
