//! Request envelopes and the engine client seam
//!
//! The crate never talks to an engine itself. Callers supply a
//! `SearchClient`; `search` and `delete_by_query` hand it the serialized
//! bodies and wrap what comes back.

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::aggregation::Aggregations;
use crate::errors::{AggError, AggResult};
use crate::filter::QueryNode;
use crate::navigator::ResultTree;
use crate::observability::{log_event_with_fields, Event};

/// A search request body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub query: Option<QueryNode>,
    pub aggregations: Aggregations,
    /// Number of hits to return; aggregation-only requests use `Some(0)`
    pub size: Option<u32>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: QueryNode) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_aggregations(mut self, aggregations: Aggregations) -> Self {
        self.aggregations = aggregations;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Engine JSON; empty sections are omitted
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(query) = &self.query {
            body.insert("query".into(), query.to_json());
        }
        if !self.aggregations.is_empty() {
            body.insert("aggs".into(), self.aggregations.to_json());
        }
        if let Some(size) = self.size {
            body.insert("size".into(), json!(size));
        }
        Value::Object(body)
    }
}

impl Serialize for SearchRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A delete-by-query request body
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteByQueryRequest {
    pub query: QueryNode,
}

impl DeleteByQueryRequest {
    pub fn new(query: QueryNode) -> Self {
        Self { query }
    }

    pub fn to_json(&self) -> Value {
        json!({ "query": self.query.to_json() })
    }
}

/// The search engine collaborator.
///
/// Implementations execute a request body against `index` and return the
/// engine's response JSON. Failures are reported as `AggError::Engine`.
pub trait SearchClient {
    fn search(&self, index: &str, body: &Value) -> AggResult<Value>;

    fn delete_by_query(&self, index: &str, body: &Value) -> AggResult<Value>;
}

/// A search response
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    body: Value,
}

impl SearchResponse {
    pub fn from_json(body: Value) -> AggResult<Self> {
        if !body.is_object() {
            return Err(AggError::Engine("search response must be an object".into()));
        }
        Ok(Self { body })
    }

    /// Total matching documents, when reported
    pub fn total(&self) -> Option<u64> {
        let total = self.body.get("hits")?.get("total")?;
        total
            .get("value")
            .and_then(Value::as_u64)
            .or_else(|| total.as_u64())
    }

    /// Hit sources deserialized into `T`
    pub fn hits<T: DeserializeOwned>(&self) -> AggResult<Vec<T>> {
        let Some(hits) = self
            .body
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
        else {
            return Ok(Vec::new());
        };
        hits.iter()
            .map(|hit| {
                let source = hit.get("_source").cloned().unwrap_or(Value::Null);
                Ok(serde_json::from_value(source)?)
            })
            .collect()
    }

    /// The `aggregations` section
    pub fn aggregations(&self) -> AggResult<ResultTree> {
        ResultTree::from_json(self.body.get("aggregations").cloned().unwrap_or(Value::Null))
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Runs a search through `client`
pub fn search<C: SearchClient + ?Sized>(
    client: &C,
    index: &str,
    request: &SearchRequest,
) -> AggResult<SearchResponse> {
    let aggs = request.aggregations.len().to_string();
    log_event_with_fields(
        Event::SearchDispatched,
        &[("index", index), ("aggregations", aggs.as_str())],
    );
    let body = client.search(index, &request.to_json()).map_err(|err| {
        log_event_with_fields(Event::EngineFailed, &[("index", index), ("code", err.code().code())]);
        err
    })?;
    SearchResponse::from_json(body)
}

/// Runs a delete-by-query through `client`, returning the deleted count
pub fn delete_by_query<C: SearchClient + ?Sized>(
    client: &C,
    index: &str,
    request: &DeleteByQueryRequest,
) -> AggResult<u64> {
    log_event_with_fields(
        Event::DeleteByQueryDispatched,
        &[("index", index), ("query", request.query.kind_name())],
    );
    let body = client
        .delete_by_query(index, &request.to_json())
        .map_err(|err| {
            log_event_with_fields(Event::EngineFailed, &[("index", index), ("code", err.code().code())]);
            err
        })?;
    body.get("deleted")
        .and_then(Value::as_u64)
        .ok_or_else(|| AggError::Engine("delete-by-query response has no 'deleted' count".into()))
}
