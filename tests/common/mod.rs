//! In-memory search engine for integration tests
//!
//! Evaluates the serialized query and aggregation JSON over a document list,
//! the way the engine would. Only the grammar the crate emits is supported.

#![allow(dead_code)]

use std::cell::RefCell;
use std::cmp::Ordering;

use aggtree::errors::{AggError, AggResult};
use aggtree::SearchClient;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde_json::{json, Map, Value};

// =============================================================================
// Engine
// =============================================================================

pub struct MemoryEngine {
    docs: RefCell<Vec<Value>>,
}

impl MemoryEngine {
    pub fn new(docs: Vec<Value>) -> Self {
        Self {
            docs: RefCell::new(docs),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.borrow().len()
    }

    /// Documents matching a compiled query body
    pub fn matching(&self, query: &Value) -> AggResult<Vec<Value>> {
        let docs = self.docs.borrow();
        let mut out = Vec::new();
        for doc in docs.iter() {
            if matches(doc, query)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }
}

impl SearchClient for MemoryEngine {
    fn search(&self, _index: &str, body: &Value) -> AggResult<Value> {
        let docs = self.docs.borrow();
        let mut matched: Vec<&Value> = Vec::new();
        for doc in docs.iter() {
            let keep = match body.get("query") {
                Some(query) => matches(doc, query)?,
                None => true,
            };
            if keep {
                matched.push(doc);
            }
        }

        let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
        let hits: Vec<Value> = matched
            .iter()
            .take(size)
            .map(|doc| json!({ "_source": doc }))
            .collect();

        let mut response = Map::new();
        response.insert(
            "hits".into(),
            json!({ "total": { "value": matched.len() }, "hits": hits }),
        );
        if let Some(aggs) = body.get("aggs").and_then(Value::as_object) {
            response.insert("aggregations".into(), Value::Object(run_aggs(aggs, &matched)?));
        }
        Ok(Value::Object(response))
    }

    fn delete_by_query(&self, _index: &str, body: &Value) -> AggResult<Value> {
        let query = body
            .get("query")
            .ok_or_else(|| AggError::Engine("delete-by-query without query".into()))?;
        let mut docs = self.docs.borrow_mut();
        let before = docs.len();
        let mut kept = Vec::with_capacity(before);
        for doc in docs.drain(..) {
            if !matches(&doc, query)? {
                kept.push(doc);
            }
        }
        *docs = kept;
        Ok(json!({ "deleted": before - docs.len() }))
    }
}

// =============================================================================
// Query evaluation
// =============================================================================

fn single_entry<'v>(value: &'v Value, what: &str) -> AggResult<(&'v String, &'v Value)> {
    let obj = value
        .as_object()
        .ok_or_else(|| AggError::Engine(format!("{} must be an object", what)))?;
    let mut iter = obj.iter();
    match (iter.next(), iter.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(AggError::Engine(format!("{} must have exactly one key", what))),
    }
}

pub fn matches(doc: &Value, query: &Value) -> AggResult<bool> {
    let (kind, body) = single_entry(query, "query")?;
    match kind.as_str() {
        "match_all" => Ok(true),
        "term" => {
            let (field, spec) = single_entry(body, "term")?;
            let expected = spec.get("value").unwrap_or(spec);
            Ok(values_at(doc, field).iter().any(|v| json_eq(v, expected)))
        }
        "range" => {
            let (field, bounds) = single_entry(body, "range")?;
            let bounds = bounds
                .as_object()
                .ok_or_else(|| AggError::Engine("range bounds must be an object".into()))?;
            Ok(values_at(doc, field).iter().any(|v| {
                bounds.iter().all(|(op, bound)| {
                    let Some(ord) = compare(v, bound) else {
                        return false;
                    };
                    match op.as_str() {
                        "gt" => ord == Ordering::Greater,
                        "gte" => ord != Ordering::Less,
                        "lt" => ord == Ordering::Less,
                        "lte" => ord != Ordering::Greater,
                        _ => false,
                    }
                })
            }))
        }
        "exists" => {
            let field = body
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| AggError::Engine("exists without field".into()))?;
            Ok(values_at(doc, field).iter().any(|v| !v.is_null()))
        }
        "bool" => {
            for clause in clauses(body, "must") {
                if !matches(doc, clause)? {
                    return Ok(false);
                }
            }
            for clause in clauses(body, "must_not") {
                if matches(doc, clause)? {
                    return Ok(false);
                }
            }
            let should = clauses(body, "should");
            if should.is_empty() {
                return Ok(true);
            }
            let required = body
                .get("minimum_should_match")
                .and_then(Value::as_u64)
                .unwrap_or(if clauses(body, "must").is_empty() { 1 } else { 0 });
            let mut hit = 0;
            for clause in should {
                if matches(doc, clause)? {
                    hit += 1;
                }
            }
            Ok(hit >= required)
        }
        "nested" => {
            let path = body
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| AggError::Engine("nested without path".into()))?;
            let inner = body
                .get("query")
                .ok_or_else(|| AggError::Engine("nested without query".into()))?;
            for element in values_at(doc, path) {
                let mut scoped = doc.clone();
                set_path(&mut scoped, path, element.clone());
                if matches(&scoped, inner)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(AggError::Engine(format!("unknown query '{}'", other))),
    }
}

fn clauses<'v>(body: &'v Value, key: &str) -> &'v [Value] {
    body.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// All values at a dotted path; arrays are flattened
pub fn values_at<'v>(doc: &'v Value, path: &str) -> Vec<&'v Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(v) = item.get(segment) {
                            next.push(v);
                        }
                    }
                }
                other => {
                    if let Some(v) = other.get(segment) {
                        next.push(v);
                    }
                }
            }
        }
        current = next;
    }

    let mut out = Vec::new();
    for value in current {
        match value {
            Value::Array(items) => out.extend(items.iter()),
            other => out.push(other),
        }
    }
    out
}

fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };
    let mut current = doc;
    for segment in segments {
        let Some(next) = current.get_mut(segment) else {
            return;
        };
        current = next;
    }
    if let Some(obj) = current.as_object_mut() {
        obj.insert(last.to_string(), value);
    }
}

fn json_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

/// Numbers by value, strings lexicographically (dates are RFC 3339 text)
fn compare(actual: &Value, bound: &Value) -> Option<Ordering> {
    match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

// =============================================================================
// Aggregation evaluation
// =============================================================================

pub fn run_aggs(aggs: &Map<String, Value>, docs: &[&Value]) -> AggResult<Map<String, Value>> {
    let mut out = Map::new();
    for (name, spec) in aggs {
        let spec = spec
            .as_object()
            .ok_or_else(|| AggError::Engine(format!("aggregation '{}' must be an object", name)))?;
        let sub = spec.get("aggs").and_then(Value::as_object);
        let (kind, body) = spec
            .iter()
            .find(|(k, _)| k.as_str() != "aggs")
            .ok_or_else(|| AggError::Engine(format!("aggregation '{}' has no kind", name)))?;
        out.insert(name.clone(), run_agg(kind, body, sub, docs)?);
    }
    Ok(out)
}

fn run_agg(
    kind: &str,
    body: &Value,
    sub: Option<&Map<String, Value>>,
    docs: &[&Value],
) -> AggResult<Value> {
    let field = body.get("field").and_then(Value::as_str).unwrap_or("");
    let numbers = || -> Vec<f64> {
        docs.iter()
            .flat_map(|d| values_at(d, field))
            .filter_map(Value::as_f64)
            .collect()
    };

    match kind {
        "sum" => Ok(json!({ "value": numbers().iter().sum::<f64>() })),
        "avg" => {
            let n = numbers();
            let avg = (!n.is_empty()).then(|| n.iter().sum::<f64>() / n.len() as f64);
            Ok(json!({ "value": avg }))
        }
        "min" => Ok(json!({ "value": numbers().into_iter().reduce(f64::min) })),
        "max" => Ok(json!({ "value": numbers().into_iter().reduce(f64::max) })),
        "value_count" => {
            let count = docs
                .iter()
                .flat_map(|d| values_at(d, field))
                .filter(|v| !v.is_null())
                .count();
            Ok(json!({ "value": count }))
        }
        "cardinality" => {
            let mut seen: Vec<String> = docs
                .iter()
                .flat_map(|d| values_at(d, field))
                .filter(|v| !v.is_null())
                .map(Value::to_string)
                .collect();
            seen.sort();
            seen.dedup();
            Ok(json!({ "value": seen.len() }))
        }
        "stats" => {
            let n = numbers();
            let sum: f64 = n.iter().sum();
            let avg = (!n.is_empty()).then(|| sum / n.len() as f64);
            Ok(json!({
                "count": n.len(),
                "min": n.iter().copied().reduce(f64::min),
                "max": n.iter().copied().reduce(f64::max),
                "avg": avg,
                "sum": sum,
            }))
        }
        "percentiles" => {
            let mut n = numbers();
            n.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let mut values = Map::new();
            for p in body
                .get("percents")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[])
            {
                let p = p.as_f64().unwrap_or(0.0);
                values.insert(format!("{:?}", p), json!(percentile(&n, p)));
            }
            Ok(json!({ "values": values }))
        }
        "terms" => {
            let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
            terms(field, size, sub, docs)
        }
        "histogram" => {
            let interval = body
                .get("interval")
                .and_then(Value::as_f64)
                .ok_or_else(|| AggError::Engine("histogram without interval".into()))?;
            histogram(field, interval, sub, docs)
        }
        "date_histogram" => {
            let interval = body
                .get("calendar_interval")
                .and_then(Value::as_str)
                .ok_or_else(|| AggError::Engine("date_histogram without interval".into()))?;
            date_histogram(field, interval, sub, docs)
        }
        "filter" => {
            let mut matched = Vec::new();
            for doc in docs {
                if matches(doc, body)? {
                    matched.push(*doc);
                }
            }
            let mut result = Map::new();
            result.insert("doc_count".into(), json!(matched.len()));
            if let Some(sub) = sub {
                result.extend(run_aggs(sub, &matched)?);
            }
            Ok(Value::Object(result))
        }
        "top_hits" => top_hits(body, docs),
        other => Err(AggError::Engine(format!("unknown aggregation '{}'", other))),
    }
}

fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

fn bucket(
    key: Value,
    key_as_string: Option<String>,
    docs: &[&Value],
    sub: Option<&Map<String, Value>>,
) -> AggResult<Value> {
    let mut b = Map::new();
    b.insert("key".into(), key);
    if let Some(s) = key_as_string {
        b.insert("key_as_string".into(), json!(s));
    }
    b.insert("doc_count".into(), json!(docs.len()));
    if let Some(sub) = sub {
        b.extend(run_aggs(sub, docs)?);
    }
    Ok(Value::Object(b))
}

fn terms(
    field: &str,
    size: usize,
    sub: Option<&Map<String, Value>>,
    docs: &[&Value],
) -> AggResult<Value> {
    let mut groups: Vec<(Value, Vec<&Value>)> = Vec::new();
    for doc in docs {
        let mut keys: Vec<&Value> = values_at(doc, field)
            .into_iter()
            .filter(|v| !v.is_null())
            .collect();
        keys.dedup();
        for key in keys {
            match groups.iter_mut().find(|(k, _)| json_eq(k, key)) {
                Some((_, members)) => members.push(*doc),
                None => groups.push((key.clone(), vec![*doc])),
            }
        }
    }

    groups.sort_by(|(ka, da), (kb, db)| {
        db.len()
            .cmp(&da.len())
            .then_with(|| compare(ka, kb).unwrap_or_else(|| ka.to_string().cmp(&kb.to_string())))
    });
    let other: usize = groups.iter().skip(size).map(|(_, d)| d.len()).sum();

    let mut buckets = Vec::new();
    for (key, members) in groups.into_iter().take(size) {
        let (key, key_as_string) = match key {
            Value::Bool(b) => (json!(if b { 1 } else { 0 }), Some(b.to_string())),
            other => (other, None),
        };
        buckets.push(bucket(key, key_as_string, &members, sub)?);
    }
    Ok(json!({
        "doc_count_error_upper_bound": 0,
        "sum_other_doc_count": other,
        "buckets": buckets,
    }))
}

fn histogram(
    field: &str,
    interval: f64,
    sub: Option<&Map<String, Value>>,
    docs: &[&Value],
) -> AggResult<Value> {
    let mut groups: Vec<(i64, Vec<&Value>)> = Vec::new();
    for doc in docs {
        for v in values_at(doc, field).into_iter().filter_map(Value::as_f64) {
            let slot = (v / interval).floor() as i64;
            match groups.iter_mut().find(|(s, _)| *s == slot) {
                Some((_, members)) => members.push(*doc),
                None => groups.push((slot, vec![*doc])),
            }
        }
    }
    groups.sort_by_key(|(s, _)| *s);

    // Empty buckets between the first and last slot are reported
    let mut buckets = Vec::new();
    if let (Some(first), Some(last)) = (groups.first().map(|g| g.0), groups.last().map(|g| g.0)) {
        for slot in first..=last {
            let members = groups
                .iter()
                .find(|(s, _)| *s == slot)
                .map(|(_, d)| d.clone())
                .unwrap_or_default();
            buckets.push(bucket(json!(slot as f64 * interval), None, &members, sub)?);
        }
    }
    Ok(json!({ "buckets": buckets }))
}

fn date_histogram(
    field: &str,
    interval: &str,
    sub: Option<&Map<String, Value>>,
    docs: &[&Value],
) -> AggResult<Value> {
    let mut groups: Vec<(DateTime<Utc>, Vec<&Value>)> = Vec::new();
    for doc in docs {
        for v in values_at(doc, field).into_iter().filter_map(Value::as_str) {
            let parsed = DateTime::parse_from_rfc3339(v)
                .map_err(|e| AggError::Engine(format!("bad date '{}': {}", v, e)))?
                .with_timezone(&Utc);
            let start = truncate(parsed, interval)?;
            match groups.iter_mut().find(|(s, _)| *s == start) {
                Some((_, members)) => members.push(*doc),
                None => groups.push((start, vec![*doc])),
            }
        }
    }
    groups.sort_by_key(|(s, _)| *s);

    let mut buckets = Vec::new();
    for (start, members) in groups {
        buckets.push(bucket(
            json!(start.timestamp_millis()),
            Some(aggtree::expr::format_datetime(&start)),
            &members,
            sub,
        )?);
    }
    Ok(json!({ "buckets": buckets }))
}

fn truncate(at: DateTime<Utc>, interval: &str) -> AggResult<DateTime<Utc>> {
    let date = at.date_naive();
    let day = match interval {
        "minute" | "hour" | "day" => date,
        "week" => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        "month" => first_of(date.year(), date.month())?,
        "quarter" => first_of(date.year(), (date.month() - 1) / 3 * 3 + 1)?,
        "year" => first_of(date.year(), 1)?,
        other => return Err(AggError::Engine(format!("unknown interval '{}'", other))),
    };
    let time = match interval {
        "minute" => NaiveTime::from_hms_opt(at.hour(), at.minute(), 0),
        "hour" => NaiveTime::from_hms_opt(at.hour(), 0, 0),
        _ => NaiveTime::from_hms_opt(0, 0, 0),
    }
    .ok_or_else(|| AggError::Engine("invalid time".into()))?;
    Ok(Utc.from_utc_datetime(&day.and_time(time)))
}

fn first_of(year: i32, month: u32) -> AggResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| AggError::Engine("invalid date".into()))
}

fn top_hits(body: &Value, docs: &[&Value]) -> AggResult<Value> {
    let size = body.get("size").and_then(Value::as_u64).unwrap_or(3) as usize;
    let mut ordered: Vec<&Value> = docs.to_vec();

    if let Some(sort) = body
        .get("sort")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
    {
        let (field, spec) = single_entry(sort, "sort")?;
        let desc = spec.get("order").and_then(Value::as_str) == Some("desc");
        ordered.sort_by(|a, b| {
            let ka = values_at(a, field).first().copied().cloned().unwrap_or(Value::Null);
            let kb = values_at(b, field).first().copied().cloned().unwrap_or(Value::Null);
            let ord = compare(&ka, &kb).unwrap_or(Ordering::Equal);
            if desc {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    let includes: Vec<&str> = body
        .get("_source")
        .and_then(|s| s.get("includes"))
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let hits: Vec<Value> = ordered
        .iter()
        .take(size)
        .map(|doc| {
            let source = if includes.is_empty() {
                (*doc).clone()
            } else {
                project(doc, &includes)
            };
            json!({ "_source": source })
        })
        .collect();
    Ok(json!({ "hits": { "total": { "value": docs.len() }, "hits": hits } }))
}

fn project(doc: &Value, includes: &[&str]) -> Value {
    let mut out = json!({});
    for path in includes {
        let mut source = doc;
        let mut found = true;
        for segment in path.split('.') {
            match source.get(segment) {
                Some(v) => source = v,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if !found {
            continue;
        }
        let mut target = &mut out;
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            let Some(obj) = target.as_object_mut() else {
                break;
            };
            if i + 1 == segments.len() {
                obj.insert(segment.to_string(), source.clone());
                break;
            }
            target = obj.entry(segment.to_string()).or_insert_with(|| json!({}));
        }
    }
    out
}

// =============================================================================
// Fixtures
// =============================================================================

/// Ten documents: `age` and `x` run 1..=10, `name` is `name{i % 3}`, and
/// `nickname` is null on odd ids
pub fn numbers() -> Vec<Value> {
    (1..=10)
        .map(|i| {
            let nickname = if i % 2 == 0 {
                json!(format!("nick{}", i))
            } else {
                Value::Null
            };
            json!({
                "id": i,
                "age": i,
                "x": i,
                "name": format!("name{}", i % 3),
                "nickname": nickname,
            })
        })
        .collect()
}

pub const CAR_TYPES: [&str; 3] = ["Sedan", "Suv", "Truck"];
pub const ENGINE_TYPES: [&str; 2] = ["Diesel", "Electric"];

/// Twelve cars: four of each car type, each split two and two by engine type
pub fn cars() -> Vec<Value> {
    (0..12)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("car{}", i),
                "carType": CAR_TYPES[i % 3],
                "engineType": ENGINE_TYPES[i % 2],
                "weight": 1000 + 100 * i,
                "electric": i % 2 == 1,
                "created": format!("2024-{:02}-15T10:30:00.000Z", i % 4 + 1),
                "engine": { "power": 100 + 10 * i },
                "passengers": [
                    { "name": format!("driver{}", i), "age": 30 + i },
                    { "name": format!("child{}", i), "age": i % 5 },
                ],
            })
        })
        .collect()
}
