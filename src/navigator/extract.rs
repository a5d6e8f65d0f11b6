//! Typed extraction from result trees
//!
//! Every lookup recomputes the canonical name from the same inputs the
//! builder saw. A conditional metric is read from inside the filter named by
//! its predicate signature.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::aggregation::{MetricKind, SortDirection};
use crate::errors::{AggError, AggResult};
use crate::expr::{FieldExpr, PredicateExpr};
use crate::field::FieldResolver;
use crate::naming::{canonical_name, predicate_signature, AggTarget, CanonicalName};
use crate::observability::{log_event_with_fields, Event};

use super::convert::FromMetricValue;
use super::result::{buckets_of, lookup_in, object_of, Bucket, ResultTree};

/// Result of a `stats` aggregation. Bounds are absent when no document
/// carried the field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsValue {
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    #[serde(default)]
    pub sum: f64,
}

/// One entry of a `percentiles` result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentile {
    pub percent: f64,
    pub value: Option<f64>,
}

/// Reads typed values out of a `ResultTree`
pub struct ResultNavigator;

impl ResultNavigator {
    pub fn sum<T: FromMetricValue>(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<T> {
        Self::metric_value(tree, MetricKind::Sum, field, predicate)
    }

    /// Number of values (`value_count`)
    pub fn count<T: FromMetricValue>(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<T> {
        Self::metric_value(tree, MetricKind::Count, field, predicate)
    }

    pub fn average<T: FromMetricValue>(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<T> {
        Self::metric_value(tree, MetricKind::Average, field, predicate)
    }

    pub fn min<T: FromMetricValue>(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<T> {
        Self::metric_value(tree, MetricKind::Min, field, predicate)
    }

    pub fn max<T: FromMetricValue>(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<T> {
        Self::metric_value(tree, MetricKind::Max, field, predicate)
    }

    pub fn cardinality<T: FromMetricValue>(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<T> {
        Self::metric_value(tree, MetricKind::Cardinality, field, predicate)
    }

    pub fn stats(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<StatsValue> {
        let name = metric_name(MetricKind::Stats, field, predicate)?;
        let body = scoped(tree, &name)?;
        Ok(StatsValue::deserialize(body)?)
    }

    /// Percentiles in engine order
    pub fn percentiles(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<Vec<Percentile>> {
        let name = metric_name(MetricKind::Percentiles, field, predicate)?;
        let body = scoped(tree, &name)?;
        let values = body
            .get("values")
            .and_then(Value::as_object)
            .ok_or_else(|| traced(AggError::coercion(&name.name, body, "percentiles")))?;

        values
            .iter()
            .map(|(percent, value)| {
                let percent = percent
                    .parse::<f64>()
                    .map_err(|_| traced(AggError::coercion(&name.name, percent, "f64")))?;
                let value = Option::<f64>::from_metric(&name.name, value).map_err(traced)?;
                Ok(Percentile { percent, value })
            })
            .collect()
    }

    /// The single value kept by `first`, or `None` when no document had one
    pub fn first<T: FromStr>(
        tree: &ResultTree,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<Option<T>> {
        let name = metric_name(MetricKind::First, field, predicate)?;
        let buckets = buckets_of(&name.name, scoped(tree, &name)?)?;
        buckets
            .first()
            .map(|b| b.key().parse(&name.name))
            .transpose()
    }

    /// Distinct values in engine bucket order
    pub fn distinct<T: FromStr>(tree: &ResultTree, field: &FieldExpr) -> AggResult<Vec<T>> {
        let name = metric_name(MetricKind::Distinct, field, None)?;
        let buckets = buckets_of(&name.name, scoped(tree, &name)?)?;
        buckets.iter().map(|b| b.key().parse(&name.name)).collect()
    }

    /// Buckets of a `group_by(field)`
    pub fn group_by(tree: &ResultTree, field: &FieldExpr) -> AggResult<Vec<Bucket>> {
        let wire = wire_name(field)?;
        tree.buckets(&canonical_name(&AggTarget::Terms { field: &wire }, None).name)
    }

    /// Buckets of a `group_by_key(key)`
    pub fn group_by_key(tree: &ResultTree, key: &str) -> AggResult<Vec<Bucket>> {
        tree.buckets(&canonical_name(&AggTarget::Terms { field: key }, None).name)
    }

    pub fn histogram(tree: &ResultTree, field: &FieldExpr) -> AggResult<Vec<Bucket>> {
        let wire = wire_name(field)?;
        tree.buckets(&canonical_name(&AggTarget::Histogram { field: &wire }, None).name)
    }

    pub fn date_histogram(tree: &ResultTree, field: &FieldExpr) -> AggResult<Vec<Bucket>> {
        let wire = wire_name(field)?;
        tree.buckets(&canonical_name(&AggTarget::DateHistogram { field: &wire }, None).name)
    }

    /// Sources of an unsorted `top_hits`
    pub fn top_hits<T: DeserializeOwned>(tree: &ResultTree) -> AggResult<Vec<T>> {
        let name = canonical_name(&AggTarget::TopHits { sort: None }, None);
        hits_of(&name.name, tree.lookup(&name.name)?)
    }

    /// Sources of a `sorted_top_hits`
    pub fn sorted_top_hits<T: DeserializeOwned>(
        tree: &ResultTree,
        sort: &FieldExpr,
        direction: SortDirection,
    ) -> AggResult<Vec<T>> {
        let wire = wire_name(sort)?;
        let name = canonical_name(
            &AggTarget::TopHits {
                sort: Some((&wire, direction)),
            },
            None,
        );
        hits_of(&name.name, tree.lookup(&name.name)?)
    }

    /// Number of documents matching a conditional metric's predicate
    pub fn filter_doc_count(tree: &ResultTree, predicate: &PredicateExpr) -> AggResult<u64> {
        let signature = predicate_signature(predicate)?;
        let body = tree.lookup(&signature)?;
        body.get("doc_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| traced(AggError::coercion(&signature, body, "doc_count")))
    }

    fn metric_value<T: FromMetricValue>(
        tree: &ResultTree,
        kind: MetricKind,
        field: &FieldExpr,
        predicate: Option<&PredicateExpr>,
    ) -> AggResult<T> {
        let name = metric_name(kind, field, predicate)?;
        let body = scoped(tree, &name)?;
        let value = body.get("value").unwrap_or(&Value::Null);
        T::from_metric(&name.name, value).map_err(traced)
    }
}

fn wire_name(field: &FieldExpr) -> AggResult<String> {
    Ok(FieldResolver::resolve(field)?.wire())
}

fn metric_name(
    kind: MetricKind,
    field: &FieldExpr,
    predicate: Option<&PredicateExpr>,
) -> AggResult<CanonicalName> {
    let wire = wire_name(field)?;
    let signature = predicate.map(predicate_signature).transpose()?;
    Ok(canonical_name(
        &AggTarget::Metric { kind, field: &wire },
        signature.as_deref(),
    ))
}

/// Finds `name`, descending into its filter first for conditional metrics
fn scoped<'t>(tree: &'t ResultTree, name: &CanonicalName) -> AggResult<&'t Value> {
    match &name.filter {
        None => tree.lookup(&name.name),
        Some(filter) => {
            let body = object_of(filter, tree.lookup(filter)?)?;
            lookup_in(body, &name.name)
        }
    }
}

fn hits_of<T: DeserializeOwned>(name: &str, body: &Value) -> AggResult<Vec<T>> {
    let hits = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| traced(AggError::coercion(name, body, "hits")))?;
    hits.iter()
        .map(|hit| {
            let source = hit.get("_source").cloned().unwrap_or(Value::Null);
            Ok(serde_json::from_value(source)?)
        })
        .collect()
}

fn traced(err: AggError) -> AggError {
    if let AggError::ValueCoercion { name, .. } = &err {
        log_event_with_fields(Event::ValueCoercionFailed, &[("name", name.as_str())]);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::field;
    use serde_json::json;

    fn tree(value: Value) -> ResultTree {
        ResultTree::from_json(value).unwrap()
    }

    #[test]
    fn test_metric_lookup_by_canonical_name() {
        let t = tree(json!({"SumWeight": {"value": 5400.0}, "AverageWeight": {"value": null}}));
        let sum: i64 = ResultNavigator::sum(&t, &field("Weight"), None).unwrap();
        assert_eq!(sum, 5400);
        let avg: Option<f64> = ResultNavigator::average(&t, &field("Weight"), None).unwrap();
        assert_eq!(avg, None);
    }

    #[test]
    fn test_conditional_metric_scoped_to_filter() {
        let pred = field("Weight").gt(1200);
        let t = tree(json!({
            "SumWeight": {"value": 100.0},
            "weight_GreaterThan_1200": {"doc_count": 2, "SumWeight": {"value": 7.0}}
        }));
        let inner: f64 = ResultNavigator::sum(&t, &field("Weight"), Some(&pred)).unwrap();
        assert_eq!(inner, 7.0);
        assert_eq!(ResultNavigator::filter_doc_count(&t, &pred).unwrap(), 2);
    }

    #[test]
    fn test_missing_metric_inside_filter() {
        let pred = field("Weight").gt(1200);
        let t = tree(json!({"weight_GreaterThan_1200": {"doc_count": 2, "CountId": {"value": 2}}}));
        let err = ResultNavigator::sum::<f64>(&t, &field("Weight"), Some(&pred)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no aggregation named 'SumWeight'; present aggregations: CountId"
        );
    }

    #[test]
    fn test_stats_and_percentiles() {
        let t = tree(json!({
            "StatsWeight": {"count": 2, "min": 1.0, "max": 3.0, "avg": 2.0, "sum": 4.0},
            "PercentileWeight": {"values": {"50.0": 2.0, "99.0": null}}
        }));
        let stats = ResultNavigator::stats(&t, &field("Weight"), None).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.max, Some(3.0));

        let p = ResultNavigator::percentiles(&t, &field("Weight"), None).unwrap();
        assert_eq!(
            p,
            vec![
                Percentile { percent: 50.0, value: Some(2.0) },
                Percentile { percent: 99.0, value: None },
            ]
        );
    }

    #[test]
    fn test_first_and_distinct() {
        let t = tree(json!({
            "FirstName": {"buckets": [{"key": "name1", "doc_count": 4}]},
            "DistinctAge": {"buckets": [{"key": 3, "doc_count": 1}, {"key": 1, "doc_count": 1}]}
        }));
        let first: Option<String> = ResultNavigator::first(&t, &field("Name"), None).unwrap();
        assert_eq!(first.as_deref(), Some("name1"));
        let ages: Vec<u32> = ResultNavigator::distinct(&t, &field("Age")).unwrap();
        assert_eq!(ages, vec![3, 1]);
    }

    #[test]
    fn test_first_of_empty_buckets() {
        let t = tree(json!({"FirstName": {"buckets": []}}));
        let first: Option<String> = ResultNavigator::first(&t, &field("Name"), None).unwrap();
        assert_eq!(first, None);
    }

    #[test]
    fn test_top_hits_sources() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Doc {
            name: String,
        }
        let t = tree(json!({
            "TopHitsWeightDesc": {"hits": {"total": {"value": 1}, "hits": [{"_source": {"name": "a"}}]}}
        }));
        let docs: Vec<Doc> =
            ResultNavigator::sorted_top_hits(&t, &field("Weight"), SortDirection::Desc).unwrap();
        assert_eq!(docs, vec![Doc { name: "a".into() }]);
        assert!(ResultNavigator::top_hits::<Doc>(&t).is_err());
    }
}
