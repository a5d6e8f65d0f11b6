//! Result navigation bound to one tree

use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::aggregation::SortDirection;
use crate::errors::AggResult;
use crate::expr::{FieldExpr, PredicateExpr};

use super::convert::FromMetricValue;
use super::extract::{Percentile, ResultNavigator, StatsValue};
use super::result::{Bucket, ResultTree};

/// `ResultNavigator` operations over a single `ResultTree`
#[derive(Debug, Clone, Copy)]
pub struct AggregationContainer<'a> {
    tree: &'a ResultTree,
}

impl<'a> AggregationContainer<'a> {
    pub fn new(tree: &'a ResultTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a ResultTree {
        self.tree
    }

    pub fn sum<T: FromMetricValue>(&self, field: &FieldExpr) -> AggResult<T> {
        ResultNavigator::sum(self.tree, field, None)
    }

    pub fn sum_if<T: FromMetricValue>(&self, field: &FieldExpr, predicate: &PredicateExpr) -> AggResult<T> {
        ResultNavigator::sum(self.tree, field, Some(predicate))
    }

    pub fn count<T: FromMetricValue>(&self, field: &FieldExpr) -> AggResult<T> {
        ResultNavigator::count(self.tree, field, None)
    }

    pub fn count_if<T: FromMetricValue>(&self, field: &FieldExpr, predicate: &PredicateExpr) -> AggResult<T> {
        ResultNavigator::count(self.tree, field, Some(predicate))
    }

    pub fn average<T: FromMetricValue>(&self, field: &FieldExpr) -> AggResult<T> {
        ResultNavigator::average(self.tree, field, None)
    }

    pub fn average_if<T: FromMetricValue>(
        &self,
        field: &FieldExpr,
        predicate: &PredicateExpr,
    ) -> AggResult<T> {
        ResultNavigator::average(self.tree, field, Some(predicate))
    }

    pub fn min<T: FromMetricValue>(&self, field: &FieldExpr) -> AggResult<T> {
        ResultNavigator::min(self.tree, field, None)
    }

    pub fn min_if<T: FromMetricValue>(&self, field: &FieldExpr, predicate: &PredicateExpr) -> AggResult<T> {
        ResultNavigator::min(self.tree, field, Some(predicate))
    }

    pub fn max<T: FromMetricValue>(&self, field: &FieldExpr) -> AggResult<T> {
        ResultNavigator::max(self.tree, field, None)
    }

    pub fn max_if<T: FromMetricValue>(&self, field: &FieldExpr, predicate: &PredicateExpr) -> AggResult<T> {
        ResultNavigator::max(self.tree, field, Some(predicate))
    }

    pub fn cardinality<T: FromMetricValue>(&self, field: &FieldExpr) -> AggResult<T> {
        ResultNavigator::cardinality(self.tree, field, None)
    }

    pub fn cardinality_if<T: FromMetricValue>(
        &self,
        field: &FieldExpr,
        predicate: &PredicateExpr,
    ) -> AggResult<T> {
        ResultNavigator::cardinality(self.tree, field, Some(predicate))
    }

    pub fn stats(&self, field: &FieldExpr) -> AggResult<StatsValue> {
        ResultNavigator::stats(self.tree, field, None)
    }

    pub fn stats_if(&self, field: &FieldExpr, predicate: &PredicateExpr) -> AggResult<StatsValue> {
        ResultNavigator::stats(self.tree, field, Some(predicate))
    }

    pub fn percentiles(&self, field: &FieldExpr) -> AggResult<Vec<Percentile>> {
        ResultNavigator::percentiles(self.tree, field, None)
    }

    pub fn percentiles_if(
        &self,
        field: &FieldExpr,
        predicate: &PredicateExpr,
    ) -> AggResult<Vec<Percentile>> {
        ResultNavigator::percentiles(self.tree, field, Some(predicate))
    }

    pub fn first<T: FromStr>(&self, field: &FieldExpr) -> AggResult<Option<T>> {
        ResultNavigator::first(self.tree, field, None)
    }

    pub fn first_if<T: FromStr>(&self, field: &FieldExpr, predicate: &PredicateExpr) -> AggResult<Option<T>> {
        ResultNavigator::first(self.tree, field, Some(predicate))
    }

    pub fn distinct<T: FromStr>(&self, field: &FieldExpr) -> AggResult<Vec<T>> {
        ResultNavigator::distinct(self.tree, field)
    }

    pub fn group_by(&self, field: &FieldExpr) -> AggResult<Vec<Bucket>> {
        ResultNavigator::group_by(self.tree, field)
    }

    pub fn group_by_key(&self, key: &str) -> AggResult<Vec<Bucket>> {
        ResultNavigator::group_by_key(self.tree, key)
    }

    pub fn histogram(&self, field: &FieldExpr) -> AggResult<Vec<Bucket>> {
        ResultNavigator::histogram(self.tree, field)
    }

    pub fn date_histogram(&self, field: &FieldExpr) -> AggResult<Vec<Bucket>> {
        ResultNavigator::date_histogram(self.tree, field)
    }

    pub fn top_hits<T: DeserializeOwned>(&self) -> AggResult<Vec<T>> {
        ResultNavigator::top_hits(self.tree)
    }

    pub fn sorted_top_hits<T: DeserializeOwned>(
        &self,
        sort: &FieldExpr,
        direction: SortDirection,
    ) -> AggResult<Vec<T>> {
        ResultNavigator::sorted_top_hits(self.tree, sort, direction)
    }

    pub fn filter_doc_count(&self, predicate: &PredicateExpr) -> AggResult<u64> {
        ResultNavigator::filter_doc_count(self.tree, predicate)
    }
}
