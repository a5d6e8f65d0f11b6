//! Aggregation building
//!
//! Lowers an `AggSpec` into named `AggNode`s. Names come from
//! `naming::canonical_name`; the navigator recomputes them from the same
//! inputs.

use crate::config::BuilderOptions;
use crate::errors::{AggError, AggResult};
use crate::expr::{FieldExpr, PredicateExpr};
use crate::field::FieldResolver;
use crate::filter::FilterCompiler;
use crate::naming::{canonical_name, predicate_signature, AggTarget};
use crate::observability::{log_event_with_fields, Event};

use super::node::{AggKind, AggNode, Aggregations, MetricOp};
use super::spec::{AggSpec, GroupKey, MetricDecl, MetricKind, SpecEntry, TopHitsSpec};

/// Builds aggregation requests from specs
#[derive(Debug, Clone, Default)]
pub struct AggregationBuilder {
    options: BuilderOptions,
    compiler: FilterCompiler,
}

impl AggregationBuilder {
    /// Creates a builder with the given options
    pub fn new(options: BuilderOptions) -> Self {
        let compiler = FilterCompiler::new(options.compiler.clone());
        Self { options, compiler }
    }

    /// Returns the builder options
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Builds the aggregation request. An empty spec yields an empty request.
    pub fn build(&self, spec: &AggSpec) -> AggResult<Aggregations> {
        match self.build_level(spec) {
            Ok(nodes) => {
                let count = nodes.len().to_string();
                log_event_with_fields(Event::AggregationsBuilt, &[("top_level", count.as_str())]);
                Ok(Aggregations::new(nodes))
            }
            Err(err) => {
                log_event_with_fields(Event::AggregationsRejected, &[("code", err.code().code())]);
                Err(err)
            }
        }
    }

    fn build_level(&self, spec: &AggSpec) -> AggResult<Vec<AggNode>> {
        let mut level = Vec::new();
        for entry in spec.entries() {
            match entry {
                SpecEntry::Metric(decl) => self.add_metric(&mut level, decl)?,
                SpecEntry::Group { key, inner } => {
                    let mut node = self.group_node(key)?;
                    node.children = self.build_level(inner)?;
                    insert_unique(&mut level, node)?;
                }
            }
        }
        Ok(level)
    }

    /// Adds a metric, routing conditional metrics into the filter named by
    /// their predicate signature. Metrics sharing a predicate share a filter.
    ///
    /// A same-named node is reused only if it is a filter with the same
    /// compiled query.
    fn add_metric(&self, level: &mut Vec<AggNode>, decl: &MetricDecl) -> AggResult<()> {
        let (node, predicate) = self.metric_node(decl)?;
        let Some(predicate) = predicate else {
            return insert_unique(level, node);
        };

        let signature = predicate_signature(predicate)?;
        let query = self.compiler.compile(predicate)?;
        if let Some(existing) = level.iter_mut().find(|n| n.name == signature) {
            return match &existing.kind {
                AggKind::Filter { query: shared } if *shared == query => {
                    insert_unique(&mut existing.children, node)
                }
                _ => Err(AggError::DuplicateAggregation(signature)),
            };
        }

        let mut filter = AggNode::leaf(signature, AggKind::Filter { query });
        filter.children.push(node);
        level.push(filter);
        Ok(())
    }

    fn metric_node<'d>(&self, decl: &'d MetricDecl) -> AggResult<(AggNode, Option<&'d PredicateExpr>)> {
        match decl {
            MetricDecl::Field {
                kind,
                field,
                predicate,
            } => {
                let wire = wire_name(field)?;
                let name = canonical_name(&AggTarget::Metric { kind: *kind, field: &wire }, None).name;
                let agg = match kind {
                    MetricKind::Sum => metric(MetricOp::Sum, wire),
                    MetricKind::Count => metric(MetricOp::ValueCount, wire),
                    MetricKind::Average => metric(MetricOp::Avg, wire),
                    MetricKind::Min => metric(MetricOp::Min, wire),
                    MetricKind::Max => metric(MetricOp::Max, wire),
                    MetricKind::Cardinality => metric(MetricOp::Cardinality, wire),
                    MetricKind::Stats => metric(MetricOp::Stats, wire),
                    MetricKind::First => AggKind::Terms {
                        field: wire,
                        size: 1,
                    },
                    MetricKind::Distinct => AggKind::Terms {
                        field: wire,
                        size: self.options.terms_size,
                    },
                    MetricKind::Percentiles => AggKind::Percentiles {
                        field: wire,
                        percents: self.options.default_percents.clone(),
                    },
                    MetricKind::TopHits => {
                        return Err(AggError::UnsupportedPredicate(
                            "top hits take a size and projection, not a field".into(),
                        ))
                    }
                };
                Ok((AggNode::leaf(name, agg), predicate.as_ref()))
            }
            MetricDecl::Percentiles {
                field,
                percents,
                predicate,
            } => {
                let wire = wire_name(field)?;
                let name = canonical_name(
                    &AggTarget::Metric {
                        kind: MetricKind::Percentiles,
                        field: &wire,
                    },
                    None,
                )
                .name;
                let percents = if percents.is_empty() {
                    self.options.default_percents.clone()
                } else {
                    percents.clone()
                };
                Ok((
                    AggNode::leaf(name, AggKind::Percentiles { field: wire, percents }),
                    predicate.as_ref(),
                ))
            }
            MetricDecl::TopHits(spec) => Ok((self.top_hits_node(spec)?, None)),
        }
    }

    fn top_hits_node(&self, spec: &TopHitsSpec) -> AggResult<AggNode> {
        let includes = spec
            .fields
            .iter()
            .map(wire_name)
            .collect::<AggResult<Vec<_>>>()?;
        let sort = match &spec.sort {
            Some((field, direction)) => Some((wire_name(field)?, *direction)),
            None => None,
        };
        let name = canonical_name(
            &AggTarget::TopHits {
                sort: sort.as_ref().map(|(f, d)| (f.as_str(), *d)),
            },
            None,
        )
        .name;
        Ok(AggNode::leaf(
            name,
            AggKind::TopHits {
                size: spec.size,
                sort,
                includes,
            },
        ))
    }

    fn group_node(&self, key: &GroupKey) -> AggResult<AggNode> {
        let size = self.options.terms_size;
        Ok(match key {
            GroupKey::Field(field) => {
                let wire = wire_name(field)?;
                let name = canonical_name(&AggTarget::Terms { field: &wire }, None).name;
                AggNode::leaf(name, AggKind::Terms { field: wire, size })
            }
            GroupKey::Key(key) => {
                let name = canonical_name(&AggTarget::Terms { field: key }, None).name;
                AggNode::leaf(
                    name,
                    AggKind::Terms {
                        field: key.clone(),
                        size,
                    },
                )
            }
            GroupKey::Histogram { field, interval } => {
                let wire = wire_name(field)?;
                let name = canonical_name(&AggTarget::Histogram { field: &wire }, None).name;
                AggNode::leaf(
                    name,
                    AggKind::Histogram {
                        field: wire,
                        interval: *interval,
                    },
                )
            }
            GroupKey::DateHistogram { field, interval } => {
                let wire = wire_name(field)?;
                let name = canonical_name(&AggTarget::DateHistogram { field: &wire }, None).name;
                AggNode::leaf(
                    name,
                    AggKind::DateHistogram {
                        field: wire,
                        interval: *interval,
                    },
                )
            }
        })
    }
}

fn metric(op: MetricOp, field: String) -> AggKind {
    AggKind::Metric { op, field }
}

fn wire_name(field: &FieldExpr) -> AggResult<String> {
    Ok(FieldResolver::resolve(field)?.wire())
}

fn insert_unique(level: &mut Vec<AggNode>, node: AggNode) -> AggResult<()> {
    if level.iter().any(|n| n.name == node.name) {
        return Err(AggError::DuplicateAggregation(node.name));
    }
    level.push(node);
    Ok(())
}
