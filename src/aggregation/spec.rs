//! Fluent aggregation specifications
//!
//! An `AggSpec` is an ordered list of metric declarations and group-bys.
//! `group_by` wraps everything declared so far one level deeper, so the
//! last-declared group-by ends up outermost.

use crate::expr::{FieldExpr, PredicateExpr};

/// Metric kinds and their name tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Sum,
    Count,
    Average,
    Min,
    Max,
    Cardinality,
    Percentiles,
    Stats,
    First,
    Distinct,
    TopHits,
}

impl MetricKind {
    /// Prefix of the canonical aggregation name
    pub fn tag(&self) -> &'static str {
        match self {
            MetricKind::Sum => "Sum",
            MetricKind::Count => "Count",
            MetricKind::Average => "Average",
            MetricKind::Min => "Min",
            MetricKind::Max => "Max",
            MetricKind::Cardinality => "Cardinality",
            MetricKind::Percentiles => "Percentile",
            MetricKind::Stats => "Stats",
            MetricKind::First => "First",
            MetricKind::Distinct => "Distinct",
            MetricKind::TopHits => "TopHits",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Name suffix
    pub fn tag(&self) -> &'static str {
        match self {
            SortDirection::Asc => "Asc",
            SortDirection::Desc => "Desc",
        }
    }
}

/// Calendar buckets for date histograms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarInterval {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl CalendarInterval {
    /// Wire value of `calendar_interval`
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarInterval::Minute => "minute",
            CalendarInterval::Hour => "hour",
            CalendarInterval::Day => "day",
            CalendarInterval::Week => "week",
            CalendarInterval::Month => "month",
            CalendarInterval::Quarter => "quarter",
            CalendarInterval::Year => "year",
        }
    }
}

/// Top-hits parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TopHitsSpec {
    pub size: u32,
    pub sort: Option<(FieldExpr, SortDirection)>,
    /// Projected fields; empty returns whole documents
    pub fields: Vec<FieldExpr>,
}

/// One metric declaration
#[derive(Debug, Clone, PartialEq)]
pub enum MetricDecl {
    /// Field metric: sum, count, average, min, max, cardinality, stats,
    /// first, distinct
    Field {
        kind: MetricKind,
        field: FieldExpr,
        predicate: Option<PredicateExpr>,
    },
    Percentiles {
        field: FieldExpr,
        percents: Vec<f64>,
        predicate: Option<PredicateExpr>,
    },
    TopHits(TopHitsSpec),
}

/// What a group-by buckets on
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    Field(FieldExpr),
    /// Literal engine field name
    Key(String),
    Histogram { field: FieldExpr, interval: f64 },
    DateHistogram { field: FieldExpr, interval: CalendarInterval },
}

/// One declaration in a spec
#[derive(Debug, Clone, PartialEq)]
pub enum SpecEntry {
    Metric(MetricDecl),
    Group { key: GroupKey, inner: AggSpec },
}

/// Fluent aggregation specification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggSpec {
    entries: Vec<SpecEntry>,
}

impl AggSpec {
    /// Creates an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the declarations in order
    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    /// Returns true if nothing is declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(mut self, decl: MetricDecl) -> Self {
        self.entries.push(SpecEntry::Metric(decl));
        self
    }

    fn field_metric(self, kind: MetricKind, field: FieldExpr, predicate: Option<PredicateExpr>) -> Self {
        self.push(MetricDecl::Field {
            kind,
            field,
            predicate,
        })
    }

    pub fn sum(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::Sum, field, None)
    }

    pub fn sum_if(self, field: FieldExpr, predicate: PredicateExpr) -> Self {
        self.field_metric(MetricKind::Sum, field, Some(predicate))
    }

    /// Number of values of `field` (`value_count`)
    pub fn count(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::Count, field, None)
    }

    pub fn count_if(self, field: FieldExpr, predicate: PredicateExpr) -> Self {
        self.field_metric(MetricKind::Count, field, Some(predicate))
    }

    pub fn average(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::Average, field, None)
    }

    pub fn average_if(self, field: FieldExpr, predicate: PredicateExpr) -> Self {
        self.field_metric(MetricKind::Average, field, Some(predicate))
    }

    pub fn min(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::Min, field, None)
    }

    pub fn min_if(self, field: FieldExpr, predicate: PredicateExpr) -> Self {
        self.field_metric(MetricKind::Min, field, Some(predicate))
    }

    pub fn max(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::Max, field, None)
    }

    pub fn max_if(self, field: FieldExpr, predicate: PredicateExpr) -> Self {
        self.field_metric(MetricKind::Max, field, Some(predicate))
    }

    pub fn cardinality(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::Cardinality, field, None)
    }

    pub fn cardinality_if(self, field: FieldExpr, predicate: PredicateExpr) -> Self {
        self.field_metric(MetricKind::Cardinality, field, Some(predicate))
    }

    pub fn stats(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::Stats, field, None)
    }

    pub fn stats_if(self, field: FieldExpr, predicate: PredicateExpr) -> Self {
        self.field_metric(MetricKind::Stats, field, Some(predicate))
    }

    /// Percentiles of `field`; an empty slice requests the configured defaults
    pub fn percentiles(self, field: FieldExpr, percents: &[f64]) -> Self {
        self.push(MetricDecl::Percentiles {
            field,
            percents: percents.to_vec(),
            predicate: None,
        })
    }

    pub fn percentiles_if(self, field: FieldExpr, percents: &[f64], predicate: PredicateExpr) -> Self {
        self.push(MetricDecl::Percentiles {
            field,
            percents: percents.to_vec(),
            predicate: Some(predicate),
        })
    }

    /// One representative value of `field`
    pub fn first(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::First, field, None)
    }

    pub fn first_if(self, field: FieldExpr, predicate: PredicateExpr) -> Self {
        self.field_metric(MetricKind::First, field, Some(predicate))
    }

    /// Distinct values of `field`, in engine bucket order
    pub fn distinct(self, field: FieldExpr) -> Self {
        self.field_metric(MetricKind::Distinct, field, None)
    }

    /// Up to `size` documents per bucket; `fields` projects the source
    pub fn top_hits(self, size: u32, fields: Vec<FieldExpr>) -> Self {
        self.push(MetricDecl::TopHits(TopHitsSpec {
            size,
            sort: None,
            fields,
        }))
    }

    /// Like `top_hits`, ordered by `sort`
    pub fn sorted_top_hits(
        self,
        size: u32,
        sort: FieldExpr,
        direction: SortDirection,
        fields: Vec<FieldExpr>,
    ) -> Self {
        self.push(MetricDecl::TopHits(TopHitsSpec {
            size,
            sort: Some((sort, direction)),
            fields,
        }))
    }

    fn wrap(self, key: GroupKey) -> Self {
        Self {
            entries: vec![SpecEntry::Group { key, inner: self }],
        }
    }

    /// Buckets everything declared so far by `field`
    pub fn group_by(self, field: FieldExpr) -> Self {
        self.wrap(GroupKey::Field(field))
    }

    /// Buckets everything declared so far by a literal engine field name
    pub fn group_by_key(self, key: impl Into<String>) -> Self {
        self.wrap(GroupKey::Key(key.into()))
    }

    /// Nested group-bys; the first listed key is outermost
    pub fn group_by_keys<S: AsRef<str>>(self, keys: &[S]) -> Self {
        keys.iter()
            .rev()
            .fold(self, |spec, key| spec.group_by_key(key.as_ref()))
    }

    /// Fixed-width numeric buckets
    pub fn histogram(self, field: FieldExpr, interval: f64) -> Self {
        self.wrap(GroupKey::Histogram { field, interval })
    }

    /// Calendar buckets
    pub fn date_histogram(self, field: FieldExpr, interval: CalendarInterval) -> Self {
        self.wrap(GroupKey::DateHistogram { field, interval })
    }
}
