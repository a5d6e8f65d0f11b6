//! Compiler and builder configuration
//!
//! Options are plain values threaded into `FilterCompiler` and
//! `AggregationBuilder`; nothing here is global. Both structs deserialize from
//! JSON with every field optional.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Filter compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Merge `x > a && x < b` into one two-sided range (default: true)
    #[serde(default = "default_merge_adjacent_ranges")]
    pub merge_adjacent_ranges: bool,

    /// Collection paths mapped as nested objects. `any(...)` over one of these
    /// compiles to a `nested` query instead of a plain prefixed `bool`.
    #[serde(default)]
    pub nested_paths: BTreeSet<String>,
}

fn default_merge_adjacent_ranges() -> bool {
    true
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            merge_adjacent_ranges: default_merge_adjacent_ranges(),
            nested_paths: BTreeSet::new(),
        }
    }
}

impl CompilerOptions {
    /// Options with range merging disabled
    pub fn without_range_merge() -> Self {
        Self {
            merge_adjacent_ranges: false,
            ..Default::default()
        }
    }

    /// Registers a nested-object relation by its wire path
    pub fn with_nested_path(mut self, path: impl Into<String>) -> Self {
        self.nested_paths.insert(path.into());
        self
    }

    /// Returns true if `path` is a registered nested relation
    pub fn is_nested(&self, path: &str) -> bool {
        self.nested_paths.contains(path)
    }
}

/// Aggregation builder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderOptions {
    /// Filter compiler options used for conditional metrics
    #[serde(default)]
    pub compiler: CompilerOptions,

    /// Bucket count requested for group-by and distinct terms (default: 10000)
    #[serde(default = "default_terms_size")]
    pub terms_size: u32,

    /// Percents requested when a percentiles metric names none
    #[serde(default = "default_percents")]
    pub default_percents: Vec<f64>,
}

fn default_terms_size() -> u32 {
    10_000
}

fn default_percents() -> Vec<f64> {
    vec![1.0, 5.0, 25.0, 50.0, 75.0, 95.0, 99.0]
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            compiler: CompilerOptions::default(),
            terms_size: default_terms_size(),
            default_percents: default_percents(),
        }
    }
}

impl BuilderOptions {
    /// Create builder options around the given compiler options
    pub fn with_compiler(compiler: CompilerOptions) -> Self {
        Self {
            compiler,
            ..Default::default()
        }
    }

    /// Sets the terms bucket count
    pub fn with_terms_size(mut self, size: u32) -> Self {
        self.terms_size = size;
        self
    }
}
