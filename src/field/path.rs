//! Canonical field paths

use std::fmt;

use crate::errors::{AggError, AggResult};

/// Ordered, non-empty sequence of field-name segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Creates a path, rejecting empty paths and blank segments
    pub fn new(segments: Vec<String>) -> AggResult<Self> {
        if segments.is_empty() {
            return Err(AggError::UnresolvableField("empty field path".into()));
        }
        if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
            return Err(AggError::UnresolvableField(format!(
                "invalid field segment '{}'",
                bad
            )));
        }
        Ok(Self { segments })
    }

    /// Parses a dotted wire name (`engine.power`)
    pub fn parse(wire: &str) -> AggResult<Self> {
        Self::new(wire.split('.').map(str::to_string).collect())
    }

    /// Returns the segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Dotted name sent to the engine
    pub fn wire(&self) -> String {
        self.segments.join(".")
    }

    /// This path under `prefix`
    pub fn prefixed(&self, prefix: &FieldPath) -> FieldPath {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        FieldPath { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire())
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('.') && !segment.chars().any(char::is_whitespace)
}

/// Lower-cases the first character only
pub(crate) fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
