// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a canonical column, independent of how the source stored it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Timestamp,
    String,
    Integer,
    Float,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SemanticType::Timestamp => "timestamp",
            SemanticType::String => "string",
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
        };
        f.write_str(s)
    }
}

/// Where a canonical column gets its values from.
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum FieldSource {
    /// First alias present in the raw table wins.
    Aliases(&'static [&'static str]),
    /// Stamped with the fetch unit's variant.
    Variant,
    /// Stamped with the run-wide extraction instant.
    ExtractedAt,
}

/// A single column of the canonical output table.
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub struct CanonicalField {
    pub name: &'static str,
    pub ty: SemanticType,
    pub source: FieldSource,
    pub description: &'static str,
}

impl CanonicalField {
    /// Ordered source aliases; empty for stamped fields.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self.source {
            FieldSource::Aliases(aliases) => aliases,
            FieldSource::Variant | FieldSource::ExtractedAt => &[],
        }
    }
}
