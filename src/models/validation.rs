//! Validation summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ElementKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Every dependency resolved with the expected kind.
    Complete,
    /// At least one dependency is broken.
    Incomplete,
}

/// A dependency that no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenReference {
    pub iri: String,
    pub kind: ElementKind,
    pub reason: String,
}

/// Result of validating one microtheory against its ontology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub microtheory_id: String,
    pub ontology_graph: String,
    pub validation_status: ValidationStatus,
    pub total_dependencies: usize,
    pub valid_dependencies: usize,
    pub invalid_dependencies: usize,
    pub broken_references: Vec<BrokenReference>,
    pub validated_at: DateTime<Utc>,
}

impl ValidationSummary {
    pub fn new(
        microtheory_id: impl Into<String>,
        ontology_graph: impl Into<String>,
        total_dependencies: usize,
        broken_references: Vec<BrokenReference>,
        validated_at: DateTime<Utc>,
    ) -> Self {
        let invalid_dependencies = broken_references.len();
        let validation_status = if invalid_dependencies == 0 {
            ValidationStatus::Complete
        } else {
            ValidationStatus::Incomplete
        };
        Self {
            microtheory_id: microtheory_id.into(),
            ontology_graph: ontology_graph.into(),
            validation_status,
            total_dependencies,
            valid_dependencies: total_dependencies.saturating_sub(invalid_dependencies),
            invalid_dependencies,
            broken_references,
            validated_at,
        }
    }
}
