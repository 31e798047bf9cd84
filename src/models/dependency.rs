//! Dependency rows linking microtheories to ontology elements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ElementKind;

/// One referenced element of one microtheory.
///
/// `(microtheory_id, element_iri)` is unique. Rows are only ever written by
/// re-extraction and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub microtheory_id: String,
    pub element_iri: String,
    pub element_type: ElementKind,
    pub is_valid: bool,
    pub first_detected_at: DateTime<Utc>,
    #[serde(default)]
    pub last_validated_at: Option<DateTime<Utc>>,
}

impl Dependency {
    /// A freshly detected row: valid until proven otherwise.
    pub fn detected(
        microtheory_id: impl Into<String>,
        element_iri: impl Into<String>,
        element_type: ElementKind,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            microtheory_id: microtheory_id.into(),
            element_iri: element_iri.into(),
            element_type,
            is_valid: true,
            first_detected_at: at,
            last_validated_at: None,
        }
    }
}

/// Row counts produced by `record_dependencies`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub added: usize,
    pub removed: usize,
    pub retained: usize,
}

/// Outcome of validating one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMark {
    pub element_iri: String,
    pub is_valid: bool,
}
