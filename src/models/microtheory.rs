//! Microtheory model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// An isolated set of test triples written against one ontology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Microtheory {
    /// Unique identifier (ULID).
    pub id: String,
    /// Human-facing unique name.
    pub slug: String,
    /// IRI of the ontology graph the triples are checked against.
    pub ontology_graph: String,
    /// Raw Turtle content.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Microtheory {
    /// Creates a microtheory with a generated ULID and current timestamps.
    pub fn new(slug: String, ontology_graph: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: generate_ulid(),
            slug,
            ontology_graph,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Generates a new ULID string.
pub fn generate_ulid() -> String {
    Ulid::new().to_string()
}
