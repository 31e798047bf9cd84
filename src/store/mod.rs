//! Storage capabilities.
//!
//! Services depend on these traits only; the PostgreSQL + AGE repositories
//! and the in-memory [`MemoryStore`] both implement all of them.

mod memory;

pub use memory::MemoryStore;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{
    ChangeEvent, Dependency, ElementKind, ElementRef, Microtheory, OntologyElement, RecordOutcome,
    ValidationMark,
};

/// Read/replace access to saved ontology graphs.
#[async_trait]
pub trait OntologyStore: Send + Sync {
    async fn graph_exists(&self, graph_iri: &str) -> Result<bool, AppError>;

    /// Current element snapshot, sorted by IRI. Empty for unknown graphs.
    async fn elements(&self, graph_iri: &str) -> Result<Vec<OntologyElement>, AppError>;

    /// Look up many IRIs in one round trip. Missing IRIs are absent from the map.
    async fn resolve_elements(
        &self,
        graph_iri: &str,
        iris: &[String],
    ) -> Result<HashMap<String, ElementKind>, AppError>;

    /// Replace the stored snapshot and raw content of a graph.
    async fn replace_elements(
        &self,
        graph_iri: &str,
        elements: &[OntologyElement],
        content: &str,
    ) -> Result<(), AppError>;
}

/// Per-microtheory dependency rows.
#[async_trait]
pub trait DependencyStore: Send + Sync {
    /// Make the stored rows match `refs` exactly.
    ///
    /// Rows no longer referenced are deleted; surviving rows keep
    /// `first_detected_at` and validity; new rows start valid.
    async fn record_dependencies(
        &self,
        microtheory_id: &str,
        refs: &[ElementRef],
    ) -> Result<RecordOutcome, AppError>;

    /// All rows of a microtheory, sorted by IRI.
    async fn get_dependencies(&self, microtheory_id: &str) -> Result<Vec<Dependency>, AppError>;

    /// Ids of microtheories referencing the IRI, sorted.
    async fn find_dependents(&self, element_iri: &str) -> Result<Vec<String>, AppError>;

    /// Batched [`find_dependents`](Self::find_dependents). Every requested
    /// IRI is a key of the result.
    async fn find_dependents_many(
        &self,
        element_iris: &[String],
    ) -> Result<BTreeMap<String, Vec<String>>, AppError> {
        let mut result = BTreeMap::new();
        for iri in element_iris {
            result.insert(iri.clone(), self.find_dependents(iri).await?);
        }
        Ok(result)
    }

    async fn mark_validated(
        &self,
        microtheory_id: &str,
        marks: &[ValidationMark],
        at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Drop every row of a microtheory.
    async fn remove_all(&self, microtheory_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait MicrotheoryStore: Send + Sync {
    async fn insert(&self, microtheory: &Microtheory) -> Result<(), AppError>;

    async fn get(&self, id: &str) -> Result<Option<Microtheory>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Microtheory>, AppError>;

    /// All microtheories, optionally limited to one ontology graph, by slug.
    async fn list(&self, ontology_graph: Option<&str>) -> Result<Vec<Microtheory>, AppError>;

    /// Returns the updated microtheory, or `None` when the id is unknown.
    async fn update_content(
        &self,
        id: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Microtheory>, AppError>;

    /// Returns whether anything was deleted.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// Append-only log of detected ontology changes.
#[async_trait]
pub trait ChangeLogStore: Send + Sync {
    async fn append(&self, event: &ChangeEvent) -> Result<(), AppError>;

    /// Newest first.
    async fn list(&self, graph_iri: &str, limit: usize) -> Result<Vec<ChangeEvent>, AppError>;
}

/// Split `refs` against the IRIs already stored.
///
/// Returns `(to_add, to_remove, retained)`; the shared diff behind every
/// `record_dependencies` implementation.
pub(crate) fn diff_refs<'e, 'a>(
    existing: impl IntoIterator<Item = &'e str>,
    refs: &'a [ElementRef],
) -> (Vec<&'a ElementRef>, Vec<String>, Vec<&'a ElementRef>) {
    let wanted: BTreeMap<&'a str, &'a ElementRef> =
        refs.iter().map(|r| (r.iri.as_str(), r)).collect();
    let existing: Vec<&'e str> = existing.into_iter().collect();

    let to_remove = existing
        .iter()
        .filter(|iri| !wanted.contains_key(**iri))
        .map(|iri| iri.to_string())
        .collect();
    let (retained, to_add) = wanted
        .values()
        .copied()
        .partition(|r| existing.iter().any(|iri| *iri == r.iri));
    (to_add, to_remove, retained)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_refs() {
        let refs = vec![
            ElementRef::new("ex:A", ElementKind::Class),
            ElementRef::new("ex:C", ElementKind::Class),
        ];
        let (to_add, to_remove, retained) = diff_refs(["ex:A", "ex:B"], &refs);
        assert_eq!(to_add.iter().map(|r| r.iri.as_str()).collect::<Vec<_>>(), vec!["ex:C"]);
        assert_eq!(to_remove, vec!["ex:B".to_string()]);
        assert_eq!(retained.len(), 1);
    }
}
