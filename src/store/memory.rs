//! In-memory backend for `storage.backend = "memory"` and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{diff_refs, ChangeLogStore, DependencyStore, MicrotheoryStore, OntologyStore};
use crate::error::AppError;
use crate::models::{
    ChangeEvent, Dependency, ElementKind, ElementRef, Microtheory, OntologyElement, RecordOutcome,
    ValidationMark,
};

type DependencyRows = Arc<RwLock<BTreeMap<String, Dependency>>>;

#[derive(Debug, Default)]
struct SavedGraph {
    elements: BTreeMap<String, OntologyElement>,
    content: String,
}

/// Process-local store implementing every storage trait.
///
/// Dependency rows are sharded per microtheory: the outer map lock is only
/// held long enough to find a microtheory's entry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graphs: RwLock<HashMap<String, SavedGraph>>,
    microtheories: RwLock<BTreeMap<String, Microtheory>>,
    dependencies: RwLock<HashMap<String, DependencyRows>>,
    change_log: RwLock<Vec<ChangeEvent>>,
}

fn poisoned<T>(_: PoisonError<T>) -> AppError {
    AppError::Internal("memory store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw content last saved for a graph.
    pub fn content(&self, graph_iri: &str) -> Result<Option<String>, AppError> {
        let graphs = self.graphs.read().map_err(poisoned)?;
        Ok(graphs.get(graph_iri).map(|g| g.content.clone()))
    }

    fn rows(&self, microtheory_id: &str) -> Result<DependencyRows, AppError> {
        if let Some(rows) = self.dependencies.read().map_err(poisoned)?.get(microtheory_id) {
            return Ok(rows.clone());
        }
        let mut shards = self.dependencies.write().map_err(poisoned)?;
        Ok(shards.entry(microtheory_id.to_string()).or_default().clone())
    }

    fn existing_rows(&self, microtheory_id: &str) -> Result<Option<DependencyRows>, AppError> {
        Ok(self
            .dependencies
            .read()
            .map_err(poisoned)?
            .get(microtheory_id)
            .cloned())
    }
}

#[async_trait]
impl OntologyStore for MemoryStore {
    async fn graph_exists(&self, graph_iri: &str) -> Result<bool, AppError> {
        Ok(self.graphs.read().map_err(poisoned)?.contains_key(graph_iri))
    }

    async fn elements(&self, graph_iri: &str) -> Result<Vec<OntologyElement>, AppError> {
        let graphs = self.graphs.read().map_err(poisoned)?;
        Ok(graphs
            .get(graph_iri)
            .map(|g| g.elements.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn resolve_elements(
        &self,
        graph_iri: &str,
        iris: &[String],
    ) -> Result<HashMap<String, ElementKind>, AppError> {
        let graphs = self.graphs.read().map_err(poisoned)?;
        let Some(graph) = graphs.get(graph_iri) else {
            return Ok(HashMap::new());
        };
        Ok(iris
            .iter()
            .filter_map(|iri| graph.elements.get(iri).map(|e| (iri.clone(), e.kind)))
            .collect())
    }

    async fn replace_elements(
        &self,
        graph_iri: &str,
        elements: &[OntologyElement],
        content: &str,
    ) -> Result<(), AppError> {
        let saved = SavedGraph {
            elements: elements
                .iter()
                .map(|e| (e.iri.clone(), e.clone()))
                .collect(),
            content: content.to_string(),
        };
        self.graphs
            .write()
            .map_err(poisoned)?
            .insert(graph_iri.to_string(), saved);
        Ok(())
    }
}

#[async_trait]
impl DependencyStore for MemoryStore {
    async fn record_dependencies(
        &self,
        microtheory_id: &str,
        refs: &[ElementRef],
    ) -> Result<RecordOutcome, AppError> {
        let shard = self.rows(microtheory_id)?;
        let mut rows = shard.write().map_err(poisoned)?;

        let (to_add, to_remove, retained) = diff_refs(rows.keys().map(String::as_str), refs);
        let outcome = RecordOutcome {
            added: to_add.len(),
            removed: to_remove.len(),
            retained: retained.len(),
        };

        let now = Utc::now();
        let to_add: Vec<Dependency> = to_add
            .into_iter()
            .map(|r| Dependency::detected(microtheory_id, &r.iri, r.kind, now))
            .collect();
        let retained: Vec<(String, ElementKind)> =
            retained.into_iter().map(|r| (r.iri.clone(), r.kind)).collect();

        for iri in &to_remove {
            rows.remove(iri);
        }
        for (iri, kind) in retained {
            if let Some(row) = rows.get_mut(&iri) {
                row.element_type = kind;
            }
        }
        for dependency in to_add {
            rows.insert(dependency.element_iri.clone(), dependency);
        }
        Ok(outcome)
    }

    async fn get_dependencies(&self, microtheory_id: &str) -> Result<Vec<Dependency>, AppError> {
        let Some(shard) = self.existing_rows(microtheory_id)? else {
            return Ok(Vec::new());
        };
        let rows = shard.read().map_err(poisoned)?;
        Ok(rows.values().cloned().collect())
    }

    async fn find_dependents(&self, element_iri: &str) -> Result<Vec<String>, AppError> {
        let shards: Vec<(String, DependencyRows)> = self
            .dependencies
            .read()
            .map_err(poisoned)?
            .iter()
            .map(|(id, rows)| (id.clone(), rows.clone()))
            .collect();

        let mut dependents = Vec::new();
        for (id, rows) in shards {
            if rows.read().map_err(poisoned)?.contains_key(element_iri) {
                dependents.push(id);
            }
        }
        dependents.sort();
        Ok(dependents)
    }

    async fn mark_validated(
        &self,
        microtheory_id: &str,
        marks: &[ValidationMark],
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let Some(shard) = self.existing_rows(microtheory_id)? else {
            return Ok(());
        };
        let mut rows = shard.write().map_err(poisoned)?;
        for mark in marks {
            if let Some(row) = rows.get_mut(&mark.element_iri) {
                row.is_valid = mark.is_valid;
                row.last_validated_at = Some(at);
            }
        }
        Ok(())
    }

    async fn remove_all(&self, microtheory_id: &str) -> Result<(), AppError> {
        self.dependencies
            .write()
            .map_err(poisoned)?
            .remove(microtheory_id);
        Ok(())
    }
}

#[async_trait]
impl MicrotheoryStore for MemoryStore {
    async fn insert(&self, microtheory: &Microtheory) -> Result<(), AppError> {
        let mut all = self.microtheories.write().map_err(poisoned)?;
        if all.values().any(|m| m.slug == microtheory.slug) {
            return Err(AppError::Validation(format!(
                "microtheory slug '{}' already exists",
                microtheory.slug
            )));
        }
        all.insert(microtheory.id.clone(), microtheory.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Microtheory>, AppError> {
        Ok(self.microtheories.read().map_err(poisoned)?.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Microtheory>, AppError> {
        let all = self.microtheories.read().map_err(poisoned)?;
        Ok(all.values().find(|m| m.slug == slug).cloned())
    }

    async fn list(&self, ontology_graph: Option<&str>) -> Result<Vec<Microtheory>, AppError> {
        let all = self.microtheories.read().map_err(poisoned)?;
        let mut found: Vec<Microtheory> = all
            .values()
            .filter(|m| ontology_graph.map_or(true, |g| m.ontology_graph == g))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(found)
    }

    async fn update_content(
        &self,
        id: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Microtheory>, AppError> {
        let mut all = self.microtheories.write().map_err(poisoned)?;
        Ok(all.get_mut(id).map(|m| {
            m.content = content.to_string();
            m.updated_at = at;
            m.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self
            .microtheories
            .write()
            .map_err(poisoned)?
            .remove(id)
            .is_some())
    }
}

#[async_trait]
impl ChangeLogStore for MemoryStore {
    async fn append(&self, event: &ChangeEvent) -> Result<(), AppError> {
        self.change_log.write().map_err(poisoned)?.push(event.clone());
        Ok(())
    }

    async fn list(&self, graph_iri: &str, limit: usize) -> Result<Vec<ChangeEvent>, AppError> {
        let log = self.change_log.read().map_err(poisoned)?;
        Ok(log
            .iter()
            .rev()
            .filter(|e| e.graph_iri == graph_iri)
            .take(limit)
            .cloned()
            .collect())
    }
}
