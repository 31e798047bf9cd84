//! Dependency tracking for microtheories.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::context::{AppDependencyStore, AppMicrotheoryStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::extract::DependencyExtractor;
use crate::models::{Dependency, ElementRef, Microtheory, RecordOutcome};
use crate::rdf::Diagnostic;

/// Result of re-extracting a microtheory's dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub recorded: RecordOutcome,
    pub dependencies: Vec<ElementRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(FromContext, Clone)]
pub struct DependencyService {
    microtheories: AppMicrotheoryStore,
    dependencies: AppDependencyStore,
}

impl DependencyService {
    /// Extract references from the microtheory content and make the stored
    /// rows match them.
    pub async fn refresh(&self, microtheory: &Microtheory) -> Result<RefreshOutcome, AppError> {
        let extraction = DependencyExtractor::new().extract(&microtheory.content);
        let recorded = self
            .dependencies
            .record_dependencies(&microtheory.id, &extraction.references)
            .await?;

        tracing::info!(
            microtheory = %microtheory.id,
            added = recorded.added,
            removed = recorded.removed,
            retained = recorded.retained,
            diagnostics = extraction.diagnostics.len(),
            "dependencies recorded"
        );

        Ok(RefreshOutcome {
            recorded,
            dependencies: extraction.references,
            unresolved: extraction.unresolved,
            diagnostics: extraction.diagnostics,
        })
    }

    pub async fn get_dependencies(&self, microtheory_id: &str) -> Result<Vec<Dependency>, AppError> {
        if self.microtheories.get(microtheory_id).await?.is_none() {
            return Err(AppError::MicrotheoryNotFound(microtheory_id.to_string()));
        }
        self.dependencies.get_dependencies(microtheory_id).await
    }

    pub async fn find_dependents(&self, element_iri: &str) -> Result<Vec<String>, AppError> {
        self.dependencies.find_dependents(element_iri).await
    }

    pub async fn find_dependents_many(
        &self,
        element_iris: &[String],
    ) -> Result<BTreeMap<String, Vec<String>>, AppError> {
        self.dependencies.find_dependents_many(element_iris).await
    }
}
