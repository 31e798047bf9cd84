//! Microtheory lifecycle. Every content change re-extracts dependencies.

use chrono::Utc;
use serde::Serialize;

use crate::context::{AppDependencyStore, AppMicrotheoryStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::Microtheory;
use crate::services::{DependencyService, RefreshOutcome};

const MAX_SLUG_LEN: usize = 128;

#[derive(Debug, Clone, Serialize)]
pub struct SavedMicrotheory {
    pub microtheory: Microtheory,
    pub dependencies: RefreshOutcome,
}

#[derive(FromContext, Clone)]
pub struct MicrotheoryService {
    microtheories: AppMicrotheoryStore,
    dependencies: AppDependencyStore,
    tracker: DependencyService,
}

impl MicrotheoryService {
    pub async fn create(
        &self,
        slug: &str,
        ontology_graph: &str,
        content: &str,
    ) -> Result<SavedMicrotheory, AppError> {
        validate_slug(slug)?;
        if ontology_graph.trim().is_empty() {
            return Err(AppError::Validation("ontology graph IRI must not be empty".into()));
        }
        if self.microtheories.find_by_slug(slug).await?.is_some() {
            return Err(AppError::Validation(format!(
                "microtheory slug '{}' already exists",
                slug
            )));
        }

        let microtheory = Microtheory::new(slug.to_string(), ontology_graph.to_string(), content.to_string());
        self.microtheories.insert(&microtheory).await?;
        tracing::info!(id = %microtheory.id, slug, graph = ontology_graph, "microtheory created");

        let dependencies = match self.tracker.refresh(&microtheory).await {
            Ok(dependencies) => dependencies,
            Err(e) => {
                self.discard(&microtheory.id).await;
                return Err(e);
            }
        };
        Ok(SavedMicrotheory {
            microtheory,
            dependencies,
        })
    }

    /// Replace the content and re-extract dependencies.
    ///
    /// The previous content is restored when the dependencies cannot be
    /// recorded, so stored rows always describe the stored content.
    pub async fn update(&self, id: &str, content: &str) -> Result<SavedMicrotheory, AppError> {
        let previous = self
            .microtheories
            .get(id)
            .await?
            .ok_or_else(|| AppError::MicrotheoryNotFound(id.to_string()))?;
        let microtheory = self
            .microtheories
            .update_content(id, content, Utc::now())
            .await?
            .ok_or_else(|| AppError::MicrotheoryNotFound(id.to_string()))?;

        let dependencies = match self.tracker.refresh(&microtheory).await {
            Ok(dependencies) => dependencies,
            Err(e) => {
                if let Err(restore) = self
                    .microtheories
                    .update_content(id, &previous.content, previous.updated_at)
                    .await
                {
                    tracing::error!(id, error = %restore, "failed to restore microtheory content");
                }
                return Err(e);
            }
        };
        Ok(SavedMicrotheory {
            microtheory,
            dependencies,
        })
    }

    /// Delete a microtheory and its dependency rows.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.microtheories.get(id).await?.is_none() {
            return Err(AppError::MicrotheoryNotFound(id.to_string()));
        }
        self.dependencies.remove_all(id).await?;
        self.microtheories.delete(id).await?;
        tracing::info!(id, "microtheory deleted");
        Ok(())
    }

    /// Undo a create whose dependencies could not be recorded.
    async fn discard(&self, id: &str) {
        let cleanup = async {
            self.dependencies.remove_all(id).await?;
            self.microtheories.delete(id).await
        };
        if let Err(e) = cleanup.await {
            tracing::error!(id, error = %e, "failed to discard microtheory");
        }
    }

    pub async fn get(&self, id: &str) -> Result<Microtheory, AppError> {
        self.microtheories
            .get(id)
            .await?
            .ok_or_else(|| AppError::MicrotheoryNotFound(id.to_string()))
    }

    pub async fn list(&self, ontology_graph: Option<&str>) -> Result<Vec<Microtheory>, AppError> {
        self.microtheories.list(ontology_graph).await
    }
}

fn validate_slug(slug: &str) -> Result<(), AppError> {
    let valid = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "invalid slug '{}': use 1-{} ASCII letters, digits, '-' or '_'",
            slug, MAX_SLUG_LEN
        )))
    }
}
