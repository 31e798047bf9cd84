//! Checks recorded dependencies against the live ontology graph.

use std::collections::HashMap;

use chrono::Utc;

use crate::context::{AppConfig, AppDependencyStore, AppMicrotheoryStore, AppOntologyStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{BrokenReference, ValidationMark, ValidationSummary};

#[derive(FromContext, Clone)]
pub struct ValidationService {
    config: AppConfig,
    microtheories: AppMicrotheoryStore,
    dependencies: AppDependencyStore,
    ontology: AppOntologyStore,
}

impl ValidationService {
    /// Validate every dependency of a microtheory with one batched lookup.
    ///
    /// Fails with [`AppError::OntologyNotFound`] when the microtheory's graph
    /// was never saved, and with [`AppError::ValidationUnavailable`] when the
    /// ontology lookup errors or exceeds `validation.timeout_ms`. Partial
    /// counts are never returned.
    pub async fn validate(&self, microtheory_id: &str) -> Result<ValidationSummary, AppError> {
        let microtheory = self
            .microtheories
            .get(microtheory_id)
            .await?
            .ok_or_else(|| AppError::MicrotheoryNotFound(microtheory_id.to_string()))?;
        let graph_iri = microtheory.ontology_graph.as_str();
        let dependencies = self.dependencies.get_dependencies(microtheory_id).await?;
        let now = Utc::now();

        let iris: Vec<String> = dependencies.iter().map(|d| d.element_iri.clone()).collect();
        let lookup = async {
            if !self.ontology.graph_exists(graph_iri).await? {
                return Ok(None);
            }
            if iris.is_empty() {
                return Ok(Some(HashMap::new()));
            }
            self.ontology.resolve_elements(graph_iri, &iris).await.map(Some)
        };

        let timeout = self.config.validation.timeout();
        let found = match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(Some(found))) => found,
            Ok(Ok(None)) => return Err(AppError::OntologyNotFound(graph_iri.to_string())),
            Ok(Err(e)) => {
                tracing::warn!(microtheory = microtheory_id, error = %e, "ontology lookup failed");
                return Err(AppError::ValidationUnavailable(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    microtheory = microtheory_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "ontology lookup timed out"
                );
                return Err(AppError::ValidationUnavailable(format!(
                    "ontology lookup exceeded {} ms",
                    timeout.as_millis()
                )));
            }
        };

        if dependencies.is_empty() {
            return Ok(ValidationSummary::new(microtheory_id, graph_iri, 0, Vec::new(), now));
        }

        let mut broken = Vec::new();
        let mut marks = Vec::with_capacity(dependencies.len());
        for dependency in &dependencies {
            let reason = match found.get(&dependency.element_iri) {
                None => Some("not found".to_string()),
                Some(actual) if *actual != dependency.element_type => Some(format!(
                    "kind mismatch: expected {}, found {}",
                    dependency.element_type, actual
                )),
                Some(_) => None,
            };
            marks.push(ValidationMark {
                element_iri: dependency.element_iri.clone(),
                is_valid: reason.is_none(),
            });
            if let Some(reason) = reason {
                broken.push(BrokenReference {
                    iri: dependency.element_iri.clone(),
                    kind: dependency.element_type,
                    reason,
                });
            }
        }

        self.dependencies
            .mark_validated(microtheory_id, &marks, now)
            .await?;

        let summary = ValidationSummary::new(
            microtheory_id,
            &microtheory.ontology_graph,
            dependencies.len(),
            broken,
            now,
        );
        tracing::info!(
            microtheory = microtheory_id,
            total = summary.total_dependencies,
            invalid = summary.invalid_dependencies,
            "validated dependencies"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::config::Config;
    use crate::models::{ElementKind, ElementRef, Microtheory, OntologyElement, ValidationStatus};
    use crate::store::{DependencyStore, MemoryStore, MicrotheoryStore, OntologyStore};

    const GRAPH: &str = "http://ex.org/onto";

    /// Ontology store that is down or slow.
    enum Unavailable {
        Failing,
        Slow(Duration),
    }

    #[async_trait]
    impl OntologyStore for Unavailable {
        async fn graph_exists(&self, _: &str) -> Result<bool, AppError> {
            Ok(true)
        }

        async fn elements(&self, _: &str) -> Result<Vec<OntologyElement>, AppError> {
            Ok(Vec::new())
        }

        async fn resolve_elements(
            &self,
            _: &str,
            _: &[String],
        ) -> Result<HashMap<String, ElementKind>, AppError> {
            match self {
                Unavailable::Failing => Err(AppError::Connection("connection refused".into())),
                Unavailable::Slow(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(HashMap::new())
                }
            }
        }

        async fn replace_elements(
            &self,
            _: &str,
            _: &[OntologyElement],
            _: &str,
        ) -> Result<(), AppError> {
            Ok(())
        }
    }

    async fn context_with(refs: &[(&str, ElementKind)]) -> (Context, Arc<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::with_store(Config::in_memory(), store.clone());
        store.replace_elements(GRAPH, &[], "").await.unwrap();
        let mt = Microtheory::new("mt".into(), GRAPH.into(), String::new());
        store.insert(&mt).await.unwrap();
        let refs: Vec<ElementRef> = refs.iter().map(|(i, k)| ElementRef::new(*i, *k)).collect();
        store.record_dependencies(&mt.id, &refs).await.unwrap();
        (ctx, store, mt.id)
    }

    #[tokio::test]
    async fn test_reports_missing_and_mismatched() {
        let (ctx, store, id) = context_with(&[
            ("ex:Person", ElementKind::Class),
            ("ex:hasName", ElementKind::DatatypeProperty),
            ("ex:gone", ElementKind::ObjectProperty),
        ])
        .await;
        store
            .replace_elements(
                GRAPH,
                &[
                    OntologyElement::new("ex:Person", ElementKind::Class),
                    OntologyElement::new("ex:hasName", ElementKind::ObjectProperty),
                ],
                "",
            )
            .await
            .unwrap();

        let summary = ctx.resolve::<ValidationService>().validate(&id).await.unwrap();
        assert_eq!(summary.validation_status, ValidationStatus::Incomplete);
        assert_eq!(summary.total_dependencies, 3);
        assert_eq!(summary.valid_dependencies, 1);
        assert_eq!(summary.invalid_dependencies, 2);
        let reasons: Vec<(&str, &str)> = summary
            .broken_references
            .iter()
            .map(|b| (b.iri.as_str(), b.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("ex:gone", "not found"),
                (
                    "ex:hasName",
                    "kind mismatch: expected DatatypeProperty, found ObjectProperty"
                ),
            ]
        );

        let rows = store.get_dependencies(&id).await.unwrap();
        assert!(rows.iter().all(|d| d.last_validated_at.is_some()));
        let valid: Vec<bool> = rows.iter().map(|d| d.is_valid).collect();
        assert_eq!(valid, vec![true, false, false]);
    }

    #[tokio::test]
    async fn test_empty_microtheory_is_complete() {
        let (ctx, _, id) = context_with(&[]).await;
        let summary = ctx.resolve::<ValidationService>().validate(&id).await.unwrap();
        assert_eq!(summary.validation_status, ValidationStatus::Complete);
        assert_eq!(summary.total_dependencies, 0);
        assert_eq!(summary.valid_dependencies, 0);
        assert_eq!(summary.invalid_dependencies, 0);
    }

    #[tokio::test]
    async fn test_unknown_microtheory() {
        let (ctx, _, _) = context_with(&[]).await;
        assert!(matches!(
            ctx.resolve::<ValidationService>().validate("nope").await,
            Err(AppError::MicrotheoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unsaved_graph_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::with_store(Config::in_memory(), store.clone());
        let mt = Microtheory::new("mt".into(), "http://ex.org/never-saved".into(), String::new());
        store.insert(&mt).await.unwrap();
        store
            .record_dependencies(&mt.id, &[ElementRef::new("ex:Person", ElementKind::Class)])
            .await
            .unwrap();

        assert!(matches!(
            ctx.resolve::<ValidationService>().validate(&mt.id).await,
            Err(AppError::OntologyNotFound(_))
        ));
        assert!(store.get_dependencies(&mt.id).await.unwrap()[0]
            .last_validated_at
            .is_none());
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        let (mut ctx, _, id) = context_with(&[("ex:Person", ElementKind::Class)]).await;
        ctx.ontology = Arc::new(Unavailable::Failing);
        let result = ctx.resolve::<ValidationService>().validate(&id).await;
        assert!(matches!(result, Err(AppError::ValidationUnavailable(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let (mut ctx, store, id) = context_with(&[("ex:Person", ElementKind::Class)]).await;
        let mut config = Config::in_memory();
        config.validation.timeout_ms = 20;
        ctx.config = Arc::new(config);
        ctx.ontology = Arc::new(Unavailable::Slow(Duration::from_secs(5)));
        let result = ctx.resolve::<ValidationService>().validate(&id).await;
        assert!(matches!(result, Err(AppError::ValidationUnavailable(_))));

        let rows = store.get_dependencies(&id).await.unwrap();
        assert!(rows[0].last_validated_at.is_none());
    }
}
