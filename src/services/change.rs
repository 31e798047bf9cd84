//! Change detection and impact analysis for ontology saves.

use std::collections::BTreeMap;

use crate::context::{AppConfig, AppDependencyStore, AppOntologyStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::extract::DependencyExtractor;
use crate::models::{ChangeReport, ChangeSet, ElementKind, ImpactReport, OntologyElement};

/// Compares a graph's stored snapshot with new declarations and maps the
/// breaking changes to dependent microtheories. Holds no state between calls.
#[derive(FromContext, Clone)]
pub struct ChangeDetector {
    config: AppConfig,
    ontology: AppOntologyStore,
    dependencies: AppDependencyStore,
}

impl ChangeDetector {
    /// Diff the stored snapshot of `graph_iri` against `declared`.
    pub async fn compare(
        &self,
        graph_iri: &str,
        declared: &[OntologyElement],
    ) -> Result<ChangeReport, AppError> {
        let include_individuals = self.config.change_detection.include_individuals;
        let tracked =
            |e: &OntologyElement| include_individuals || e.kind != ElementKind::Individual;

        let old: Vec<OntologyElement> = self
            .ontology
            .elements(graph_iri)
            .await?
            .into_iter()
            .filter(|e| tracked(e))
            .collect();
        let new: Vec<OntologyElement> = declared.iter().filter(|e| tracked(e)).cloned().collect();

        let changes = ChangeSet::between(&old, &new);
        let breaking = changes.breaking();
        let dependents = if breaking.is_empty() {
            BTreeMap::new()
        } else {
            self.dependencies.find_dependents_many(&breaking).await?
        };
        let impact = ImpactReport::from_dependents(dependents);

        tracing::debug!(
            graph = graph_iri,
            added = changes.added.len(),
            deleted = changes.deleted.len(),
            modified = changes.modified.len(),
            affected = impact.affected_microtheories.len(),
            "compared ontology snapshots"
        );

        Ok(ChangeReport {
            graph_iri: graph_iri.to_string(),
            changes,
            impact,
            diagnostics: Vec::new(),
        })
    }

    /// Extract declarations from `content` and [`compare`](Self::compare).
    pub async fn detect(&self, graph_iri: &str, content: &str) -> Result<ChangeReport, AppError> {
        let extraction = DependencyExtractor::new().extract(content);
        let mut report = self.compare(graph_iri, &extraction.declarations).await?;
        report.diagnostics = extraction.diagnostics;
        Ok(report)
    }

    /// Dependents of the given elements of a saved graph; every current
    /// element when `iris` is empty.
    pub async fn impact(&self, graph_iri: &str, iris: &[String]) -> Result<ImpactReport, AppError> {
        if !self.ontology.graph_exists(graph_iri).await? {
            return Err(AppError::OntologyNotFound(graph_iri.to_string()));
        }

        let iris = if iris.is_empty() {
            self.ontology
                .elements(graph_iri)
                .await?
                .into_iter()
                .map(|e| e.iri)
                .collect()
        } else {
            iris.to_vec()
        };

        let dependents = self.dependencies.find_dependents_many(&iris).await?;
        Ok(ImpactReport::from_dependents(dependents))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::models::ElementRef;
    use crate::store::{DependencyStore, MemoryStore, OntologyStore};

    const GRAPH: &str = "http://ex.org/onto";

    fn set(iris: &[&str]) -> BTreeSet<String> {
        iris.iter().map(|s| s.to_string()).collect()
    }

    async fn seeded(config: Config) -> (Context, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .replace_elements(
                GRAPH,
                &[
                    OntologyElement::new("ex:Person", ElementKind::Class).with_label("Person"),
                    OntologyElement::new("ex:hasName", ElementKind::DatatypeProperty),
                    OntologyElement::new("ex:alice", ElementKind::Individual),
                ],
                "",
            )
            .await
            .unwrap();
        store
            .record_dependencies("mt1", &[ElementRef::new("ex:Person", ElementKind::Class)])
            .await
            .unwrap();
        store
            .record_dependencies(
                "mt2",
                &[
                    ElementRef::new("ex:Person", ElementKind::Class),
                    ElementRef::new("ex:hasName", ElementKind::DatatypeProperty),
                ],
            )
            .await
            .unwrap();
        (Context::with_store(config, store.clone()), store)
    }

    #[tokio::test]
    async fn test_deleted_element_reports_dependents() {
        let (ctx, _) = seeded(Config::in_memory()).await;
        let detector: ChangeDetector = ctx.resolve();

        let report = detector
            .compare(
                GRAPH,
                &[OntologyElement::new("ex:Person", ElementKind::Class).with_label("Person")],
            )
            .await
            .unwrap();
        assert_eq!(report.changes.deleted, set(&["ex:hasName"]));
        assert!(report.changes.added.is_empty());
        assert_eq!(report.impact.affected_microtheories, vec!["mt2"]);
        assert_eq!(report.impact.impact["ex:hasName"], vec!["mt2"]);
    }

    #[tokio::test]
    async fn test_label_change_affects_all_dependents() {
        let (ctx, _) = seeded(Config::in_memory()).await;
        let report = ctx
            .resolve::<ChangeDetector>()
            .detect(
                GRAPH,
                r#"
                @prefix ex: <ex:> .
                @prefix owl: <http://www.w3.org/2002/07/owl#> .
                @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
                ex:Person a owl:Class ; rdfs:label "Human" .
                ex:hasName a owl:DatatypeProperty .
                "#,
            )
            .await
            .unwrap();
        assert_eq!(report.changes.modified, set(&["ex:Person"]));
        assert_eq!(report.impact.affected_microtheories, vec!["mt1", "mt2"]);
    }

    #[tokio::test]
    async fn test_individuals_ignored_by_default() {
        let (ctx, _) = seeded(Config::in_memory()).await;
        let declared = [
            OntologyElement::new("ex:Person", ElementKind::Class).with_label("Person"),
            OntologyElement::new("ex:hasName", ElementKind::DatatypeProperty),
        ];
        let report = ctx
            .resolve::<ChangeDetector>()
            .compare(GRAPH, &declared)
            .await
            .unwrap();
        assert!(report.changes.is_empty());

        let mut config = Config::in_memory();
        config.change_detection.include_individuals = true;
        let (ctx, _) = seeded(config).await;
        let report = ctx
            .resolve::<ChangeDetector>()
            .compare(GRAPH, &declared)
            .await
            .unwrap();
        assert_eq!(report.changes.deleted, set(&["ex:alice"]));
        assert!(report.impact.is_empty());
    }

    #[tokio::test]
    async fn test_first_save_is_all_additions() {
        let ctx = Context::in_memory(Config::in_memory());
        let report = ctx
            .resolve::<ChangeDetector>()
            .compare(
                "http://ex.org/new",
                &[OntologyElement::new("ex:Thing", ElementKind::Class)],
            )
            .await
            .unwrap();
        assert_eq!(report.changes.added, set(&["ex:Thing"]));
        assert!(report.impact.impact.is_empty());
    }

    #[tokio::test]
    async fn test_impact_for_elements() {
        let (ctx, _) = seeded(Config::in_memory()).await;
        let detector: ChangeDetector = ctx.resolve();

        let one = detector
            .impact(GRAPH, &["ex:hasName".to_string()])
            .await
            .unwrap();
        assert_eq!(one.affected_microtheories, vec!["mt2"]);

        let all = detector.impact(GRAPH, &[]).await.unwrap();
        assert_eq!(all.impact.len(), 3);
        assert_eq!(all.impact["ex:Person"], vec!["mt1", "mt2"]);
        assert!(all.impact["ex:alice"].is_empty());

        assert!(matches!(
            detector.impact("http://ex.org/unknown", &[]).await,
            Err(AppError::OntologyNotFound(_))
        ));
    }
}
