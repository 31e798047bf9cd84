//! Ontology saves with embedded change reports.

use serde::Serialize;

use crate::context::{AppChangeLogStore, AppConfig, AppOntologyStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::extract::DependencyExtractor;
use crate::models::{ChangeEvent, ChangeReport, OntologyElement};
use crate::rdf::Diagnostic;
use crate::services::ChangeDetector;

/// Change detection never blocks a save; a failure is reported here instead.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeDetectionOutcome {
    Completed(ChangeReport),
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub graph_iri: String,
    /// Number of declared elements now stored.
    pub elements: usize,
    pub change_detection: ChangeDetectionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_event_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(FromContext, Clone)]
pub struct OntologyService {
    config: AppConfig,
    ontology: AppOntologyStore,
    change_log: AppChangeLogStore,
    detector: ChangeDetector,
}

impl OntologyService {
    /// Detect changes against the stored snapshot, then replace it.
    pub async fn save(&self, graph_iri: &str, content: &str) -> Result<SaveOutcome, AppError> {
        require_graph_iri(graph_iri)?;
        let extraction = DependencyExtractor::new().extract(content);

        let detection = match self.detector.compare(graph_iri, &extraction.declarations).await {
            Ok(report) => ChangeDetectionOutcome::Completed(report),
            Err(e) => {
                tracing::warn!(graph = graph_iri, error = %e, "change detection skipped");
                ChangeDetectionOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        self.ontology
            .replace_elements(graph_iri, &extraction.declarations, content)
            .await?;

        let change_event_id = match &detection {
            ChangeDetectionOutcome::Completed(report) => self.record(report).await,
            ChangeDetectionOutcome::Skipped { .. } => None,
        };

        tracing::info!(
            graph = graph_iri,
            elements = extraction.declarations.len(),
            diagnostics = extraction.diagnostics.len(),
            "ontology saved"
        );

        Ok(SaveOutcome {
            graph_iri: graph_iri.to_string(),
            elements: extraction.declarations.len(),
            change_detection: detection,
            change_event_id,
            diagnostics: extraction.diagnostics,
        })
    }

    /// Change detection without saving.
    pub async fn preview(&self, graph_iri: &str, content: &str) -> Result<ChangeReport, AppError> {
        require_graph_iri(graph_iri)?;
        self.detector.detect(graph_iri, content).await
    }

    /// Recorded change events, newest first.
    pub async fn history(&self, graph_iri: &str, limit: usize) -> Result<Vec<ChangeEvent>, AppError> {
        self.require_saved(graph_iri).await?;
        self.change_log.list(graph_iri, limit).await
    }

    pub async fn elements(&self, graph_iri: &str) -> Result<Vec<OntologyElement>, AppError> {
        self.require_saved(graph_iri).await?;
        self.ontology.elements(graph_iri).await
    }

    async fn require_saved(&self, graph_iri: &str) -> Result<(), AppError> {
        if !self.ontology.graph_exists(graph_iri).await? {
            return Err(AppError::OntologyNotFound(graph_iri.to_string()));
        }
        Ok(())
    }

    async fn record(&self, report: &ChangeReport) -> Option<String> {
        if !self.config.change_detection.record_history || report.changes.is_empty() {
            return None;
        }
        let event = ChangeEvent::from_report(report);
        match self.change_log.append(&event).await {
            Ok(()) => Some(event.id),
            Err(e) => {
                tracing::warn!(graph = %report.graph_iri, error = %e, "failed to record change event");
                None
            }
        }
    }
}

fn require_graph_iri(graph_iri: &str) -> Result<(), AppError> {
    if graph_iri.trim().is_empty() {
        return Err(AppError::Validation("graph IRI must not be empty".into()));
    }
    Ok(())
}
