//! Saved ontology graphs and their declared elements.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use crate::context::AppGraph;
use crate::error::AppError;
use crate::graph::{QueryExt, Row};
use crate::models::{ElementKind, OntologyElement};
use crate::store::OntologyStore;

#[derive(Clone)]
pub struct OntologyRepository {
    graph: AppGraph,
}

impl OntologyRepository {
    pub fn new(graph: AppGraph) -> Self {
        Self { graph }
    }

    /// Raw Turtle content of the last save.
    pub async fn content(&self, graph_iri: &str) -> Result<Option<String>, AppError> {
        let row = self
            .graph
            .query("MATCH (g:OntologyGraph {iri: $iri}) RETURN g.content AS content")
            .param("iri", graph_iri)
            .fetch_one()
            .await?;
        match row {
            Some(row) => row.get_opt("content"),
            None => Ok(None),
        }
    }

    fn row_to_element(row: &Row) -> Result<OntologyElement, AppError> {
        Ok(OntologyElement {
            iri: row.get("iri")?,
            kind: row.get("kind")?,
            label: row.get_opt("label")?,
            comment: row.get_opt("comment")?,
        })
    }
}

#[async_trait]
impl OntologyStore for OntologyRepository {
    async fn graph_exists(&self, graph_iri: &str) -> Result<bool, AppError> {
        let row = self
            .graph
            .query("MATCH (g:OntologyGraph {iri: $iri}) RETURN count(g) AS found")
            .param("iri", graph_iri)
            .fetch_one()
            .await?;
        match row {
            Some(row) => Ok(row.get::<i64>("found")? > 0),
            None => Ok(false),
        }
    }

    async fn elements(&self, graph_iri: &str) -> Result<Vec<OntologyElement>, AppError> {
        let rows = self
            .graph
            .query(
                "MATCH (e:OntologyElement {graph_iri: $graph})
                 RETURN e.iri AS iri, e.kind AS kind, e.label AS label, e.comment AS comment
                 ORDER BY e.iri",
            )
            .param("graph", graph_iri)
            .fetch_all()
            .await?;

        rows.iter().map(Self::row_to_element).collect()
    }

    async fn resolve_elements(
        &self,
        graph_iri: &str,
        iris: &[String],
    ) -> Result<HashMap<String, ElementKind>, AppError> {
        if iris.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self
            .graph
            .query(
                "MATCH (e:OntologyElement)
                 WHERE e.graph_iri = $graph AND e.iri IN $iris
                 RETURN e.iri AS iri, e.kind AS kind",
            )
            .param("graph", graph_iri)
            .param("iris", iris)
            .fetch_all()
            .await?;

        rows.iter()
            .map(|row| -> Result<(String, ElementKind), AppError> {
                Ok((row.get("iri")?, row.get("kind")?))
            })
            .collect()
    }

    async fn replace_elements(
        &self,
        graph_iri: &str,
        elements: &[OntologyElement],
        content: &str,
    ) -> Result<(), AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        let payload: Vec<_> = elements
            .iter()
            .map(|e| {
                json!({
                    "iri": e.iri,
                    "kind": e.kind.as_str(),
                    "label": e.label,
                    "comment": e.comment,
                })
            })
            .collect();

        self.graph
            .transaction(|txn| async move {
                let result: Result<(), AppError> = async {
                    txn.query("MATCH (e:OntologyElement {graph_iri: $graph}) DETACH DELETE e")
                        .param("graph", graph_iri)
                        .run()
                        .await?;

                    let existing = txn
                        .query("MATCH (g:OntologyGraph {iri: $graph}) RETURN g.iri AS iri")
                        .param("graph", graph_iri)
                        .fetch_one()
                        .await?;
                    let upsert = if existing.is_some() {
                        "MATCH (g:OntologyGraph {iri: $graph})
                         SET g.content = $content, g.updated_at = $now"
                    } else {
                        "CREATE (:OntologyGraph {
                             iri: $graph,
                             content: $content,
                             created_at: $now,
                             updated_at: $now
                         })"
                    };
                    txn.query(upsert)
                        .param("graph", graph_iri)
                        .param("content", content)
                        .param("now", &now)
                        .run()
                        .await?;

                    if !payload.is_empty() {
                        txn.query(
                            "MATCH (g:OntologyGraph {iri: $graph})
                             UNWIND $elements AS el
                             CREATE (g)-[:DECLARES]->(:OntologyElement {
                                 graph_iri: $graph,
                                 iri: el.iri,
                                 kind: el.kind,
                                 label: el.label,
                                 comment: el.comment
                             })",
                        )
                        .param("graph", graph_iri)
                        .param("elements", &payload)
                        .run()
                        .await?;
                    }
                    Ok(())
                }
                .await;
                (txn, result)
            })
            .await?;

        tracing::debug!(graph = graph_iri, elements = elements.len(), "replaced ontology snapshot");
        Ok(())
    }
}
