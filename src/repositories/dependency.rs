//! Dependency rows, one `:Dependency` vertex per (microtheory, element IRI).

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::context::AppGraph;
use crate::error::AppError;
use crate::graph::{QueryExt, Row};
use crate::models::{Dependency, ElementRef, RecordOutcome, ValidationMark};
use crate::store::{diff_refs, DependencyStore};

#[derive(Clone)]
pub struct DependencyRepository {
    graph: AppGraph,
}

impl DependencyRepository {
    pub fn new(graph: AppGraph) -> Self {
        Self { graph }
    }

    fn row_to_dependency(row: &Row) -> Result<Dependency, AppError> {
        Ok(Dependency {
            microtheory_id: row.get("microtheory_id")?,
            element_iri: row.get("element_iri")?,
            element_type: row.get("element_type")?,
            is_valid: row.get("is_valid")?,
            first_detected_at: row.get("first_detected_at")?,
            last_validated_at: row.get_opt("last_validated_at")?,
        })
    }
}

fn ref_payload<'a>(refs: impl IntoIterator<Item = &'a ElementRef>) -> Vec<serde_json::Value> {
    refs.into_iter()
        .map(|r| json!({ "iri": r.iri, "kind": r.kind.as_str() }))
        .collect()
}

#[async_trait]
impl DependencyStore for DependencyRepository {
    async fn record_dependencies(
        &self,
        microtheory_id: &str,
        refs: &[ElementRef],
    ) -> Result<RecordOutcome, AppError> {
        let now = Utc::now().to_rfc3339();

        self.graph
            .transaction(|txn| async move {
                let result: Result<RecordOutcome, AppError> = async {
                    let rows = txn
                        .query(
                            "MATCH (d:Dependency {microtheory_id: $mt})
                             RETURN d.element_iri AS element_iri",
                        )
                        .param("mt", microtheory_id)
                        .fetch_all()
                        .await?;
                    let existing = rows
                        .iter()
                        .map(|row| row.get::<String>("element_iri"))
                        .collect::<Result<Vec<_>, _>>()?;

                    let (to_add, to_remove, retained) =
                        diff_refs(existing.iter().map(String::as_str), refs);

                    if !to_remove.is_empty() {
                        txn.query(
                            "MATCH (d:Dependency {microtheory_id: $mt})
                             WHERE d.element_iri IN $iris
                             DETACH DELETE d",
                        )
                        .param("mt", microtheory_id)
                        .param("iris", &to_remove)
                        .run()
                        .await?;
                    }

                    if !retained.is_empty() {
                        txn.query(
                            "UNWIND $deps AS dep
                             MATCH (d:Dependency {microtheory_id: $mt})
                             WHERE d.element_iri = dep.iri
                             SET d.element_type = dep.kind",
                        )
                        .param("mt", microtheory_id)
                        .param("deps", ref_payload(retained.iter().copied()))
                        .run()
                        .await?;
                    }

                    if !to_add.is_empty() {
                        let added: Vec<&str> = to_add.iter().map(|r| r.iri.as_str()).collect();
                        txn.query(
                            "UNWIND $deps AS dep
                             CREATE (:Dependency {
                                 microtheory_id: $mt,
                                 element_iri: dep.iri,
                                 element_type: dep.kind,
                                 is_valid: true,
                                 first_detected_at: $now
                             })",
                        )
                        .param("mt", microtheory_id)
                        .param("deps", ref_payload(to_add.iter().copied()))
                        .param("now", &now)
                        .run()
                        .await?;
                        txn.query(
                            "MATCH (m:Microtheory {id: $mt})
                             MATCH (d:Dependency {microtheory_id: $mt})
                             WHERE d.element_iri IN $iris
                             CREATE (m)-[:HAS_DEPENDENCY]->(d)",
                        )
                        .param("mt", microtheory_id)
                        .param("iris", &added)
                        .run()
                        .await?;
                    }

                    Ok(RecordOutcome {
                        added: to_add.len(),
                        removed: to_remove.len(),
                        retained: retained.len(),
                    })
                }
                .await;
                (txn, result)
            })
            .await
    }

    async fn get_dependencies(&self, microtheory_id: &str) -> Result<Vec<Dependency>, AppError> {
        let rows = self
            .graph
            .query(
                "MATCH (d:Dependency {microtheory_id: $mt})
                 RETURN d.microtheory_id AS microtheory_id,
                        d.element_iri AS element_iri,
                        d.element_type AS element_type,
                        d.is_valid AS is_valid,
                        d.first_detected_at AS first_detected_at,
                        d.last_validated_at AS last_validated_at
                 ORDER BY d.element_iri",
            )
            .param("mt", microtheory_id)
            .fetch_all()
            .await?;

        rows.iter().map(Self::row_to_dependency).collect()
    }

    async fn find_dependents(&self, element_iri: &str) -> Result<Vec<String>, AppError> {
        let rows = self
            .graph
            .query(
                "MATCH (d:Dependency {element_iri: $iri})
                 RETURN DISTINCT d.microtheory_id AS microtheory_id
                 ORDER BY microtheory_id",
            )
            .param("iri", element_iri)
            .fetch_all()
            .await?;

        rows.iter().map(|row| row.get("microtheory_id")).collect()
    }

    async fn find_dependents_many(
        &self,
        element_iris: &[String],
    ) -> Result<BTreeMap<String, Vec<String>>, AppError> {
        let mut result: BTreeMap<String, Vec<String>> = element_iris
            .iter()
            .map(|iri| (iri.clone(), Vec::new()))
            .collect();
        if element_iris.is_empty() {
            return Ok(result);
        }

        let rows = self
            .graph
            .query(
                "MATCH (d:Dependency)
                 WHERE d.element_iri IN $iris
                 RETURN d.element_iri AS element_iri, d.microtheory_id AS microtheory_id
                 ORDER BY element_iri, microtheory_id",
            )
            .param("iris", element_iris)
            .fetch_all()
            .await?;

        for row in &rows {
            let iri: String = row.get("element_iri")?;
            let microtheory_id: String = row.get("microtheory_id")?;
            let dependents = result.entry(iri).or_default();
            if !dependents.contains(&microtheory_id) {
                dependents.push(microtheory_id);
            }
        }
        Ok(result)
    }

    async fn mark_validated(
        &self,
        microtheory_id: &str,
        marks: &[ValidationMark],
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if marks.is_empty() {
            return Ok(());
        }

        self.graph
            .query(
                "UNWIND $marks AS mark
                 MATCH (d:Dependency {microtheory_id: $mt})
                 WHERE d.element_iri = mark.element_iri
                 SET d.is_valid = mark.is_valid, d.last_validated_at = $at",
            )
            .param("mt", microtheory_id)
            .param("marks", marks)
            .param("at", at.to_rfc3339())
            .run()
            .await
    }

    async fn remove_all(&self, microtheory_id: &str) -> Result<(), AppError> {
        self.graph
            .query("MATCH (d:Dependency {microtheory_id: $mt}) DETACH DELETE d")
            .param("mt", microtheory_id)
            .run()
            .await
    }
}
