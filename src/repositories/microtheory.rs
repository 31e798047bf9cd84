//! Microtheory vertices.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::context::AppGraph;
use crate::error::AppError;
use crate::graph::{QueryExt, Row};
use crate::models::Microtheory;
use crate::store::MicrotheoryStore;

const FIELDS: &str = "m.id AS id, m.slug AS slug, m.ontology_graph AS ontology_graph, \
                      m.content AS content, m.created_at AS created_at, m.updated_at AS updated_at";

#[derive(Clone)]
pub struct MicrotheoryRepository {
    graph: AppGraph,
}

impl MicrotheoryRepository {
    pub fn new(graph: AppGraph) -> Self {
        Self { graph }
    }

    fn row_to_microtheory(row: &Row) -> Result<Microtheory, AppError> {
        Ok(Microtheory {
            id: row.get("id")?,
            slug: row.get("slug")?,
            ontology_graph: row.get("ontology_graph")?,
            content: row.get_opt("content")?.unwrap_or_default(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    async fn find_one(&self, cypher: &str, key: &str, value: &str) -> Result<Option<Microtheory>, AppError> {
        let row = self
            .graph
            .query(cypher)
            .param(key, value)
            .fetch_one()
            .await?;
        row.as_ref().map(Self::row_to_microtheory).transpose()
    }
}

#[async_trait]
impl MicrotheoryStore for MicrotheoryRepository {
    async fn insert(&self, microtheory: &Microtheory) -> Result<(), AppError> {
        let slug = microtheory.slug.clone();
        self.graph
            .transaction(|txn| async move {
                let result: Result<(), AppError> = async {
                    let taken = txn
                        .query("MATCH (m:Microtheory {slug: $slug}) RETURN m.id AS id")
                        .param("slug", &slug)
                        .fetch_one()
                        .await?;
                    if taken.is_some() {
                        return Err(AppError::Validation(format!(
                            "microtheory slug '{}' already exists",
                            slug
                        )));
                    }

                    txn.query(
                        "CREATE (:Microtheory {
                             id: $id,
                             slug: $slug,
                             ontology_graph: $ontology_graph,
                             content: $content,
                             created_at: $created_at,
                             updated_at: $updated_at
                         })",
                    )
                    .param("id", &microtheory.id)
                    .param("slug", &slug)
                    .param("ontology_graph", &microtheory.ontology_graph)
                    .param("content", &microtheory.content)
                    .param("created_at", microtheory.created_at.to_rfc3339())
                    .param("updated_at", microtheory.updated_at.to_rfc3339())
                    .run()
                    .await
                }
                .await;
                (txn, result)
            })
            .await
    }

    async fn get(&self, id: &str) -> Result<Option<Microtheory>, AppError> {
        self.find_one(
            &format!("MATCH (m:Microtheory {{id: $id}}) RETURN {}", FIELDS),
            "id",
            id,
        )
        .await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Microtheory>, AppError> {
        self.find_one(
            &format!("MATCH (m:Microtheory {{slug: $slug}}) RETURN {}", FIELDS),
            "slug",
            slug,
        )
        .await
    }

    async fn list(&self, ontology_graph: Option<&str>) -> Result<Vec<Microtheory>, AppError> {
        let rows = match ontology_graph {
            Some(graph_iri) => {
                self.graph
                    .query(&format!(
                        "MATCH (m:Microtheory {{ontology_graph: $graph}}) RETURN {} ORDER BY m.slug",
                        FIELDS
                    ))
                    .param("graph", graph_iri)
                    .fetch_all()
                    .await?
            }
            None => {
                self.graph
                    .query(&format!("MATCH (m:Microtheory) RETURN {} ORDER BY m.slug", FIELDS))
                    .fetch_all()
                    .await?
            }
        };

        rows.iter().map(Self::row_to_microtheory).collect()
    }

    async fn update_content(
        &self,
        id: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Microtheory>, AppError> {
        let row = self
            .graph
            .query(&format!(
                "MATCH (m:Microtheory {{id: $id}})
                 SET m.content = $content, m.updated_at = $at
                 RETURN {}",
                FIELDS
            ))
            .param("id", id)
            .param("content", content)
            .param("at", at.to_rfc3339())
            .fetch_one()
            .await?;
        row.as_ref().map(Self::row_to_microtheory).transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let row = self
            .graph
            .query(
                "MATCH (m:Microtheory {id: $id})
                 DETACH DELETE m
                 RETURN count(*) AS deleted",
            )
            .param("id", id)
            .fetch_one()
            .await?;

        match row {
            Some(row) => Ok(row.get::<i64>("deleted")? > 0),
            None => Ok(false),
        }
    }
}
