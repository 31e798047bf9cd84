//! Append-only `:ChangeEvent` vertices.

use async_trait::async_trait;

use crate::context::AppGraph;
use crate::error::AppError;
use crate::graph::Row;
use crate::models::ChangeEvent;
use crate::store::ChangeLogStore;

#[derive(Clone)]
pub struct ChangeLogRepository {
    graph: AppGraph,
}

impl ChangeLogRepository {
    pub fn new(graph: AppGraph) -> Self {
        Self { graph }
    }

    fn row_to_event(row: &Row) -> Result<ChangeEvent, AppError> {
        Ok(ChangeEvent {
            id: row.get("id")?,
            graph_iri: row.get("graph_iri")?,
            recorded_at: row.get("recorded_at")?,
            added: row.get_list("added")?,
            deleted: row.get_list("deleted")?,
            modified: row.get_list("modified")?,
            affected_microtheories: row.get_list("affected_microtheories")?,
        })
    }
}

#[async_trait]
impl ChangeLogStore for ChangeLogRepository {
    async fn append(&self, event: &ChangeEvent) -> Result<(), AppError> {
        self.graph
            .query(
                "CREATE (:ChangeEvent {
                     id: $id,
                     graph_iri: $graph_iri,
                     recorded_at: $recorded_at,
                     added: $added,
                     deleted: $deleted,
                     modified: $modified,
                     affected_microtheories: $affected
                 })",
            )
            .param("id", &event.id)
            .param("graph_iri", &event.graph_iri)
            .param("recorded_at", event.recorded_at.to_rfc3339())
            .param("added", &event.added)
            .param("deleted", &event.deleted)
            .param("modified", &event.modified)
            .param("affected", &event.affected_microtheories)
            .run()
            .await
    }

    async fn list(&self, graph_iri: &str, limit: usize) -> Result<Vec<ChangeEvent>, AppError> {
        // Event ids are ULIDs, so id order is recording order.
        let rows = self
            .graph
            .query(&format!(
                "MATCH (c:ChangeEvent {{graph_iri: $graph_iri}})
                 RETURN c.id AS id, c.graph_iri AS graph_iri, c.recorded_at AS recorded_at,
                        c.added AS added, c.deleted AS deleted, c.modified AS modified,
                        c.affected_microtheories AS affected_microtheories
                 ORDER BY c.id DESC
                 LIMIT {}",
                limit
            ))
            .param("graph_iri", graph_iri)
            .fetch_all()
            .await?;

        rows.iter().map(Self::row_to_event).collect()
    }
}
