//! Project initialization.

use rmcp::{model::CallToolResult, tool, tool_router, ErrorData as McpError};
use serde::Serialize;

use crate::config::Backend;
use crate::mcp::protocol::Response;
use crate::mcp::server::McpServer;
use crate::migrations::{run_migrations, MigrationResult};

/// Result of init_project.
#[derive(Debug, Serialize)]
pub struct InitProjectResult {
    pub backend: Backend,
    /// Absent on the in-memory backend, which has no schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationResult>,
}

#[tool_router(router = project_tools, vis = "pub(crate)")]
impl McpServer {
    /// Apply pending graph migrations. Safe to run repeatedly.
    #[tool(
        description = "Initialize the project: apply pending graph migrations (labels, indexes, unique dependency index). Idempotent."
    )]
    pub async fn init_project(&self) -> Result<CallToolResult, McpError> {
        tracing::info!("Running init_project tool");

        let migrations = match &self.ctx.graph {
            Some(graph) => {
                let client = graph.client();
                Some(run_migrations(client, client.graph_name()).await?)
            }
            None => None,
        };

        if let Some(result) = &migrations {
            tracing::info!(
                graph = %result.graph_name,
                previous = result.previous_version,
                current = result.current_version,
                applied = ?result.applied_migrations,
                "project initialized"
            );
        }

        Response::json(InitProjectResult {
            backend: self.ctx.config.storage.backend,
            migrations,
        })
        .into()
    }
}
