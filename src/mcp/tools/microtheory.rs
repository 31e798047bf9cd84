//! Microtheory management tools.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

use crate::mcp::protocol::Response;
use crate::mcp::server::McpServer;
use crate::models::Microtheory;
use crate::services::MicrotheoryService;

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMicrotheoryParams {
    /// Unique name: ASCII letters, digits, '-' or '_'.
    pub slug: String,
    /// IRI of the ontology graph the triples are written against.
    pub ontology_graph: String,
    /// Turtle content of the test triples.
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMicrotheoryParams {
    /// Microtheory ID (ULID).
    pub id: String,
    /// New Turtle content; replaces the old content entirely.
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MicrotheoryIdParams {
    /// Microtheory ID (ULID).
    pub id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMicrotheoriesParams {
    /// Only microtheories written against this ontology graph.
    #[serde(default)]
    pub ontology_graph: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ListMicrotheoriesResult {
    pub microtheories: Vec<Microtheory>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteMicrotheoryResult {
    pub id: String,
    pub deleted: bool,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = microtheory_tools, vis = "pub(crate)")]
impl McpServer {
    #[tool(
        description = "Create a microtheory from Turtle content. Referenced ontology elements are extracted and recorded as dependencies."
    )]
    pub async fn create_microtheory(
        &self,
        Parameters(params): Parameters<CreateMicrotheoryParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(slug = %params.slug, "Running create_microtheory tool");

        let saved = self
            .resolve::<MicrotheoryService>()
            .create(&params.slug, &params.ontology_graph, &params.content)
            .await?;
        Response::json(saved).into()
    }

    #[tool(
        description = "Replace a microtheory's content and re-extract its dependencies. Dependencies no longer referenced are removed."
    )]
    pub async fn update_microtheory(
        &self,
        Parameters(params): Parameters<UpdateMicrotheoryParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = %params.id, "Running update_microtheory tool");

        let saved = self
            .resolve::<MicrotheoryService>()
            .update(&params.id, &params.content)
            .await?;
        Response::json(saved).into()
    }

    #[tool(description = "Delete a microtheory together with its dependency records.")]
    pub async fn delete_microtheory(
        &self,
        Parameters(params): Parameters<MicrotheoryIdParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = %params.id, "Running delete_microtheory tool");

        self.resolve::<MicrotheoryService>().delete(&params.id).await?;
        Response::json(DeleteMicrotheoryResult {
            id: params.id,
            deleted: true,
        })
        .into()
    }

    #[tool(description = "Get a microtheory with its content.")]
    pub async fn get_microtheory(
        &self,
        Parameters(params): Parameters<MicrotheoryIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let microtheory = self.resolve::<MicrotheoryService>().get(&params.id).await?;
        Response::json(microtheory).into()
    }

    #[tool(description = "List microtheories ordered by slug, optionally for one ontology graph.")]
    pub async fn list_microtheories(
        &self,
        Parameters(params): Parameters<ListMicrotheoriesParams>,
    ) -> Result<CallToolResult, McpError> {
        let microtheories = self
            .resolve::<MicrotheoryService>()
            .list(params.ontology_graph.as_deref())
            .await?;
        Response::json(ListMicrotheoriesResult {
            count: microtheories.len(),
            microtheories,
        })
        .into()
    }
}
