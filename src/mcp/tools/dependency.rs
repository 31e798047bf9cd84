//! Dependency lookup and validation tools.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

use crate::mcp::protocol::{OutputFormat, Response};
use crate::mcp::server::McpServer;
use crate::models::Dependency;
use crate::services::{DependencyService, ValidationService};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetDependenciesParams {
    /// Microtheory ID (ULID).
    pub microtheory_id: String,
    /// Output format (json or toon).
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ValidateMicrotheoryParams {
    /// Microtheory ID (ULID).
    pub microtheory_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindDependentsParams {
    /// Full IRI of the ontology element.
    pub element_iri: String,
}

#[derive(Debug, Serialize)]
pub struct GetDependenciesResult {
    pub microtheory_id: String,
    pub dependencies: Vec<Dependency>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct FindDependentsResult {
    pub element_iri: String,
    pub microtheories: Vec<String>,
}

#[tool_router(router = dependency_tools, vis = "pub(crate)")]
impl McpServer {
    #[tool(
        description = "List the ontology elements a microtheory depends on, with kind, validity and detection timestamps."
    )]
    pub async fn get_dependencies(
        &self,
        Parameters(params): Parameters<GetDependenciesParams>,
    ) -> Result<CallToolResult, McpError> {
        let dependencies = self
            .resolve::<DependencyService>()
            .get_dependencies(&params.microtheory_id)
            .await?;
        Response(
            GetDependenciesResult {
                microtheory_id: params.microtheory_id,
                count: dependencies.len(),
                dependencies,
            },
            params.output_format,
        )
        .into()
    }

    /// Fails with VALIDATION_UNAVAILABLE when the ontology store cannot
    /// answer in time; no partial counts are returned.
    #[tool(
        description = "Check every dependency of a microtheory against its ontology graph in one batched lookup. Returns complete/incomplete with counts and broken references."
    )]
    pub async fn validate_microtheory(
        &self,
        Parameters(params): Parameters<ValidateMicrotheoryParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(id = %params.microtheory_id, "Running validate_microtheory tool");

        let summary = self
            .resolve::<ValidationService>()
            .validate(&params.microtheory_id)
            .await?;
        Response::json(summary).into()
    }

    #[tool(description = "Find the microtheories that reference an ontology element IRI.")]
    pub async fn find_dependents(
        &self,
        Parameters(params): Parameters<FindDependentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let microtheories = self
            .resolve::<DependencyService>()
            .find_dependents(&params.element_iri)
            .await?;
        Response::json(FindDependentsResult {
            element_iri: params.element_iri,
            microtheories,
        })
        .into()
    }
}
