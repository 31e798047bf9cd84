//! Ontology save, change detection and impact analysis tools.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

use crate::mcp::protocol::{OutputFormat, Response};
use crate::mcp::server::McpServer;
use crate::models::ChangeEvent;
use crate::services::{ChangeDetector, OntologyService};

const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OntologyContentParams {
    /// IRI identifying the ontology graph.
    pub graph_iri: String,
    /// Full Turtle content of the ontology.
    pub content: String,
    /// Output format (json or toon).
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImpactAnalysisParams {
    /// IRI of a saved ontology graph.
    pub graph_iri: String,
    /// Element IRIs to analyze. Every element of the graph when empty.
    #[serde(default)]
    pub elements: Vec<String>,
    /// Output format (json or toon).
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListChangeEventsParams {
    /// IRI of the ontology graph.
    pub graph_iri: String,
    /// Maximum number of events (default 20).
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListChangeEventsResult {
    pub graph_iri: String,
    pub events: Vec<ChangeEvent>,
}

#[tool_router(router = ontology_tools, vis = "pub(crate)")]
impl McpServer {
    /// Change detection failures are reported in the result and never block
    /// the save.
    #[tool(
        description = "Save an ontology graph. Compares the new declarations with the stored snapshot and embeds added/deleted/modified elements plus affected microtheories in the response."
    )]
    pub async fn save_ontology(
        &self,
        Parameters(params): Parameters<OntologyContentParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(graph = %params.graph_iri, "Running save_ontology tool");

        let outcome = self
            .resolve::<OntologyService>()
            .save(&params.graph_iri, &params.content)
            .await?;
        Response(outcome, params.output_format).into()
    }

    #[tool(
        description = "Preview the change report for new ontology content without saving it."
    )]
    pub async fn preview_ontology_changes(
        &self,
        Parameters(params): Parameters<OntologyContentParams>,
    ) -> Result<CallToolResult, McpError> {
        let report = self
            .resolve::<OntologyService>()
            .preview(&params.graph_iri, &params.content)
            .await?;
        Response(report, params.output_format).into()
    }

    #[tool(
        description = "Map elements of a saved ontology graph to the microtheories that depend on them."
    )]
    pub async fn impact_analysis(
        &self,
        Parameters(params): Parameters<ImpactAnalysisParams>,
    ) -> Result<CallToolResult, McpError> {
        let report = self
            .resolve::<ChangeDetector>()
            .impact(&params.graph_iri, &params.elements)
            .await?;
        Response(report, params.output_format).into()
    }

    #[tool(description = "List recorded ontology change events, newest first.")]
    pub async fn list_change_events(
        &self,
        Parameters(params): Parameters<ListChangeEventsParams>,
    ) -> Result<CallToolResult, McpError> {
        let events = self
            .resolve::<OntologyService>()
            .history(&params.graph_iri, params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await?;
        Response::json(ListChangeEventsResult {
            graph_iri: params.graph_iri,
            events,
        })
        .into()
    }
}
