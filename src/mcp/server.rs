//! MCP server implementation for ontodeps.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, ServerHandler},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool_handler,
};

use crate::context::Context;
use crate::di::FromRef;

/// MCP server over a shared [`Context`].
#[derive(Clone)]
pub struct McpServer {
    pub(crate) ctx: Arc<Context>,
    tool_router: ToolRouter<McpServer>,
}

impl McpServer {
    pub fn new(ctx: Context) -> Self {
        tracing::info!(backend = ?ctx.config.storage.backend, "initializing MCP server");

        Self {
            ctx: Arc::new(ctx),
            tool_router: Self::tool_router(),
        }
    }

    /// Combined router of every tool module.
    fn tool_router() -> ToolRouter<Self> {
        Self::project_tools()
            + Self::microtheory_tools()
            + Self::dependency_tools()
            + Self::ontology_tools()
    }

    /// Resolve a service from the context.
    pub fn resolve<T: FromRef<Context>>(&self) -> T {
        T::from_ref(&self.ctx)
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"ontodeps - ontology change detection and microtheory dependency tracking

Microtheories are small Turtle documents of test triples written against an
ontology graph. Every create/update re-extracts the ontology elements they
reference. Ontology saves report which microtheories a change breaks.

## Getting Started

1. **init_project** - Apply pending graph migrations (PostgreSQL backend)
2. **save_ontology** - Store an ontology graph snapshot
3. **create_microtheory** - Add test triples; dependencies are extracted

## Microtheory Tools

- **create_microtheory** / **update_microtheory** / **delete_microtheory**
- **get_microtheory** / **list_microtheories**

## Dependency Tools

- **get_dependencies** - Recorded dependencies with validity
- **validate_microtheory** - Re-check every dependency against the live graph
- **find_dependents** - Microtheories that reference an element

## Ontology Tools

- **save_ontology** - Save with an embedded change and impact report
- **preview_ontology_changes** - Change report without saving
- **impact_analysis** - Dependents of elements of a saved graph
- **list_change_events** - Recorded change history, newest first
"#
                .to_string(),
            ),
        }
    }
}
