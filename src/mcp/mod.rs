//! Model Context Protocol (MCP) server for ontodeps.
//!
//! Exposes microtheory dependency tracking, validation and ontology change
//! detection as MCP tools over stdio. Services are resolved from the shared
//! [`Context`](crate::context::Context) at tool execution time.

mod protocol;
pub(crate) mod server;
mod tools;

pub use protocol::OutputFormat;
pub use server::McpServer;
