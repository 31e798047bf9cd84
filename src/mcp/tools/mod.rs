//! MCP tool implementations organized by domain.

pub mod dependency;
pub mod microtheory;
pub mod ontology;
pub mod project;
