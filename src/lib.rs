//! ontodeps - ontology change detection and microtheory dependency tracking.
//!
//! Microtheories are isolated sets of test triples written against an
//! ontology graph. This crate extracts the ontology elements they depend on,
//! validates those dependencies against the live graph and reports which
//! microtheories an ontology save affects.

pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod extract;
pub mod graph;
pub mod mcp;
pub mod migrations;
pub mod models;
pub mod rdf;
pub mod repositories;
pub mod services;
pub mod store;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
