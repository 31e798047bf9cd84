//! PostgreSQL + Apache AGE implementations of the storage traits.
//!
//! Every repository holds the shared [`AppGraph`](crate::context::AppGraph)
//! and speaks Cypher through the [`graph`](crate::graph) layer. Timestamps are
//! stored as RFC 3339 strings; element kinds as their variant names.
//!
//! Graph shape:
//!
//! ```text
//! (:OntologyGraph {iri})-[:DECLARES]->(:OntologyElement {graph_iri, iri, kind})
//! (:Microtheory {id, slug})-[:HAS_DEPENDENCY]->(:Dependency {microtheory_id, element_iri})
//! (:ChangeEvent {id, graph_iri, recorded_at})
//! ```

mod change_log;
mod dependency;
mod microtheory;
mod ontology;

pub use change_log::ChangeLogRepository;
pub use dependency::DependencyRepository;
pub use microtheory::MicrotheoryRepository;
pub use ontology::OntologyRepository;
