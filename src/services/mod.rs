//! Business logic over the storage traits.
//!
//! Services are resolved from the [`Context`](crate::context::Context) with
//! `#[derive(FromContext)]` and never touch a backend directly, so the same
//! code runs on PostgreSQL and in memory.

mod change;
mod dependency;
mod microtheory;
mod ontology;
mod validation;

pub use change::ChangeDetector;
pub use dependency::{DependencyService, RefreshOutcome};
pub use microtheory::{MicrotheoryService, SavedMicrotheory};
pub use ontology::{ChangeDetectionOutcome, OntologyService, SaveOutcome};
pub use validation::ValidationService;
