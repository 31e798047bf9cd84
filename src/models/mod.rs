//! Domain models for ontology elements, microtheories and their dependencies.

mod change;
mod dependency;
mod element;
mod microtheory;
mod validation;

pub use change::{ChangeEvent, ChangeReport, ChangeSet, ImpactReport};
pub use dependency::{Dependency, RecordOutcome, ValidationMark};
pub use element::{ElementKind, ElementRef, OntologyElement};
pub use microtheory::{generate_ulid, Microtheory};
pub use validation::{BrokenReference, ValidationStatus, ValidationSummary};
