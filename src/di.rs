//! Dependency injection.
//!
//! [`Context`](crate::context::Context) derives `Context`, which makes each of
//! its fields resolvable through [`FromRef`]. Services derive `FromContext`
//! and are built field by field from the context:
//!
//! ```ignore
//! #[derive(FromContext, Clone)]
//! pub struct ValidationService {
//!     config: AppConfig,
//!     dependencies: AppDependencyStore,
//!     ontology: AppOntologyStore,
//! }
//!
//! let service: ValidationService = ctx.resolve();
//! ```
//!
//! Swapping a store on the context (the in-memory backend, a failing test
//! double) changes every service resolved from it.

/// Extract `Self` from a reference to `T`.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

pub use di_macros::{Context, FromContext};
