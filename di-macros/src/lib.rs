//! Compile-time dependency injection derives for ontodeps.
//!
//! - `#[derive(Context)]` makes every field of a root context resolvable
//! - `#[derive(FromContext)]` builds a service by resolving each of its fields
//!
//! Generated code refers to `crate::FromRef`, so the consuming crate must
//! define or re-export that trait at its root.

use proc_macro::TokenStream;

mod context;
mod fields;
mod from_context;

/// Generates `impl crate::FromRef<Ctx> for FieldType` for every field.
///
/// Field types must be `Clone` and pairwise distinct, since each one becomes
/// its own impl.
///
/// ```ignore
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub config: Arc<Config>,
///     pub dependencies: Arc<dyn DependencyStore>,
/// }
///
/// // impl FromRef<Context> for Arc<Config> { ... }
/// // impl FromRef<Context> for Arc<dyn DependencyStore> { ... }
/// ```
#[proc_macro_derive(Context)]
pub fn derive_context(input: TokenStream) -> TokenStream {
    context::derive_context_impl(input)
}

/// Generates `impl crate::FromRef<Context>` that resolves each field through
/// its own `FromRef<Context>` impl. Fields may themselves be services.
///
/// The context type defaults to a type named `Context` in scope; override it
/// with `#[from_context(Context = "path::To::Ctx")]`.
///
/// ```ignore
/// #[derive(FromContext, Clone)]
/// pub struct MicrotheoryService {
///     microtheories: AppMicrotheoryStore,
///     tracker: DependencyService,
/// }
/// ```
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    from_context::derive_from_context_impl(input)
}
