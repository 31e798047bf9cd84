//! Schema migrations for the AGE graph.
//!
//! Migrations are idempotent (`IF NOT EXISTS` everywhere), forward-only and
//! tracked per graph in the `ontodeps_schema_version` table. They run on
//! every `init` and server start against PostgreSQL; the in-memory backend
//! has no schema.

mod m001_labels;
mod m002_indexes;
mod runner;
mod traits;

pub use m001_labels::{M001Labels, EDGE_LABELS, VERTEX_LABELS};
pub use m002_indexes::M002Indexes;
pub use runner::{run_migrations, MigrationResult};
pub use traits::{Migration, MigrationContext, Register};

/// All migrations for `graph_name`, in version order.
pub fn create_register(graph_name: &str) -> Register {
    Register::new()
        .register(M001Labels::new(graph_name))
        .register(M002Indexes::new(graph_name))
}
