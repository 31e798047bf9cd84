//! Property indexes on the label tables.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::migrations::{Migration, MigrationContext};

/// (label, property) pairs looked up by equality.
const LOOKUPS: &[(&str, &str)] = &[
    ("OntologyGraph", "iri"),
    ("OntologyElement", "graph_iri"),
    ("OntologyElement", "iri"),
    ("Microtheory", "id"),
    ("Microtheory", "slug"),
    ("Dependency", "microtheory_id"),
    ("Dependency", "element_iri"),
    ("ChangeEvent", "graph_iri"),
];

pub struct M002Indexes {
    graph_name: String,
}

impl M002Indexes {
    pub fn new(graph_name: &str) -> Self {
        Self {
            graph_name: graph_name.to_string(),
        }
    }

    fn property(key: &str) -> String {
        format!(
            "ag_catalog.agtype_access_operator(properties, '\"{}\"'::ag_catalog.agtype)",
            key
        )
    }

    fn lookup_index_sql(&self, label: &str, key: &str) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{graph}_{table}_{key} ON {graph}.\"{label}\" (({expr}))",
            graph = self.graph_name,
            table = label.to_lowercase(),
            key = key,
            label = label,
            expr = Self::property(key)
        )
    }

    /// One dependency row per (microtheory, element).
    fn dependency_unique_sql(&self) -> String {
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{graph}_dependency_unique \
             ON {graph}.\"Dependency\" (({mt}), ({iri}))",
            graph = self.graph_name,
            mt = Self::property("microtheory_id"),
            iri = Self::property("element_iri")
        )
    }
}

impl Migration for M002Indexes {
    fn id(&self) -> &'static str {
        "m002_indexes"
    }

    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Property indexes and dependency uniqueness"
    }

    fn graph_name(&self) -> &str {
        &self.graph_name
    }

    fn up<'a>(&'a self, ctx: &'a dyn MigrationContext) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            for (label, key) in LOOKUPS {
                ctx.execute_sql(&self.lookup_index_sql(label, key)).await?;
            }
            ctx.execute_sql(&self.dependency_unique_sql()).await?;
            tracing::info!(graph = %self.graph_name, "created property indexes");
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_statements() {
        let migration = M002Indexes::new("ontodeps_default");
        assert_eq!(
            migration.lookup_index_sql("Dependency", "element_iri"),
            "CREATE INDEX IF NOT EXISTS idx_ontodeps_default_dependency_element_iri \
             ON ontodeps_default.\"Dependency\" ((ag_catalog.agtype_access_operator(\
             properties, '\"element_iri\"'::ag_catalog.agtype)))"
        );
        let unique = migration.dependency_unique_sql();
        assert!(unique.starts_with("CREATE UNIQUE INDEX IF NOT EXISTS"));
        assert!(unique.contains("'\"microtheory_id\"'"));
        assert!(unique.contains("'\"element_iri\"'"));
    }
}
