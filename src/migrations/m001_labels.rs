//! Vertex and edge labels.
//!
//! AGE creates a label implicitly on first CREATE, but MATCH against a label
//! that was never created fails, so every label a repository reads is created
//! up front.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::migrations::{Migration, MigrationContext};

pub const VERTEX_LABELS: &[&str] = &[
    "OntologyGraph",
    "OntologyElement",
    "Microtheory",
    "Dependency",
    "ChangeEvent",
];

pub const EDGE_LABELS: &[&str] = &["DECLARES", "HAS_DEPENDENCY"];

pub struct M001Labels {
    graph_name: String,
}

impl M001Labels {
    pub fn new(graph_name: &str) -> Self {
        Self {
            graph_name: graph_name.to_string(),
        }
    }

    fn create_label_sql(&self, label: &str, function: &str) -> String {
        format!(
            "DO $$ BEGIN \
                IF NOT EXISTS ( \
                    SELECT 1 FROM ag_catalog.ag_label l \
                    JOIN ag_catalog.ag_graph g ON l.graph = g.graphid \
                    WHERE g.name = '{graph}' AND l.name = '{label}' \
                ) THEN \
                    PERFORM ag_catalog.{function}('{graph}', '{label}'); \
                END IF; \
             END $$;",
            graph = self.graph_name,
            label = label,
            function = function
        )
    }
}

impl Migration for M001Labels {
    fn id(&self) -> &'static str {
        "m001_labels"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "Vertex and edge labels"
    }

    fn graph_name(&self) -> &str {
        &self.graph_name
    }

    fn up<'a>(&'a self, ctx: &'a dyn MigrationContext) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            for label in VERTEX_LABELS {
                ctx.execute_sql(&self.create_label_sql(label, "create_vlabel"))
                    .await?;
            }
            for label in EDGE_LABELS {
                ctx.execute_sql(&self.create_label_sql(label, "create_elabel"))
                    .await?;
            }
            Ok(())
        }
        .boxed()
    }
}
