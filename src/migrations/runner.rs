//! Migration runner with per-graph version tracking.

use futures::TryStreamExt;
use serde::Serialize;

use crate::error::AppError;
use crate::graph::{GraphClient, SqlExecutor};
use crate::migrations::traits::{Migration, MigrationContext};
use crate::migrations::{create_register, Register};

/// Outcome of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    pub graph_name: String,
    pub previous_version: u32,
    pub current_version: u32,
    pub applied_migrations: Vec<String>,
}

const CREATE_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS public.ontodeps_schema_version (
    graph_name TEXT PRIMARY KEY,
    version INTEGER NOT NULL DEFAULT 0,
    applied_migrations TEXT[] NOT NULL DEFAULT '{}',
    last_applied_at TIMESTAMPTZ DEFAULT NOW()
);
"#;

/// Bring `graph_name` up to the latest schema version. Safe to call on every
/// start.
pub async fn run_migrations<C>(client: &C, graph_name: &str) -> Result<MigrationResult, AppError>
where
    C: GraphClient + SqlExecutor,
{
    run_register(client, graph_name, &create_register(graph_name)).await
}

pub(crate) async fn run_register<C>(
    client: &C,
    graph_name: &str,
    register: &Register,
) -> Result<MigrationResult, AppError>
where
    C: GraphClient + SqlExecutor,
{
    client.execute_sql(CREATE_VERSION_TABLE).await?;
    client
        .execute_sql(&format!(
            "INSERT INTO public.ontodeps_schema_version (graph_name) VALUES ({}) \
             ON CONFLICT (graph_name) DO NOTHING",
            quote_literal(graph_name)
        ))
        .await?;

    let previous_version = current_version(client, graph_name).await?;
    let (current_version, applied_migrations) =
        register.run_pending(client, previous_version).await?;

    if applied_migrations.is_empty() {
        tracing::debug!(graph = graph_name, version = current_version, "schema up to date");
    }

    Ok(MigrationResult {
        graph_name: graph_name.to_string(),
        previous_version,
        current_version,
        applied_migrations,
    })
}

async fn current_version<C: SqlExecutor>(client: &C, graph_name: &str) -> Result<u32, AppError> {
    let rows: Vec<_> = client
        .query_sql(&format!(
            "SELECT version FROM public.ontodeps_schema_version WHERE graph_name = {}",
            quote_literal(graph_name)
        ))
        .await?
        .try_collect()
        .await?;

    Ok(rows
        .first()
        .and_then(|r| r.get::<i64>("version").ok())
        .unwrap_or(0) as u32)
}

/// Version bump for one applied migration, inside the migration's transaction.
pub(crate) async fn record_version(
    ctx: &dyn MigrationContext,
    migration: &dyn Migration,
) -> Result<(), AppError> {
    ctx.execute_sql(&format!(
        "UPDATE public.ontodeps_schema_version \
         SET version = {}, \
             applied_migrations = array_append(applied_migrations, {}), \
             last_applied_at = NOW() \
         WHERE graph_name = {}",
        migration.version(),
        quote_literal(migration.id()),
        quote_literal(migration.graph_name())
    ))
    .await
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::create_register;

    #[test]
    fn test_quote_literal_escapes_quotes() {
        assert_eq!(quote_literal("ontodeps_default"), "'ontodeps_default'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn test_register_is_ordered_and_unique() {
        let register = create_register("ontodeps_default");
        let versions: Vec<u32> = register.iter().map(|m| m.version()).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
        assert_eq!(register.latest_version(), *versions.last().unwrap());
        assert!(register.iter().all(|m| m.graph_name() == "ontodeps_default"));
    }
}
