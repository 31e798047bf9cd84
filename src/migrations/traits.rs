//! Migration trait and registry.

use futures::future::BoxFuture;

use crate::error::AppError;
use crate::graph::{CypherExecutor, GraphClient, SqlExecutor, Transaction as _};
use crate::migrations::runner::record_version;

/// What a migration may run against: the open transaction.
pub trait MigrationContext: CypherExecutor + SqlExecutor + Send + Sync {}
impl<T: CypherExecutor + SqlExecutor + Send + Sync> MigrationContext for T {}

/// A forward-only, idempotent schema step for one graph.
///
/// `up` returns a [`BoxFuture`] bounded by the context borrow so migrations
/// can be stored as trait objects.
pub trait Migration: Send + Sync {
    fn id(&self) -> &'static str;
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn graph_name(&self) -> &str;
    fn up<'a>(&'a self, ctx: &'a dyn MigrationContext) -> BoxFuture<'a, Result<(), AppError>>;
}

/// Ordered migrations.
pub struct Register {
    migrations: Vec<Box<dyn Migration>>,
}

impl Register {
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    pub fn register(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    pub fn latest_version(&self) -> u32 {
        self.iter().map(|m| m.version()).max().unwrap_or(0)
    }

    /// Apply every migration above `current_version`, each in its own
    /// transaction. The version bump is written in that same transaction.
    pub async fn run_pending<C: GraphClient>(
        &self,
        client: &C,
        current_version: u32,
    ) -> Result<(u32, Vec<String>), AppError> {
        let mut applied = Vec::new();
        let mut version = current_version;

        for migration in self.iter().filter(|m| m.version() > current_version) {
            tracing::info!(
                id = migration.id(),
                version = migration.version(),
                graph = migration.graph_name(),
                "applying migration: {}",
                migration.description()
            );

            let txn = client.begin().await?;
            let outcome = match migration.up(&txn).await {
                Ok(()) => record_version(&txn, migration).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => txn.commit().await?,
                Err(e) => {
                    tracing::error!(id = migration.id(), error = %e, "migration failed, rolling back");
                    txn.rollback().await?;
                    return Err(e);
                }
            }

            version = migration.version();
            applied.push(migration.id().to_string());
        }

        Ok((version, applied))
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}
