//! Init command handler.

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::{Backend, Config};
use crate::context::Context;

use super::App;

impl App {
    /// Connect to PostgreSQL, ensure the AGE graph and apply migrations.
    pub async fn run_init(&self) -> Result<()> {
        let config = Config::load()?;
        if config.storage.backend == Backend::Memory {
            tracing::info!("in-memory backend has no schema, nothing to initialize");
            return Ok(());
        }

        let graph_name = config.project.graph_name();
        tracing::info!(project = %config.project.name, graph = %graph_name, "initializing project");

        let (_, result) = Context::postgres(config)
            .await
            .map_err(|e| eyre!("Initialization failed: {}", e))?;

        if result.applied_migrations.is_empty() {
            tracing::info!(
                version = result.current_version,
                "graph already up to date, no migrations needed"
            );
        } else {
            tracing::info!(
                previous = result.previous_version,
                current = result.current_version,
                applied = ?result.applied_migrations,
                "migrations complete"
            );
        }
        super::print_json(&result)
    }
}
