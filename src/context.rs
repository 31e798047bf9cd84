//! Application context: the dependency injection root.

use std::sync::Arc;

use crate::config::{Backend, Config};
use crate::di::Context as ContextDerive;
use crate::error::AppError;
use crate::graph::backends::postgres::PostgresClient;
use crate::graph::Graph;
use crate::migrations::{run_migrations, MigrationResult};
use crate::repositories::{
    ChangeLogRepository, DependencyRepository, MicrotheoryRepository, OntologyRepository,
};
use crate::store::{ChangeLogStore, DependencyStore, MemoryStore, MicrotheoryStore, OntologyStore};

pub type AppConfig = Arc<Config>;
pub type AppGraph = Arc<Graph<PostgresClient>>;
pub type AppOntologyStore = Arc<dyn OntologyStore>;
pub type AppDependencyStore = Arc<dyn DependencyStore>;
pub type AppMicrotheoryStore = Arc<dyn MicrotheoryStore>;
pub type AppChangeLogStore = Arc<dyn ChangeLogStore>;

/// Root context. `#[derive(Context)]` makes every field resolvable by
/// services through `FromRef`.
#[derive(ContextDerive, Clone)]
pub struct Context {
    pub config: AppConfig,
    /// Present only on the PostgreSQL backend.
    pub graph: Option<AppGraph>,
    pub ontology: AppOntologyStore,
    pub dependencies: AppDependencyStore,
    pub microtheories: AppMicrotheoryStore,
    pub change_log: AppChangeLogStore,
}

impl Context {
    /// Build the context for the configured backend.
    ///
    /// PostgreSQL is connected, the AGE extension and graph are ensured and
    /// pending migrations are applied.
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        match config.storage.backend {
            Backend::Memory => Ok(Self::in_memory(config)),
            Backend::Postgres => Self::postgres(config).await.map(|(ctx, _)| ctx),
        }
    }

    /// Connect to PostgreSQL, prepare the graph and run migrations.
    pub async fn postgres(config: Config) -> Result<(Self, MigrationResult), AppError> {
        let pg = config.postgres.as_ref().ok_or(AppError::NotInitialized)?;
        let graph_name = config.project.graph_name();

        let client = PostgresClient::connect(&pg.uri, &graph_name, pg.max_connections).await?;
        client.ensure_extension().await?;
        client.ensure_graph_exists().await?;
        let migrations = run_migrations(&client, &graph_name).await?;
        if !migrations.applied_migrations.is_empty() {
            tracing::info!(
                graph = %graph_name,
                version = migrations.current_version,
                applied = ?migrations.applied_migrations,
                "migrations applied"
            );
        }

        let graph: AppGraph = Arc::new(Graph::new(client));
        let ctx = Self {
            config: Arc::new(config),
            graph: Some(graph.clone()),
            ontology: Arc::new(OntologyRepository::new(graph.clone())),
            dependencies: Arc::new(DependencyRepository::new(graph.clone())),
            microtheories: Arc::new(MicrotheoryRepository::new(graph.clone())),
            change_log: Arc::new(ChangeLogRepository::new(graph)),
        };
        Ok((ctx, migrations))
    }

    /// Every store backed by one shared [`MemoryStore`].
    pub fn in_memory(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<MemoryStore>) -> Self {
        Self {
            config: Arc::new(config),
            graph: None,
            ontology: store.clone(),
            dependencies: store.clone(),
            microtheories: store.clone(),
            change_log: store,
        }
    }

    /// Resolve a service or repository from this context.
    pub fn resolve<T: crate::FromRef<Self>>(&self) -> T {
        T::from_ref(self)
    }
}
