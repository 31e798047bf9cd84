//! Backend traits for the graph layer.
//!
//! - [`CypherExecutor`]: every backend
//! - [`SqlExecutor`]: backends that also speak SQL (migrations use it)
//! - [`Transaction`]: commit/rollback
//! - [`GraphClient`]: pooled connections and transaction creation

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};

/// Executes Cypher statements.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    /// Run a statement and stream its rows.
    async fn execute_cypher(&self, cypher: &str, params: Params)
        -> Result<RowStream<'_>, AppError>;

    /// Run a statement for its side effects, draining any rows.
    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError>;
}

/// Executes plain SQL; used for DDL the Cypher dialect cannot express
/// (extensions, label indexes, the schema version table).
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError>;

    async fn query_sql(&self, sql: &str) -> Result<RowStream<'_>, AppError>;
}

/// Transaction lifecycle. Both methods consume the transaction.
#[async_trait]
pub trait Transaction: Send + Sync {
    async fn commit(self) -> Result<(), AppError>;

    async fn rollback(self) -> Result<(), AppError>;
}

/// A client that runs auto-commit statements and opens transactions.
///
/// Dependency rows of one microtheory are always rewritten inside a single
/// transaction obtained from [`begin`](GraphClient::begin).
#[async_trait]
pub trait GraphClient: CypherExecutor {
    type Tx<'a>: Transaction + CypherExecutor + SqlExecutor
    where
        Self: 'a;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError>;
}
