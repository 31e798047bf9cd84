//! Graph access layer over PostgreSQL + Apache AGE.
//!
//! Repositories talk to a [`Graph`] through the fluent [`Query`] builder:
//!
//! ```ignore
//! use ontodeps::graph::{Graph, QueryExt};
//!
//! let rows = graph
//!     .query("MATCH (d:Dependency {element_iri: $iri}) RETURN d.microtheory_id AS id")
//!     .param("iri", "http://ex.org/onto#Person")
//!     .fetch_all()
//!     .await?;
//! ```
//!
//! AGE needs the SQL column list of every `cypher()` call to match the
//! statement's RETURN clause; [`extract_return_columns`] derives it so callers
//! only ever write Cypher.

mod cypher;
mod macros;
mod query;
mod row;
mod traits;

pub mod backends;

pub use cypher::{extract_return_columns, ParseError};
pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use traits::{CypherExecutor, GraphClient, SqlExecutor, Transaction};

#[doc(inline)]
pub use crate::cypher;

use std::future::Future;

use crate::error::AppError;

/// Wraps a [`GraphClient`] with auto-commit queries and transaction closures.
pub struct Graph<C: GraphClient> {
    client: C,
}

impl<C: GraphClient> Graph<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Auto-commit query; each call runs in its own implicit transaction.
    pub fn query(&self, cypher: &str) -> Query<'_, C> {
        Query::new(&self.client, cypher)
    }

    /// Run `f` inside a transaction.
    ///
    /// `f` hands the transaction back together with its result: `Ok` commits,
    /// `Err` rolls back. A pooled connection is never returned mid-transaction.
    ///
    /// ```ignore
    /// graph.transaction(|txn| async move {
    ///     let result = txn
    ///         .query("MATCH (d:Dependency {microtheory_id: $id}) DETACH DELETE d")
    ///         .param("id", &id)
    ///         .run()
    ///         .await;
    ///     (txn, result)
    /// }).await?;
    /// ```
    pub async fn transaction<'g, F, R, Fut>(&'g self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(C::Tx<'g>) -> Fut,
        Fut: Future<Output = (C::Tx<'g>, Result<R, AppError>)>,
    {
        let txn = self.client.begin().await?;
        let (txn, result) = f(txn).await;
        match result {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl<C: GraphClient> CypherExecutor for Graph<C> {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        self.client.execute_cypher(cypher, params).await
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.client.run_cypher(cypher, params).await
    }
}
