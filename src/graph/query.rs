//! Fluent query builder.

use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// A Cypher statement plus its parameters, bound to an executor.
///
/// Parameters are referenced as `$name` and always travel separately from the
/// statement text. A parameter that fails to serialize is reported when the
/// query runs, not when it is added.
pub struct Query<'a, E: CypherExecutor + ?Sized> {
    executor: &'a E,
    cypher: String,
    params: Params,
    error: Option<AppError>,
}

impl<'a, E: CypherExecutor + ?Sized> Query<'a, E> {
    pub fn new(executor: &'a E, cypher: &str) -> Self {
        Self {
            executor,
            cypher: cypher.to_string(),
            params: Params::new(),
            error: None,
        }
    }

    pub fn param<T: Serialize>(mut self, name: &str, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.params.insert(name.to_string(), json);
            }
            Err(e) if self.error.is_none() => {
                self.error = Some(AppError::Internal(format!(
                    "failed to serialize parameter '{}': {}",
                    name, e
                )));
            }
            Err(_) => {}
        }
        self
    }

    fn into_parts(self) -> Result<(&'a E, String, Params), AppError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok((self.executor, self.cypher, self.params)),
        }
    }

    /// Stream rows on demand.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        let (executor, cypher, params) = self.into_parts()?;
        executor.execute_cypher(&cypher, params).await
    }

    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }

    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        let mut stream = self.execute().await?;
        stream.next().await.transpose()
    }

    /// Run for side effects only (CREATE, SET, DELETE).
    pub async fn run(self) -> Result<(), AppError> {
        let (executor, cypher, params) = self.into_parts()?;
        executor.run_cypher(&cypher, params).await
    }
}

/// `executor.query("...")` for every [`CypherExecutor`], including transactions.
pub trait QueryExt: CypherExecutor {
    fn query(&self, cypher: &str) -> Query<'_, Self>
    where
        Self: Sized,
    {
        Query::new(self, cypher)
    }
}

impl<E: CypherExecutor> QueryExt for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    /// Records what reaches the backend.
    #[derive(Default)]
    struct RecordingExecutor {
        seen: Mutex<Vec<(String, Params)>>,
    }

    #[async_trait::async_trait]
    impl CypherExecutor for RecordingExecutor {
        async fn execute_cypher(
            &self,
            cypher: &str,
            params: Params,
        ) -> Result<RowStream<'_>, AppError> {
            self.seen.lock().unwrap().push((cypher.to_string(), params));
            let row = Row::new(HashMap::from([(
                "microtheory_id".to_string(),
                serde_json::json!("01J0MT"),
            )]));
            Ok(Box::pin(futures::stream::iter(vec![Ok(row)])))
        }

        async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
            self.seen.lock().unwrap().push((cypher.to_string(), params));
            Ok(())
        }
    }

    /// Map with non-string keys: serde_json refuses to serialize it.
    fn unserializable() -> BTreeMap<(u8, u8), u8> {
        BTreeMap::from([((1, 2), 3)])
    }

    #[tokio::test]
    async fn test_params_reach_the_executor() {
        let executor = RecordingExecutor::default();
        let rows = executor
            .query("MATCH (d:Dependency {element_iri: $iri}) RETURN d.microtheory_id AS microtheory_id")
            .param("iri", "http://ex.org/onto#Person")
            .param("limit", 10)
            .fetch_all()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let seen = executor.seen.lock().unwrap();
        let (_, params) = &seen[0];
        assert_eq!(params["iri"], serde_json::json!("http://ex.org/onto#Person"));
        assert_eq!(params["limit"], serde_json::json!(10));
    }

    #[tokio::test]
    async fn test_fetch_one_returns_first_row() {
        let executor = RecordingExecutor::default();
        let row = executor
            .query("MATCH (d:Dependency) RETURN d.microtheory_id AS microtheory_id")
            .fetch_one()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get::<String>("microtheory_id").unwrap(), "01J0MT");
    }

    #[tokio::test]
    async fn test_serialization_error_surfaces_on_run() {
        let executor = RecordingExecutor::default();
        let result = executor
            .query("CREATE (n:Microtheory {id: $id})")
            .param("id", unserializable())
            .run()
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(executor.seen.lock().unwrap().is_empty());
    }
}
