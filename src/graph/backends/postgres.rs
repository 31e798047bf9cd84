//! PostgreSQL + Apache AGE backend.
//!
//! ```ignore
//! use ontodeps::graph::backends::postgres::PostgresClient;
//! use ontodeps::graph::{Graph, QueryExt};
//!
//! let client = PostgresClient::connect("postgresql://localhost/odras", "ontodeps_default", 16).await?;
//! client.ensure_extension().await?;
//! client.ensure_graph_exists().await?;
//! let graph = Graph::new(client);
//!
//! let rows = graph
//!     .query("MATCH (m:Microtheory) RETURN m.id AS id")
//!     .fetch_all()
//!     .await?;
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use futures::{StreamExt, TryStreamExt};
use serde_json::Value as JsonValue;
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, ToSql, Type};
use tokio_postgres::NoTls;

use crate::error::AppError;
use crate::graph::cypher::{extract_return_columns, ParseError};
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::{CypherExecutor, GraphClient, SqlExecutor, Transaction};

/// Parameter map bound as `agtype`: a version byte followed by JSON text.
///
/// `cypher()` only accepts agtype for its third argument, and the OID differs
/// between installations, so the type is matched by name.
#[derive(Debug, Clone)]
struct Agtype(String);

impl ToSql for Agtype {
    fn to_sql(
        &self,
        _ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        out.extend_from_slice(&[1]);
        out.extend_from_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        ty.name() == "agtype"
    }

    to_sql_checked!();
}

/// agtype result column decoded to JSON.
#[derive(Debug)]
struct AgtypeValue(JsonValue);

impl<'a> FromSql<'a> for AgtypeValue {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let Some((&version, rest)) = raw.split_first() else {
            return Ok(AgtypeValue(JsonValue::Null));
        };
        let text = std::str::from_utf8(if version == 1 { rest } else { raw })?;
        let text = text
            .trim_end_matches("::vertex")
            .trim_end_matches("::edge")
            .trim_end_matches("::path");
        Ok(AgtypeValue(serde_json::from_str(text)?))
    }

    fn accepts(ty: &Type) -> bool {
        ty.name() == "agtype"
    }
}

/// Pooled AGE client bound to one graph. Cheap to clone.
#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
    graph_name: Arc<str>,
}

impl PostgresClient {
    pub async fn connect(uri: &str, graph_name: &str, max_size: usize) -> Result<Self, AppError> {
        let pg_config: tokio_postgres::Config = uri
            .parse()
            .map_err(|e| AppError::Connection(format!("invalid PostgreSQL URI: {}", e)))?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(max_size.max(1))
            .build()
            .map_err(|e| AppError::Connection(format!("failed to build pool: {}", e)))?;

        Ok(Self {
            pool,
            graph_name: Arc::from(graph_name),
        })
    }

    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    async fn connection(&self) -> Result<Object, AppError> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;
        conn.batch_execute("LOAD 'age'; SET search_path = ag_catalog, public;")
            .await
            .map_err(|e| AppError::Connection(format!("AGE session setup failed: {}", e)))?;
        Ok(conn)
    }

    /// `CREATE EXTENSION IF NOT EXISTS age`; needs a role allowed to create it.
    pub async fn ensure_extension(&self) -> Result<(), AppError> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;
        conn.batch_execute("CREATE EXTENSION IF NOT EXISTS age;")
            .await
            .map_err(|e| AppError::Connection(describe_pg_error("enable AGE", &e)))
    }

    /// Creates the graph unless it exists. AGE has no `IF NOT EXISTS` form.
    pub async fn ensure_graph_exists(&self) -> Result<(), AppError> {
        let sql = format!(
            "DO $$ BEGIN \
                IF NOT EXISTS (SELECT 1 FROM ag_catalog.ag_graph WHERE name = '{name}') THEN \
                    PERFORM ag_catalog.create_graph('{name}'); \
                END IF; \
             END $$;",
            name = self.graph_name
        );
        self.execute_sql(&sql).await
    }
}

#[async_trait]
impl CypherExecutor for PostgresClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let conn = self.connection().await?;
        stream_owned(conn, &self.graph_name, cypher.to_string(), params)
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        drain(self.execute_cypher(cypher, params).await?).await
    }
}

#[async_trait]
impl SqlExecutor for PostgresClient {
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
        let conn = self.connection().await?;
        batch(&conn, sql).await
    }

    async fn query_sql(&self, sql: &str) -> Result<RowStream<'_>, AppError> {
        let conn = self.connection().await?;
        let sql = sql.to_string();
        Ok(Box::pin(async_stream::try_stream! {
            let rows = conn
                .query_raw::<_, &str, _>(sql.as_str(), std::iter::empty())
                .await
                .map_err(|e| sql_error(&sql, &e))?;
            futures::pin_mut!(rows);
            while let Some(row) = rows.try_next().await.map_err(fetch_error)? {
                yield parse_pg_row(&row);
            }
        }))
    }
}

#[async_trait]
impl GraphClient for PostgresClient {
    type Tx<'a> = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        let conn = self.connection().await?;
        conn.batch_execute("BEGIN")
            .await
            .map_err(|e| AppError::Connection(describe_pg_error("begin transaction", &e)))?;
        Ok(PostgresTransaction {
            conn,
            graph_name: self.graph_name.clone(),
            finished: false,
        })
    }
}

/// An open transaction on one pooled connection.
pub struct PostgresTransaction {
    conn: Object,
    graph_name: Arc<str>,
    finished: bool,
}

impl PostgresTransaction {
    async fn finish(mut self, statement: &str) -> Result<(), AppError> {
        self.finished = true;
        self.conn
            .batch_execute(statement)
            .await
            .map_err(|e| AppError::Connection(describe_pg_error(statement, &e)))
    }
}

#[async_trait]
impl CypherExecutor for PostgresTransaction {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let (sql, param) = build_age_query(&self.graph_name, cypher, &params)?;
        let rows = match &param {
            None => {
                self.conn
                    .query_raw::<_, &Agtype, _>(sql.as_str(), std::iter::empty())
                    .await
            }
            Some(param) => self.conn.query_raw(sql.as_str(), std::iter::once(param)).await,
        }
        .map_err(|e| cypher_error(cypher, &e))?;

        Ok(Box::pin(
            rows.map_ok(|row| parse_pg_row(&row)).map_err(fetch_error),
        ))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        drain(self.execute_cypher(cypher, params).await?).await
    }
}

#[async_trait]
impl SqlExecutor for PostgresTransaction {
    async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
        batch(&self.conn, sql).await
    }

    async fn query_sql(&self, sql: &str) -> Result<RowStream<'_>, AppError> {
        let rows = self
            .conn
            .query_raw::<_, &str, _>(sql, std::iter::empty())
            .await
            .map_err(|e| sql_error(sql, &e))?;
        Ok(Box::pin(
            rows.map_ok(|row| parse_pg_row(&row)).map_err(fetch_error),
        ))
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> Result<(), AppError> {
        self.finish("COMMIT").await
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PostgresTransaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(graph = %self.graph_name, "transaction dropped without commit or rollback");
        }
    }
}

async fn batch(conn: &Object, sql: &str) -> Result<(), AppError> {
    conn.batch_execute(sql).await.map_err(|e| sql_error(sql, &e))
}

async fn drain(mut rows: RowStream<'_>) -> Result<(), AppError> {
    while let Some(row) = rows.next().await {
        row?;
    }
    Ok(())
}

/// Auto-commit query; the generator owns the connection until the stream ends.
fn stream_owned(
    conn: Object,
    graph_name: &str,
    cypher: String,
    params: Params,
) -> Result<RowStream<'static>, AppError> {
    let (sql, param) = build_age_query(graph_name, &cypher, &params)?;

    Ok(Box::pin(async_stream::try_stream! {
        let rows = match &param {
            None => conn.query_raw::<_, &Agtype, _>(sql.as_str(), std::iter::empty()).await,
            Some(param) => conn.query_raw(sql.as_str(), std::iter::once(param)).await,
        }
        .map_err(|e| cypher_error(&cypher, &e))?;

        futures::pin_mut!(rows);
        while let Some(row) = rows.try_next().await.map_err(fetch_error)? {
            yield parse_pg_row(&row);
        }
    }))
}

fn describe_pg_error(action: &str, err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => {
            let mut text = format!(
                "{} failed: {}: {} ({})",
                action,
                db.severity(),
                db.message(),
                db.code().code()
            );
            if let Some(detail) = db.detail() {
                text.push_str(&format!("; detail: {}", detail));
            }
            if let Some(hint) = db.hint() {
                text.push_str(&format!("; hint: {}", hint));
            }
            text
        }
        None => format!("{} failed: {}", action, err),
    }
}

fn cypher_error(cypher: &str, err: &tokio_postgres::Error) -> AppError {
    AppError::Query {
        message: describe_pg_error("cypher", err),
        query: cypher.to_string(),
    }
}

fn sql_error(sql: &str, err: &tokio_postgres::Error) -> AppError {
    AppError::Query {
        message: describe_pg_error("sql", err),
        query: sql.to_string(),
    }
}

fn fetch_error(err: tokio_postgres::Error) -> AppError {
    AppError::Query {
        message: describe_pg_error("fetch row", &err),
        query: String::new(),
    }
}

/// Wrap a Cypher statement in AGE's `cypher()` call.
///
/// The SQL column list mirrors the statement's RETURN clause; write-only
/// statements get a single placeholder column. Parameters are bound as `$1`.
fn build_age_query(
    graph_name: &str,
    cypher: &str,
    params: &Params,
) -> Result<(String, Option<Agtype>), AppError> {
    if cypher.contains("$$") {
        return Err(AppError::Query {
            message: "statement may not contain '$$'".into(),
            query: cypher.to_string(),
        });
    }

    let columns = match extract_return_columns(cypher) {
        Ok(columns) => columns
            .iter()
            .map(|name| format!("\"{}\" agtype", name.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(", "),
        Err(ParseError::NoReturnClause) => "result agtype".to_string(),
        Err(e) => {
            return Err(AppError::Query {
                message: e.to_string(),
                query: cypher.to_string(),
            })
        }
    };

    if params.is_empty() {
        return Ok((
            format!(
                "SELECT * FROM cypher('{}', $$ {} $$) as ({})",
                graph_name, cypher, columns
            ),
            None,
        ));
    }

    let json = serde_json::to_string(params)
        .map_err(|e| AppError::Internal(format!("failed to serialize parameters: {}", e)))?;
    Ok((
        format!(
            "SELECT * FROM cypher('{}', $$ {} $$, $1) as ({})",
            graph_name, cypher, columns
        ),
        Some(Agtype(json)),
    ))
}

/// Convert a result row to JSON columns. agtype columns decode as JSON; plain
/// SQL columns (from the schema version table) map by type name.
fn parse_pg_row(pg_row: &tokio_postgres::Row) -> Row {
    fn cell<'a, T: FromSql<'a>>(
        row: &'a tokio_postgres::Row,
        idx: usize,
        into: impl FnOnce(T) -> JsonValue,
    ) -> JsonValue {
        row.try_get::<_, Option<T>>(idx)
            .ok()
            .flatten()
            .map(into)
            .unwrap_or(JsonValue::Null)
    }

    let mut data = HashMap::new();
    for (idx, column) in pg_row.columns().iter().enumerate() {
        let value = match column.type_().name() {
            "agtype" => cell(pg_row, idx, |v: AgtypeValue| v.0),
            "int2" => cell(pg_row, idx, |v: i16| JsonValue::from(v)),
            "int4" => cell(pg_row, idx, |v: i32| JsonValue::from(v)),
            "int8" => cell(pg_row, idx, |v: i64| JsonValue::from(v)),
            "float4" => cell(pg_row, idx, |v: f32| JsonValue::from(v as f64)),
            "float8" => cell(pg_row, idx, |v: f64| JsonValue::from(v)),
            "bool" => cell(pg_row, idx, JsonValue::Bool),
            "json" | "jsonb" => cell(pg_row, idx, |v: JsonValue| v),
            "_text" => cell(pg_row, idx, |v: Vec<String>| JsonValue::from(v)),
            "timestamptz" => cell(pg_row, idx, |v: chrono::DateTime<chrono::Utc>| {
                JsonValue::String(v.to_rfc3339())
            }),
            _ => cell(pg_row, idx, JsonValue::String),
        };
        data.insert(column.name().to_string(), value);
    }
    Row::new(data)
}
