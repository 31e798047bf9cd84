//! Result rows.

use std::collections::HashMap;
use std::pin::Pin;

use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::AppError;

/// Named statement parameters.
pub type Params = HashMap<String, JsonValue>;

/// Rows fetched on demand.
pub type RowStream<'a> = Pin<Box<dyn Stream<Item = Result<Row, AppError>> + Send + 'a>>;

/// One result row; columns are JSON values with typed access via [`Row::get`].
#[derive(Debug, Clone, Default)]
pub struct Row {
    data: HashMap<String, JsonValue>,
}

impl Row {
    pub fn new(data: HashMap<String, JsonValue>) -> Self {
        Self { data }
    }

    /// Typed column value. Missing columns and type mismatches are errors.
    ///
    /// ```ignore
    /// let iri: String = row.get("element_iri")?;
    /// let detected: DateTime<Utc> = row.get("first_detected_at")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, AppError> {
        let value = self
            .data
            .get(key)
            .ok_or_else(|| AppError::Internal(format!("column not found: {}", key)))?;
        decode(key, value)
    }

    /// Like [`get`](Row::get), but missing and `null` columns are `None`.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.data.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => decode(key, value).map(Some),
        }
    }

    /// String list column; `null` and missing read as empty.
    pub fn get_list(&self, key: &str) -> Result<Vec<String>, AppError> {
        Ok(self.get_opt(key)?.unwrap_or_default())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &JsonValue) -> Result<T, AppError> {
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::Internal(format!("failed to deserialize '{}': {}", key, e)))
}

impl From<HashMap<String, JsonValue>> for Row {
    fn from(data: HashMap<String, JsonValue>) -> Self {
        Self::new(data)
    }
}
