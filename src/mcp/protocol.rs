//! MCP protocol response helpers.

use rmcp::model::{CallToolResult, Content, ErrorData};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Output format for tool responses.
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// JSON format (default).
    #[default]
    Json,
    /// TOON (Token-Oriented Object Notation), fewer tokens for large reports.
    Toon,
}

/// Tool response that serializes as the raw inner value.
///
/// ```ignore
/// Response::json(summary).into()
/// Response(report, params.format).into()
/// ```
pub struct Response<T>(pub T, pub Option<OutputFormat>);

impl<T> Response<T> {
    pub fn json(data: T) -> Self {
        Response(data, None)
    }
}

impl<T: Serialize> Serialize for Response<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T: Serialize> From<Response<T>> for Result<CallToolResult, ErrorData> {
    fn from(response: Response<T>) -> Self {
        let content = match response.1.unwrap_or_default() {
            OutputFormat::Json => {
                let value = serde_json::to_value(&response.0).map_err(serialization_error)?;
                Content::json(value)?
            }
            OutputFormat::Toon => {
                Content::text(serde_toon::to_string(&response.0).map_err(serialization_error)?)
            }
        };
        Ok(CallToolResult::success(vec![content]))
    }
}

fn serialization_error(err: impl std::fmt::Display) -> ErrorData {
    ErrorData::internal_error(format!("response serialization failed: {}", err), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Summary {
        total: usize,
        status: &'static str,
    }

    fn text(result: &CallToolResult) -> String {
        result.content[0]
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_json_response_is_the_raw_value() {
        let result: Result<CallToolResult, ErrorData> = Response::json(Summary {
            total: 3,
            status: "complete",
        })
        .into();
        let body: serde_json::Value = serde_json::from_str(&text(&result.unwrap())).unwrap();
        assert_eq!(body, serde_json::json!({"total": 3, "status": "complete"}));
    }

    #[test]
    fn test_toon_response_is_text() {
        let result: Result<CallToolResult, ErrorData> = Response(
            Summary {
                total: 3,
                status: "complete",
            },
            Some(OutputFormat::Toon),
        )
        .into();
        let body = text(&result.unwrap());
        assert!(body.contains("total"));
        assert!(serde_json::from_str::<serde_json::Value>(&body).is_err());
    }
}
