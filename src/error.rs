//! Application error types with MCP protocol conversion.

use rmcp::model::ErrorCode;
use thiserror::Error;

/// Application-level errors for ontodeps.
#[derive(Error, Debug)]
pub enum AppError {
    // Storage errors
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query error: {message}")]
    Query { message: String, query: String },

    #[error("Internal error: {0}")]
    Internal(String),

    // Domain errors
    #[error("Microtheory not found: {0}")]
    MicrotheoryNotFound(String),

    #[error("Ontology graph not found: {0}")]
    OntologyNotFound(String),

    #[error("Validation unavailable: {0}")]
    ValidationUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Project not initialized. Run `ontodeps init` first.")]
    NotInitialized,
}

impl AppError {
    /// Stable application code used in MCP and HTTP error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::Query { .. } => "QUERY_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::MicrotheoryNotFound(_) => "MICROTHEORY_NOT_FOUND",
            AppError::OntologyNotFound(_) => "ONTOLOGY_NOT_FOUND",
            AppError::ValidationUnavailable(_) => "VALIDATION_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::NotInitialized => "NOT_INITIALIZED",
        }
    }

    /// Whether the error is caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::MicrotheoryNotFound(_)
                | AppError::OntologyNotFound(_)
                | AppError::Validation(_)
        )
    }
}

impl From<AppError> for rmcp::model::ErrorData {
    fn from(err: AppError) -> Self {
        let code = match &err {
            AppError::MicrotheoryNotFound(_) | AppError::OntologyNotFound(_) => {
                ErrorCode::RESOURCE_NOT_FOUND
            }
            AppError::Validation(_) => ErrorCode::INVALID_PARAMS,
            AppError::NotInitialized => ErrorCode::INVALID_REQUEST,
            AppError::Connection(_)
            | AppError::Query { .. }
            | AppError::Internal(_)
            | AppError::ValidationUnavailable(_)
            | AppError::Config(_) => ErrorCode::INTERNAL_ERROR,
        };

        rmcp::model::ErrorData::new(code, format!("[{}] {}", err.code(), err), None)
    }
}
