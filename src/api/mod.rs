//! HTTP API over the same services as the MCP tools.
//!
//! Graph IRIs travel as a single path segment and must be percent-encoded
//! (`/ontologies/http%3A%2F%2Fex.org%2Fonto/changes`).

mod error;

use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub use error::ErrorBody;

use crate::context::Context;
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::{ChangeEvent, ChangeReport, Dependency, ImpactReport, Microtheory, ValidationSummary};
use crate::services::{
    ChangeDetector, DependencyService, MicrotheoryService, OntologyService, SaveOutcome,
    SavedMicrotheory, ValidationService,
};

const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Clone)]
pub struct ApiState {
    ctx: Arc<Context>,
}

impl ApiState {
    fn resolve<T: FromRef<Context>>(&self) -> T {
        T::from_ref(&self.ctx)
    }
}

/// Build the router. A bearer token is required on every route when
/// `server.api_key` is set.
pub fn router(ctx: Context) -> Router {
    let api_key = ctx.config.server.api_key.clone();
    let state = ApiState { ctx: Arc::new(ctx) };

    Router::new()
        .route("/health", get(health))
        .route("/microtheories", post(create_microtheory).get(list_microtheories))
        .route(
            "/microtheories/{id}",
            get(get_microtheory)
                .put(update_microtheory)
                .delete(delete_microtheory),
        )
        .route("/microtheories/{id}/dependencies", get(get_dependencies))
        .route("/microtheories/{id}/validation", get(validate_microtheory))
        .route("/elements/dependents", get(find_dependents))
        .route(
            "/ontologies/{graph_iri}/impact-analysis",
            get(impact_of_element).post(impact_of_elements),
        )
        .route("/ontologies/{graph_iri}/changes", get(list_changes))
        .route("/ontology/save", post(save_ontology))
        .route("/ontology/preview", post(preview_ontology))
        .layer(middleware::from_fn_with_state(api_key, require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn require_api_key(
    State(api_key): State<Option<String>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = api_key else {
        return next.run(req).await;
    };
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some(token) if tokens_match(token.as_bytes(), expected.as_bytes()) => next.run(req).await,
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Compares every byte regardless of where the first mismatch is.
fn tokens_match(given: &[u8], expected: &[u8]) -> bool {
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    backend: crate::config::Backend,
}

async fn health(State(state): State<ApiState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        backend: state.ctx.config.storage.backend,
    })
}

// ============================================================================
// Microtheories
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateMicrotheory {
    pub slug: String,
    pub ontology_graph: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMicrotheory {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub ontology_graph: Option<String>,
}

async fn create_microtheory(
    State(state): State<ApiState>,
    Json(body): Json<CreateMicrotheory>,
) -> Result<(StatusCode, Json<SavedMicrotheory>), AppError> {
    let saved = state
        .resolve::<MicrotheoryService>()
        .create(&body.slug, &body.ontology_graph, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn list_microtheories(
    State(state): State<ApiState>,
    Query(filter): Query<ListFilter>,
) -> Result<Json<Vec<Microtheory>>, AppError> {
    let list = state
        .resolve::<MicrotheoryService>()
        .list(filter.ontology_graph.as_deref())
        .await?;
    Ok(Json(list))
}

async fn get_microtheory(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Microtheory>, AppError> {
    Ok(Json(state.resolve::<MicrotheoryService>().get(&id).await?))
}

async fn update_microtheory(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateMicrotheory>,
) -> Result<Json<SavedMicrotheory>, AppError> {
    let saved = state
        .resolve::<MicrotheoryService>()
        .update(&id, &body.content)
        .await?;
    Ok(Json(saved))
}

async fn delete_microtheory(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.resolve::<MicrotheoryService>().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Dependencies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DependencyList {
    pub microtheory_id: String,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
pub struct ElementQuery {
    pub element: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Dependents {
    pub element_iri: String,
    pub microtheories: Vec<String>,
}

async fn get_dependencies(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<DependencyList>, AppError> {
    let dependencies = state
        .resolve::<DependencyService>()
        .get_dependencies(&id)
        .await?;
    Ok(Json(DependencyList {
        microtheory_id: id,
        dependencies,
    }))
}

async fn validate_microtheory(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ValidationSummary>, AppError> {
    Ok(Json(state.resolve::<ValidationService>().validate(&id).await?))
}

async fn find_dependents(
    State(state): State<ApiState>,
    Query(query): Query<ElementQuery>,
) -> Result<Json<Dependents>, AppError> {
    let element_iri = query
        .element
        .ok_or_else(|| AppError::Validation("query parameter 'element' is required".into()))?;
    let microtheories = state
        .resolve::<DependencyService>()
        .find_dependents(&element_iri)
        .await?;
    Ok(Json(Dependents {
        element_iri,
        microtheories,
    }))
}

// ============================================================================
// Ontologies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OntologyContent {
    pub graph_iri: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangedElements {
    #[serde(default)]
    pub elements: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

async fn impact_of_element(
    State(state): State<ApiState>,
    Path(graph_iri): Path<String>,
    Query(query): Query<ElementQuery>,
) -> Result<Json<ImpactReport>, AppError> {
    let elements: Vec<String> = query.element.into_iter().collect();
    let report = state
        .resolve::<ChangeDetector>()
        .impact(&graph_iri, &elements)
        .await?;
    Ok(Json(report))
}

async fn impact_of_elements(
    State(state): State<ApiState>,
    Path(graph_iri): Path<String>,
    Json(body): Json<ChangedElements>,
) -> Result<Json<ImpactReport>, AppError> {
    let report = state
        .resolve::<ChangeDetector>()
        .impact(&graph_iri, &body.elements)
        .await?;
    Ok(Json(report))
}

async fn list_changes(
    State(state): State<ApiState>,
    Path(graph_iri): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChangeEvent>>, AppError> {
    let events = state
        .resolve::<OntologyService>()
        .history(&graph_iri, query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;
    Ok(Json(events))
}

async fn save_ontology(
    State(state): State<ApiState>,
    Json(body): Json<OntologyContent>,
) -> Result<Json<SaveOutcome>, AppError> {
    let outcome = state
        .resolve::<OntologyService>()
        .save(&body.graph_iri, &body.content)
        .await?;
    Ok(Json(outcome))
}

async fn preview_ontology(
    State(state): State<ApiState>,
    Json(body): Json<OntologyContent>,
) -> Result<Json<ChangeReport>, AppError> {
    let report = state
        .resolve::<OntologyService>()
        .preview(&body.graph_iri, &body.content)
        .await?;
    Ok(Json(report))
}
