//! HTTP routes over the in-memory backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ontodeps::api;
use ontodeps::config::Config;
use ontodeps::context::Context;
use ontodeps::error::AppError;
use ontodeps::models::{ElementKind, OntologyElement};
use ontodeps::store::OntologyStore;

const GRAPH: &str = "http://ex.org/onto";

const ONTOLOGY: &str = r#"
@prefix : <http://ex.org/onto#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
:Person a owl:Class .
:hasName a owl:DatatypeProperty .
"#;

const MICROTHEORY: &str = r#"
@prefix : <http://ex.org/onto#> .
:alice a :Person ; :hasName "Alice" .
"#;

fn encode(iri: &str) -> String {
    iri.replace(':', "%3A").replace('/', "%2F").replace('#', "%23")
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call_with(app, method, uri, body, None).await
}

async fn call_with(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seeded() -> (Router, String) {
    let app = api::router(Context::in_memory(Config::in_memory()));
    let (status, _) = call(
        &app,
        Method::POST,
        "/ontology/save",
        Some(json!({"graph_iri": GRAPH, "content": ONTOLOGY})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/microtheories",
        Some(json!({"slug": "alice", "ontology_graph": GRAPH, "content": MICROTHEORY})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["microtheory"]["id"].as_str().unwrap().to_string();
    (app, id)
}

#[tokio::test]
async fn test_microtheory_lifecycle() {
    let (app, id) = seeded().await;

    let (status, body) = call(&app, Method::GET, &format!("/microtheories/{}/dependencies", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dependencies"].as_array().unwrap().len(), 2);
    assert_eq!(body["dependencies"][0]["element_type"], "Class");

    let (status, body) = call(&app, Method::GET, &format!("/microtheories/{}/validation", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["validation_status"], "complete");
    assert_eq!(body["valid_dependencies"], 2);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/microtheories/{}", id),
        Some(json!({"content": "@prefix : <http://ex.org/onto#> . :alice a :Person ."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dependencies"]["recorded"]["removed"], 1);

    let (status, body) = call(&app, Method::GET, "/microtheories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::DELETE, &format!("/microtheories/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&app, Method::GET, &format!("/microtheories/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MICROTHEORY_NOT_FOUND");
}

#[tokio::test]
async fn test_save_embeds_change_report() {
    let (app, id) = seeded().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/ontology/preview",
        Some(json!({
            "graph_iri": GRAPH,
            "content": "@prefix : <http://ex.org/onto#> . @prefix owl: <http://www.w3.org/2002/07/owl#> . :Person a owl:Class ."
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], json!(["http://ex.org/onto#hasName"]));
    assert_eq!(body["affected_microtheories"], json!([id.clone()]));

    let (status, body) = call(
        &app,
        Method::POST,
        "/ontology/save",
        Some(json!({
            "graph_iri": GRAPH,
            "content": "@prefix : <http://ex.org/onto#> . @prefix owl: <http://www.w3.org/2002/07/owl#> . :Person a owl:Class ."
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["change_detection"]["status"], "completed");
    assert_eq!(body["change_detection"]["affected_microtheories"], json!([id.clone()]));

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/ontologies/{}/changes?limit=1", encode(GRAPH)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["deleted"], json!(["http://ex.org/onto#hasName"]));
}

#[tokio::test]
async fn test_changes_of_unsaved_graph_is_404() {
    let (app, _) = seeded().await;
    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/ontologies/{}/changes", encode("http://ex.org/never-saved")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ONTOLOGY_NOT_FOUND");
}

#[tokio::test]
async fn test_impact_analysis_routes() {
    let (app, id) = seeded().await;
    let person = "http://ex.org/onto#Person";

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/ontologies/{}/impact-analysis?element={}", encode(GRAPH), encode(person)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["impact"][person], json!([id.clone()]));

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/ontologies/{}/impact-analysis", encode(GRAPH)),
        Some(json!({"elements": [person, "http://ex.org/onto#Unused"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["impact"]["http://ex.org/onto#Unused"], json!([]));
    assert_eq!(body["affected_microtheories"], json!([id.clone()]));

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/elements/dependents?element={}", encode(person)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["microtheories"], json!([id]));

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/ontologies/{}/impact-analysis", encode("http://ex.org/unknown")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ONTOLOGY_NOT_FOUND");
}

#[tokio::test]
async fn test_bad_input_is_400() {
    let (app, _) = seeded().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/microtheories",
        Some(json!({"slug": "alice", "ontology_graph": GRAPH})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

struct Unreachable;

#[async_trait]
impl OntologyStore for Unreachable {
    async fn graph_exists(&self, _: &str) -> Result<bool, AppError> {
        Err(AppError::Connection("connection refused".into()))
    }

    async fn elements(&self, _: &str) -> Result<Vec<OntologyElement>, AppError> {
        Err(AppError::Connection("connection refused".into()))
    }

    async fn resolve_elements(
        &self,
        _: &str,
        _: &[String],
    ) -> Result<HashMap<String, ElementKind>, AppError> {
        Err(AppError::Connection("connection refused".into()))
    }

    async fn replace_elements(
        &self,
        _: &str,
        _: &[OntologyElement],
        _: &str,
    ) -> Result<(), AppError> {
        Err(AppError::Connection("connection refused".into()))
    }
}

#[tokio::test]
async fn test_unreachable_store_is_503() {
    let mut ctx = Context::in_memory(Config::in_memory());
    let service: ontodeps::services::MicrotheoryService = ctx.resolve();
    let id = service
        .create("alice", GRAPH, MICROTHEORY)
        .await
        .unwrap()
        .microtheory
        .id;
    ctx.ontology = Arc::new(Unreachable);
    let app = api::router(ctx);

    let (status, body) = call(&app, Method::GET, &format!("/microtheories/{}/validation", id), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "VALIDATION_UNAVAILABLE");
}

#[tokio::test]
async fn test_api_key_is_enforced() {
    let mut config = Config::in_memory();
    config.server.api_key = Some("secret".into());
    let app = api::router(Context::in_memory(config));

    let (status, _) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call_with(&app, Method::GET, "/health", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call_with(&app, Method::GET, "/health", None, Some("secreT")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call_with(&app, Method::GET, "/health", None, Some("secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "memory");
}
