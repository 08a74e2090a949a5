//! HTTP server command handler and TRAPI route handlers.

use std::net::SocketAddr;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use color_eyre::Result;
use serde_json::{json, Value};

use crate::config::Config;
use crate::context::Context;
use crate::di::FromRef;
use crate::error::AppError;
use crate::repositories::Store;
use crate::services::CooccurrenceService;
use crate::trapi::{
    self, validate_knowledge_graph, validate_query_graph, KnowledgeGraph, QueryGraph,
};

use super::App;

/// The TRAPI routes over a shared context. Services are resolved per
/// request via `FromRef`.
pub fn router(context: Context) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/overlay", post(overlay))
        .route("/meta_knowledge_graph", get(meta_knowledge_graph))
        .route("/refresh", get(refresh))
        .route("/cache", get(cache))
        .route("/version", get(version))
        .with_state(context)
}

async fn query(State(context): State<Context>, body: String) -> Result<Response, AppError> {
    let request: Value =
        serde_json::from_str(&body).map_err(|error| AppError::MalformedBody(error.to_string()))?;
    let message = request.get("message").ok_or(AppError::MissingMessage)?;
    let query_graph_value = message
        .get("query_graph")
        .cloned()
        .ok_or_else(|| AppError::MalformedBody("message has no query_graph".to_string()))?;
    let query_graph: QueryGraph = serde_json::from_value(query_graph_value)
        .map_err(|error| AppError::MalformedBody(error.to_string()))?;

    let errors = validate_query_graph(&query_graph);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let unsupported: Vec<String> = query_graph
        .edges
        .values()
        .flat_map(|edge| edge.attribute_constraints.iter())
        .filter(|constraint| !constraint.is_supported())
        .map(|constraint| constraint.id.clone())
        .collect();
    if !unsupported.is_empty() {
        return Err(AppError::UnsupportedConstraint(unsupported));
    }

    let service = CooccurrenceService::from_ref(&context);
    let (knowledge_graph, results) = service.lookup(&query_graph).await?;
    tracing::info!(
        edges = knowledge_graph.edges.len(),
        results = results.len(),
        "lookup complete"
    );
    // fields outside message, and message fields we do not model, echo back
    let mut response = request;
    if let Some(message) = response.get_mut("message").and_then(Value::as_object_mut) {
        message.insert("knowledge_graph".to_string(), json!(knowledge_graph));
        message.insert("results".to_string(), json!(results));
    }
    Ok(Json(response).into_response())
}

async fn overlay(State(context): State<Context>, body: String) -> Result<Response, AppError> {
    let request = parse_tolerant(&body)?;
    let message = request.get("message").ok_or(AppError::MissingMessage)?;
    let knowledge_graph_value = message
        .get("knowledge_graph")
        .cloned()
        .ok_or_else(|| AppError::MalformedBody("message has no knowledge_graph".to_string()))?;
    let mut knowledge_graph: KnowledgeGraph = serde_json::from_value(knowledge_graph_value)
        .map_err(|error| AppError::MalformedBody(error.to_string()))?;

    let mut errors = validate_knowledge_graph(&knowledge_graph);
    if let Some(value) = message.get("query_graph") {
        let query_graph: QueryGraph = serde_json::from_value(value.clone())
            .map_err(|error| AppError::MalformedBody(error.to_string()))?;
        errors.extend(validate_query_graph(&query_graph));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let mut results: Vec<trapi::Result> = match message.get("results") {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|error| AppError::MalformedBody(error.to_string()))?,
        None => Vec::new(),
    };

    let service = CooccurrenceService::from_ref(&context);
    service.overlay(&mut knowledge_graph, &mut results).await?;
    let mut response = request;
    if let Some(message) = response.get_mut("message").and_then(Value::as_object_mut) {
        message.insert("knowledge_graph".to_string(), json!(knowledge_graph));
        message.insert("results".to_string(), json!(results));
    }
    Ok(Json(response).into_response())
}

async fn meta_knowledge_graph(State(context): State<Context>) -> Result<Response, AppError> {
    let service = CooccurrenceService::from_ref(&context);
    let meta = service.meta_knowledge_graph().await?;
    Ok(Json(meta).into_response())
}

async fn refresh(State(context): State<Context>) -> Result<Response, AppError> {
    let service = CooccurrenceService::from_ref(&context);
    let counts = service.refresh().await?;
    Ok(Json(counts).into_response())
}

/// Entry counts per cache, for poking at a running instance.
async fn cache(State(context): State<Context>) -> Response {
    Json(cache_counts(&context.caches).await).into_response()
}

async fn cache_counts(caches: &crate::context::Caches) -> Value {
    json!({
        "category_curies": caches.category_curies.len().await,
        "labels": caches.labels.len().await,
        "categories": caches.categories.len().await,
        "synonyms": caches.synonyms.len().await,
        "pair_documents": caches.pair_documents.len().await,
    })
}

async fn version() -> Response {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") })).into_response()
}

/// Some ARS clients double-encode the payload as a JSON string; unwrap one
/// level before parsing.
fn parse_tolerant(body: &str) -> Result<Value, AppError> {
    let value: Value =
        serde_json::from_str(body).map_err(|error| AppError::MalformedBody(error.to_string()))?;
    if let Value::String(inner) = value {
        return serde_json::from_str(&inner)
            .map_err(|error| AppError::MalformedBody(error.to_string()));
    }
    Ok(value)
}

impl App {
    /// Run the TRAPI server over HTTP.
    pub async fn run_serve(&self, host: Option<&str>, port: Option<u16>) -> Result<()> {
        tracing::info!("Starting cooccurrence TRAPI server");

        let config = Config::load()?;
        tracing::info!(uri = %config.postgres.uri, "Connecting to Postgres");
        let store = Store::connect(&config.postgres).await?;

        let host = host.unwrap_or(&config.server.host).to_string();
        let port = port.unwrap_or(config.server.port);
        let context = Context::new(store, config)?;

        // Metrics need the corpus-wide counters before the first request.
        let service = CooccurrenceService::from_ref(&context);
        let counts = service.refresh().await?;
        tracing::info!(%counts, "corpus counters loaded");

        let app = router(context);
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid address {}:{}: {}", host, port, e))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to bind to {}: {}", addr, e))?;

        tracing::info!("TRAPI server listening on http://{}", addr);

        axum::serve(listener, app).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            color_eyre::eyre::eyre!("HTTP server error: {}", e)
        })?;

        tracing::info!("HTTP server shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerant_plain_json() {
        let value = parse_tolerant(r#"{"message": {}}"#).unwrap();
        assert!(value.get("message").is_some());
    }

    #[test]
    fn test_parse_tolerant_double_encoded() {
        let value = parse_tolerant(r#""{\"message\": {}}""#).unwrap();
        assert!(value.get("message").is_some());
    }

    #[test]
    fn test_parse_tolerant_rejects_garbage() {
        assert!(parse_tolerant("not json").is_err());
    }

    #[tokio::test]
    async fn test_cache_counts_reports_every_cache() {
        let caches = crate::context::Caches::new(std::time::Duration::from_secs(60));
        caches.labels.insert("CHEBI:6801".to_string(), "metformin".to_string()).await;
        caches
            .synonyms
            .insert("CHEBI:6801".to_string(), vec!["PR:000001".to_string()])
            .await;

        let counts = cache_counts(&caches).await;
        assert_eq!(counts["labels"], 1);
        assert_eq!(counts["synonyms"], 1);
        assert_eq!(counts["category_curies"], 0);
        assert_eq!(counts["categories"], 0);
        assert_eq!(counts["pair_documents"], 0);
    }
}
