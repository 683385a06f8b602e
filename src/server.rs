//! HTTP surface over [`TranslationService`].
//!
//! - `GET  /health`
//! - `POST /translate`        `{text}` → `{translation}`, or 500 with `{error, translation}`
//! - `POST /translate/batch`  `{texts}` → `{translations}`
//! - `POST /summarize`        `{title, content}` → `{summary, sentiment}`

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::service::TranslationService;
use crate::summary::SummaryResult;

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub translations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn router(service: Arc<TranslationService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/translate", post(translate))
        .route("/translate/batch", post(translate_batch))
        .route("/summarize", post(summarize))
        .with_state(service)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(service: Arc<TranslationService>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Translation server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn translate(
    State(service): State<Arc<TranslationService>>,
    Json(request): Json<TranslateRequest>,
) -> Response {
    let span = info_span!("translate", request_id = %Uuid::new_v4());
    async move {
        info!("Endpoint translation of {} chars", request.text.chars().count());
        match service.translate_for_endpoint(&request.text).await {
            Ok(translation) => Json(TranslateResponse { translation }).into_response(),
            Err(failure) => (StatusCode::INTERNAL_SERVER_ERROR, Json(failure)).into_response(),
        }
    }
    .instrument(span)
    .await
}

async fn translate_batch(
    State(service): State<Arc<TranslationService>>,
    Json(request): Json<BatchRequest>,
) -> Json<BatchResponse> {
    let span = info_span!("batch", request_id = %Uuid::new_v4());
    let translations = service.translate_batch(&request.texts).instrument(span).await;
    Json(BatchResponse { translations })
}

async fn summarize(
    State(service): State<Arc<TranslationService>>,
    Json(request): Json<SummarizeRequest>,
) -> Json<SummaryResult> {
    let span = info_span!("summarize", request_id = %Uuid::new_v4());
    let result = service
        .summarize_and_translate(&request.title, &request.content)
        .instrument(span)
        .await;
    Json(result)
}
