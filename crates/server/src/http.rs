use axum::extract::{RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use serde::Deserialize;
use stress_analyzer_core::pipeline::{AnalysisReport, Pipeline, PipelineError};

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UrlParams {
    pub url: Option<String>,
}

/// HTTP error variants mapped to `{"error": ..}` bodies.
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<PipelineError> for HttpError {
    fn from(err: PipelineError) -> Self {
        if err.is_validation() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", get(analyze).post(analyze))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn analyze(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AnalysisReport>, HttpError> {
    let url = extract_url(&headers, query.as_deref(), &body)?.unwrap_or_default();
    let report = state.pipeline.analyze(&url).await?;
    Ok(Json(report))
}

/// A JSON body is the only source when the request declares one. Otherwise
/// the query string wins over a urlencoded form body. Repeated `url` keys
/// resolve to the first occurrence.
fn extract_url(
    headers: &HeaderMap,
    query: Option<&str>,
    body: &Bytes,
) -> Result<Option<String>, HttpError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let params: UrlParams = serde_json::from_slice(body)
            .map_err(|e| HttpError::BadRequest(format!("invalid JSON body: {e}")))?;
        return Ok(params.url);
    }

    if let Some(url) = query
        .and_then(|q| first_url_field(q.as_bytes()))
        .filter(|u| !u.is_empty())
    {
        return Ok(Some(url));
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return Ok(first_url_field(body));
    }

    Ok(None)
}

fn first_url_field(encoded: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(encoded)
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}
