//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use closurecast_core::Error;
use closurecast_model::FeatureOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::CorsConfig;
use crate::state::AppState;

const GENERIC_PREDICTION_ERROR: &str = "예측 중 오류가 발생했습니다";

pub fn create_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors));

    Router::new()
        .route("/options", get(options))
        .route("/predict", post(predict))
        .route("/chat", post(chat))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(middleware)
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowed = config.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin.to_str().map(|o| allowed.allows(o)).unwrap_or(false)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age_secs))
}

/// Categorical choices for the input form
async fn options(State(state): State<AppState>) -> Response {
    metrics::counter!("closurecast_requests_total", "route" => "options").increment(1);

    match &state.prediction {
        Some(service) => Json(service.options()).into_response(),
        None => {
            error!("Options requested but no model is loaded");
            metrics::counter!("closurecast_errors_total", "kind" => Error::ModelUnavailable.kind())
                .increment(1);
            let empty = FeatureOptions::default();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": Error::ModelUnavailable.to_string(),
                    "options": empty.options,
                    "feature_cols": empty.feature_cols,
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Closure probability as a percentage
    pub closure_probability: f64,
    pub risk_level: String,
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let request_id = Uuid::new_v4();
    metrics::counter!("closurecast_requests_total", "route" => "predict").increment(1);

    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let Value::Object(fields) = payload else {
        return Err(AppError::BadRequest(
            "요청 본문은 JSON 객체여야 합니다".to_string(),
        ));
    };

    let service = state.prediction.as_ref().ok_or(Error::ModelUnavailable)?;

    let start = Instant::now();
    let result = service.predict_fields(&fields).map_err(|e| {
        debug!(%request_id, "Prediction rejected: {}", e);
        e
    })?;
    metrics::histogram!("closurecast_predict_latency_us").record(start.elapsed().as_micros() as f64);

    let risk_level = state.config.labels.label(result.tier).to_string();
    info!(
        %request_id,
        probability = result.probability,
        tier = %result.tier,
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        closure_probability: result.percentage(),
        risk_level,
    }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let request_id = Uuid::new_v4();
    metrics::counter!("closurecast_requests_total", "route" => "chat").increment(1);

    let generator = state
        .generator
        .as_ref()
        .ok_or(Error::GenerationClientUnavailable)?;

    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let message = req
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::missing_field("message"))?;

    let context = state.assembler.assemble(message).await?;
    info!(
        %request_id,
        documents = context.documents.len(),
        fallback = context.fallback,
        "Chat context assembled"
    );

    let prompt = state.assembler.render_prompt(&context, message);
    let response = generator.generate(&prompt).await?;

    info!(%request_id, chars = response.chars().count(), "Chat answered");
    Ok(Json(ChatResponse { response }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub document_loaded: bool,
    pub gemini_client_initialized: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: state.model_loaded(),
        document_loaded: state.corpus_loaded,
        gemini_client_initialized: state.generator.is_some(),
    })
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

/// Handler error, rendered as `{"error": "..."}`
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed request body
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Core(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Core(
                Error::ModelUnavailable
                | Error::GenerationClientUnavailable
                | Error::RetriesExhausted { .. },
            ) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Core(e) => e.kind(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::counter!("closurecast_errors_total", "kind" => self.kind()).increment(1);

        let message = match &self {
            AppError::Core(e @ Error::ShapeMismatch { .. }) => {
                error!("Model configuration error: {}", e);
                GENERIC_PREDICTION_ERROR.to_string()
            }
            other if status.is_server_error() => {
                error!("Request failed: {}", other);
                other.to_string()
            }
            other => {
                warn!("Request rejected: {}", other);
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
