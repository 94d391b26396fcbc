//! HTTP request handlers

use super::types::{
    ChatData, ChatRequest, ErrorResponse, ExtractionReport, HealthResponse, MemoryStatus,
    ProviderEntry, ProvidersData, SuccessResponse, TestConfigData, VersionResponse,
};
use super::AppState;
use crate::chat::ChatError;
use crate::provider::{supported_providers, KeyValidation, ProviderConfig, ProviderErrorKind};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

const MAX_MESSAGE_CHARS: usize = 2000;

/// Memory pressure threshold above which health reports degraded
const MEMORY_DEGRADED_PERCENT: f64 = 90.0;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai/chat", post(chat))
        .route("/api/ai/test-config", post(test_config))
        .route("/api/ai/providers", get(list_providers))
        .route("/api/health", get(health))
        .route("/api/version", get(version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    req: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<ChatData>>, AppError> {
    let Json(req) = req?;
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }

    // The top-level provider field overrides whatever the config carries
    let requested_config = match (req.api_config, req.provider) {
        (Some(mut config), Some(provider)) => {
            config.provider = provider;
            Some(config)
        }
        (Some(config), None) => Some(config),
        (None, Some(provider)) => Some(ProviderConfig {
            provider,
            ..Default::default()
        }),
        (None, None) => None,
    };

    let outcome = state
        .orchestrator
        .chat(message, req.conversation_id.as_deref(), requested_config)
        .await?;

    let extraction = ExtractionReport::from(&outcome.extraction);
    Ok(Json(SuccessResponse::new(ChatData {
        response: outcome.reply,
        conversation_id: outcome.conversation_id,
        provider: outcome.provider,
        model: outcome.model,
        context: outcome.context,
        circuit_data: outcome.extraction.circuit.into_option(),
        bom_data: outcome.extraction.bom.into_option(),
        description: outcome.extraction.description.into_option(),
        extraction,
    })))
}

// ============================================================
// Config probe
// ============================================================

async fn test_config(
    State(state): State<AppState>,
    config: Result<Json<ProviderConfig>, JsonRejection>,
) -> Result<Json<SuccessResponse<TestConfigData>>, AppError> {
    let Json(config) = config?;
    let outcome = state.orchestrator.test_config(&config).await?;

    let (is_valid, error) = match outcome.validation {
        KeyValidation::Valid => (true, None),
        KeyValidation::Invalid { reason } | KeyValidation::Unreachable { reason } => {
            (false, Some(reason))
        }
    };

    Ok(Json(SuccessResponse::new(TestConfigData {
        is_valid,
        provider: outcome.provider,
        model: outcome.model,
        latency_ms: outcome.latency_ms,
        error,
        preview: outcome.reply_preview,
    })))
}

// ============================================================
// Provider catalog
// ============================================================

async fn list_providers(State(state): State<AppState>) -> Json<SuccessResponse<ProvidersData>> {
    let configured = state.providers.configured_providers();
    let providers = supported_providers()
        .iter()
        .map(|p| ProviderEntry {
            id: p.id,
            name: p.name,
            default_url: p.default_url,
            default_model: p.default_model,
            description: p.description,
            env_configured: configured.contains(&p.id),
        })
        .collect();
    Json(SuccessResponse::new(ProvidersData { providers }))
}

// ============================================================
// Health and version
// ============================================================

async fn health(State(state): State<AppState>) -> Response {
    let memory = read_memory_status();
    let degraded = memory
        .as_ref()
        .map(|m| m.percent > MEMORY_DEGRADED_PERCENT)
        .unwrap_or(false);

    let body = Json(HealthResponse {
        status: if degraded { "degraded" } else { "ok" },
        uptime_secs: state.started_at.elapsed().as_secs(),
        memory,
    });

    if degraded {
        (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
    } else {
        body.into_response()
    }
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Read RSS and total memory from /proc. Absent off Linux.
#[cfg(target_os = "linux")]
fn read_memory_status() -> Option<MemoryStatus> {
    fn field_kb(content: &str, field: &str) -> Option<u64> {
        content
            .lines()
            .find(|l| l.starts_with(field))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    }

    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let rss_kb = field_kb(&status, "VmRSS:")?;
    let total_kb = field_kb(&meminfo, "MemTotal:")?;
    if total_kb == 0 {
        return None;
    }
    Some(MemoryStatus {
        rss_bytes: rss_kb * 1024,
        total_bytes: total_kb * 1024,
        percent: rss_kb as f64 / total_kb as f64 * 100.0,
    })
}

#[cfg(not(target_os = "linux"))]
fn read_memory_status() -> Option<MemoryStatus> {
    None
}

// ============================================================
// Error mapping
// ============================================================

pub(super) enum AppError {
    BadRequest(String),
    Chat(ChatError),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

// Body deserialization failures go through the same error envelope
// instead of axum's plain-text 422.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::Chat(ChatError::NoConfig) => (
                StatusCode::BAD_REQUEST,
                "no_config",
                ChatError::NoConfig.to_string(),
            ),
            AppError::Chat(ChatError::Store(e)) => {
                (StatusCode::NOT_FOUND, "not_found", e.to_string())
            }
            AppError::Chat(ChatError::Provider(e)) => {
                let status = match e.kind {
                    ProviderErrorKind::Auth => StatusCode::UNAUTHORIZED,
                    ProviderErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
                    ProviderErrorKind::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
                    ProviderErrorKind::Network => StatusCode::SERVICE_UNAVAILABLE,
                    ProviderErrorKind::ServerError => StatusCode::BAD_GATEWAY,
                    ProviderErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                    ProviderErrorKind::Parse | ProviderErrorKind::Unknown => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.kind.code(), e.message)
            }
        };

        (status, Json(ErrorResponse::new(message, code))).into_response()
    }
}
