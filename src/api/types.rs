//! API request and response types

use crate::conversation::ConversationContext;
use crate::extract::{BomItem, CircuitData, Extraction};
use crate::provider::{ProviderConfig, ProviderId};
use serde::{Deserialize, Serialize};

/// Request to run one chat turn. `provider` selects the adapter;
/// `api_config` carries the caller's credentials and tunables.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, alias = "conversationId")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub provider: Option<ProviderId>,
    #[serde(default, alias = "apiConfig", alias = "config")]
    pub api_config: Option<ProviderConfig>,
}

/// Success envelope: `{success: true, data: ...}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Error envelope: `{success: false, error, code}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, code: &'static str) -> Self {
        Self {
            success: false,
            error: message.into(),
            code,
        }
    }
}

/// Which extraction strategy produced each field, `null` when absent
#[derive(Debug, Serialize)]
pub struct ExtractionReport {
    pub circuit: Option<&'static str>,
    pub bom: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl From<&Extraction> for ExtractionReport {
    fn from(extraction: &Extraction) -> Self {
        Self {
            circuit: extraction.circuit.method(),
            bom: extraction.bom.method(),
            description: extraction.description.method(),
        }
    }
}

/// Payload of a successful chat turn
#[derive(Debug, Serialize)]
pub struct ChatData {
    pub response: String,
    pub conversation_id: String,
    pub provider: ProviderId,
    pub model: String,
    pub context: ConversationContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_data: Option<CircuitData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bom_data: Option<Vec<BomItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub extraction: ExtractionReport,
}

/// Payload of a config probe. Expected invalidity is data, not an error:
/// the endpoint answers 200 with `is_valid: false`.
#[derive(Debug, Serialize)]
pub struct TestConfigData {
    pub is_valid: bool,
    pub provider: ProviderId,
    pub model: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// One provider catalog entry plus whether the environment configures it
#[derive(Debug, Serialize)]
pub struct ProviderEntry {
    pub id: ProviderId,
    pub name: &'static str,
    pub default_url: &'static str,
    pub default_model: &'static str,
    pub description: &'static str,
    pub env_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ProvidersData {
    pub providers: Vec<ProviderEntry>,
}

#[derive(Debug, Serialize)]
pub struct MemoryStatus {
    pub rss_bytes: u64,
    pub total_bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryStatus>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}
