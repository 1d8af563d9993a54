use lectern_core::{EngineInfo, LookupResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub citation: String,
}

/// Successful lookup body: the engine result with a `success` flag.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: LookupResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineInfoResponse {
    #[serde(flatten)]
    pub info: EngineInfo,
    pub corpus_path: Option<String>,
}
