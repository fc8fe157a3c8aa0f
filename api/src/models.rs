//! API Models Module
//!
//! Request and response bodies for the HTTP endpoints.

use dataroom_agents::{ChartData, ChartType, Plan};
use dataroom_core::SchemaSummary;
use serde::{Deserialize, Serialize};

/// Version reported by the health and root endpoints
pub const API_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub status: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub file_size: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
    pub file_info: FileInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub answer: String,
    pub plan: Plan,
    pub chart_data: Option<ChartData>,
    pub chart_type: ChartType,
    pub insights: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub message_count: usize,
    pub has_data: bool,
    pub schema_info: Option<SchemaSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}
