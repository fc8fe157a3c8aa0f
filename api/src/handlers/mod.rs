//! API Handlers Module
//!
//! Request handlers and the shared state they operate on.

use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Multipart, Path, State},
    response::Json,
};
use dataroom_agents::{Executor, GeminiClient, LlmClient, LlmError, Planner};
use dataroom_core::{AppConfig, ContextLog, SessionStore};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    ChatRequest, ChatResponse, FileInfo, HealthResponse, ResetRequest, ResetResponse,
    RootResponse, SessionInfo, UploadResponse, API_VERSION,
};

/// The two pipeline stages, sharing one model client
#[derive(Debug, Clone)]
pub struct Agents {
    pub planner: Planner,
    pub executor: Executor,
}

impl Agents {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            planner: Planner::new(client.clone()),
            executor: Executor::new(client),
        }
    }
}

/// Represents the state of the API server
#[derive(Debug)]
pub struct ApiState {
    /// Uploaded datasets by session
    pub store: Arc<SessionStore>,
    /// Conversation history by session
    pub context: Arc<ContextLog>,
    /// `None` when no LLM API key is configured
    pub agents: Option<Agents>,
}

impl ApiState {
    pub fn new(store: Arc<SessionStore>, context: Arc<ContextLog>, agents: Option<Agents>) -> Self {
        Self {
            store,
            context,
            agents,
        }
    }

    /// Build fresh state from configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let context = ContextLog::new(config.max_context_messages, config.context_ttl()?);

        let agents = match GeminiClient::from_config(config) {
            Ok(client) => Some(Agents::new(Arc::new(client))),
            Err(LlmError::MissingApiKey) => {
                tracing::debug!("No LLM API key; chat is disabled");
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::new(
            Arc::new(SessionStore::new()),
            Arc::new(context),
            agents,
        ))
    }

    /// State backed by an explicit model client
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self::new(
            Arc::new(SessionStore::new()),
            Arc::new(ContextLog::default()),
            Some(Agents::new(client)),
        )
    }
}

/// Service banner
#[debug_handler]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: "Data Room API".to_string(),
        version: API_VERSION.to_string(),
        status: "running".to_string(),
        endpoints: [
            "GET /api/health",
            "POST /api/upload",
            "POST /api/chat",
            "GET /api/session/:session_id",
            "POST /api/reset",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    })
}

/// Health check endpoint
#[debug_handler]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: API_VERSION.to_string(),
    })
}

/// Upload a CSV or Excel file into a new session
#[debug_handler]
pub async fn upload_file(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    let file_size = bytes.len();
    tracing::debug!("Uploading file: {} ({} bytes)", filename, file_size);

    let validation = SessionStore::validate_file(&filename, file_size);
    if !validation.is_valid() {
        return Err(ApiError::BadRequest(validation.reason().to_string()));
    }

    let dataset = SessionStore::load_bytes(&filename, bytes.to_vec())
        .map_err(|e| ApiError::Processing(e.to_string()))?;

    let session_id = Uuid::new_v4().to_string();
    let file_info = FileInfo {
        filename,
        row_count: dataset.height(),
        columns: dataset.column_names(),
        file_size,
    };
    state.store.store_dataframe(&session_id, dataset);

    tracing::debug!(
        session_id = %session_id,
        rows = file_info.row_count,
        "Upload parsed"
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully".to_string(),
        session_id,
        file_info,
    }))
}

/// Answer a question about a session's dataset
#[debug_handler]
pub async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    tracing::debug!("Chat request for session: {}", request.session_id);

    let dataset = state.store.get_dataframe(&request.session_id).ok_or_else(|| {
        ApiError::NotFound("No data found for this session. Please upload a file first.".to_string())
    })?;

    let agents = state.agents.as_ref().ok_or(ApiError::MissingApiKey)?;
    let context = state.context.get_context(&request.session_id);

    let plan = agents
        .planner
        .create_plan(&dataset, &request.question, &context)
        .await;
    let result = agents
        .executor
        .execute(&dataset, &plan, &request.question, &context)
        .await;

    state.context.add_message(
        &request.session_id,
        &request.question,
        &result.answer,
        json!({
            "chart_type": result.chart_type,
            "plan": plan.to_value(),
        }),
    );

    Ok(Json(ChatResponse {
        success: true,
        answer: result.answer,
        plan,
        chart_data: result.data,
        chart_type: result.chart_type,
        insights: result.insights,
    }))
}

/// Session overview: history size and dataset schema
#[debug_handler]
pub async fn get_session(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionInfo>, ApiError> {
    tracing::debug!("Getting session: {}", session_id);

    let context_info = state.context.session_info(&session_id);
    let schema_info = state.store.get_schema_summary(&session_id);

    if context_info.is_none() && schema_info.is_none() {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    Ok(Json(SessionInfo {
        session_id,
        message_count: context_info.map(|info| info.message_count).unwrap_or(0),
        has_data: schema_info.is_some(),
        schema_info,
    }))
}

/// Clear a session's history and dataset
#[debug_handler]
pub async fn reset_session(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ResetRequest>,
) -> Json<ResetResponse> {
    let context_cleared = state.context.clear_session(&request.session_id);
    let data_cleared = state.store.clear_session(&request.session_id);

    tracing::debug!(
        session_id = %request.session_id,
        context_cleared,
        data_cleared,
        "Reset session"
    );

    let response = if context_cleared || data_cleared {
        ResetResponse {
            success: true,
            message: "Session reset successfully".to_string(),
        }
    } else {
        ResetResponse {
            success: false,
            message: "Session not found".to_string(),
        }
    };
    Json(response)
}
