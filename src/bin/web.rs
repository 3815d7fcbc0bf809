//! taskpilot HTTP 服务
//!
//! 启动: cargo run --bin taskpilot-web --features web
//! 默认监听 127.0.0.1:8000（[server].bind 或 TASKPILOT__SERVER__BIND 覆盖）

#![cfg(feature = "web")]

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use taskpilot::agent::{AgentReply, AgentService};
use taskpilot::config::load_config;
use taskpilot::core::StatsSnapshot;
use taskpilot::observability;

#[derive(Debug, Deserialize)]
struct AgentChatRequest {
    message: String,
    #[serde(default = "default_session_id")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct CancelRequest {
    session_id: String,
}

fn default_session_id() -> String {
    "default".to_string()
}

type AppState = Arc<AgentService>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load configuration")?;
    let service: AppState = Arc::new(AgentService::from_config(&cfg));

    let app = app(service);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.bind))?;
    tracing::info!("{} web: http://{}", cfg.app.display_name(), cfg.server.bind);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn app(service: AppState) -> Router {
    Router::new()
        .route("/chat/agent", post(chat_agent))
        .route("/chat/agent/cancel", post(cancel_agent))
        .route("/agents/available", get(agents_available))
        .route("/agents/stats", get(agents_stats))
        .route("/tools/available", get(tools_available))
        .route("/api/health", get(|| async { "OK" }))
        .with_state(service)
}

/// POST /chat/agent：{ "message": "...", "session_id": "..." }
async fn chat_agent(
    State(service): State<AppState>,
    Json(req): Json<AgentChatRequest>,
) -> Result<Json<AgentReply>, (StatusCode, String)> {
    if req.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message is required".to_string()));
    }
    service
        .chat_with_agent(&req.message, &req.session_id)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// POST /chat/agent/cancel：取消该会话正在执行的计划
async fn cancel_agent(State(service): State<AppState>, Json(req): Json<CancelRequest>) -> StatusCode {
    if service.cancel(&req.session_id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn agents_available(State(service): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({ "agents": service.available_agents() }))
}

async fn agents_stats(State(service): State<AppState>) -> Json<StatsSnapshot> {
    Json(service.stats())
}

async fn tools_available(State(service): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "tools": service.tool_catalog(),
        "usage": service.tool_usage(),
    }))
}
