//! Tool availability route
//!
//! Diagnostic endpoint reporting which converter backends the host
//! currently has. The snapshot is probed on every call, mirroring what a
//! conversion request would see.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::convert::ToolAvailability;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsResponse {
    probed_at: DateTime<Utc>,
    tools: ToolAvailability,
}

/// Create the tools router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_tools))
}

async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    let tools = state.prober().probe().await;
    Json(ToolsResponse {
        probed_at: Utc::now(),
        tools,
    })
}
