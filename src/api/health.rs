//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub project_id: String,
    pub backends: BackendsResponse,
}

#[derive(Debug, Serialize)]
pub struct BackendsResponse {
    pub documents: String,
    pub messaging: String,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    pub events: EventStats,
    pub notifications: NotificationStats,
}

#[derive(Debug, Serialize)]
pub struct EventStats {
    pub received: u64,
    pub ignored: u64,
    pub broadcast: u64,
    pub chat_message: u64,
    pub interaction: u64,
}

#[derive(Debug, Serialize)]
pub struct NotificationStats {
    pub total_sent: u64,
    pub total_skipped: u64,
    pub total_failed: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let context = state.dispatcher.context();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        project_id: state.settings.firebase.project_id.clone(),
        backends: BackendsResponse {
            documents: context.documents.backend_type().to_string(),
            messaging: context.sender.backend_type().to_string(),
            dry_run: state.settings.fcm.dry_run,
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.dispatcher.stats();

    Json(StatsResponse {
        uptime_seconds: state.start_time.elapsed().as_secs(),
        events: EventStats {
            received: stats.events_received,
            ignored: stats.events_ignored,
            broadcast: stats.broadcast_events,
            chat_message: stats.chat_message_events,
            interaction: stats.interaction_events,
        },
        notifications: NotificationStats {
            total_sent: stats.total_sent,
            total_skipped: stats.total_skipped,
            total_failed: stats.total_failed,
        },
    })
}
