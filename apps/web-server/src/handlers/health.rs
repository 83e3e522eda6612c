//! Health check endpoint.

use actix_web::{HttpResponse, web};

use inkpost_core::ports::JobQueue;
use inkpost_shared::dto::{HealthResponse, QueueHealth};

use crate::state::AppState;

/// GET /health - storage reachability and notification backlog.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = state.storage_status().await;
    let queue = state.notify_queue.stats().await.unwrap_or_default();

    let response = HealthResponse {
        status: if database == "unreachable" { "degraded" } else { "ok" }.to_string(),
        database: database.to_string(),
        notification_queue: QueueHealth {
            pending: queue.pending,
            failed: queue.failed,
        },
    };

    if database == "unreachable" {
        HttpResponse::ServiceUnavailable().json(response)
    } else {
        HttpResponse::Ok().json(response)
    }
}
