//! Operator endpoints for the outbound email queue.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use incentive_notifications::JobId;

use crate::app::{dto::CleanupResponse, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/email-queue", get(queue_status))
        .route("/email-queue/cleanup", post(cleanup_queue))
        .route("/email-queue/jobs/:id", get(queue_job))
}

/// GET /admin/email-queue - Counts per status and every stored job
pub async fn queue_status(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.email_queue().status())
}

/// POST /admin/email-queue/cleanup - Drop sent jobs
pub async fn cleanup_queue(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(CleanupResponse {
        removed: services.email_queue().cleanup(),
    })
}

/// GET /admin/email-queue/jobs/:id
pub async fn queue_job(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: JobId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.email_queue().job(&id) {
        Some(job) => Json(job).into_response(),
        None => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "job not found (delivered jobs are removed)",
        ),
    }
}
