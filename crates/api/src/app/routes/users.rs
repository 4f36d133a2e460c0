use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use incentive_core::UserId;

use crate::app::{
    dto::{EmailRequest, GoalsResponse, InviteResponse, QueuedResponse},
    errors,
    services::AppServices,
};

pub fn router() -> Router {
    Router::new()
        .route("/invite", post(invite_user))
        .route("/:id/goals", get(user_goals))
}

pub fn auth_router() -> Router {
    Router::new().route("/magic-link", post(magic_link))
}

/// POST /users/invite - Queue an invitation email
pub async fn invite_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<EmailRequest>,
) -> axum::response::Response {
    match services.invite_user(&body.email) {
        Ok((user_id, job_id)) => {
            (StatusCode::ACCEPTED, Json(InviteResponse { user_id, job_id })).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /auth/magic-link - Queue a sign-in link
pub async fn magic_link(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<EmailRequest>,
) -> axum::response::Response {
    match services.send_magic_link(&body.email) {
        Ok(job_id) => (StatusCode::ACCEPTED, Json(QueuedResponse { job_id })).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /users/:id/goals
pub async fn user_goals(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id: UserId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    Json(GoalsResponse {
        user_id,
        goals: services.goals(&user_id),
    })
    .into_response()
}
