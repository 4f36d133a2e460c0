use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::{dto::CreateRegionRequest, errors, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/", post(upsert_region).get(list_regions))
}

/// POST /regions - Create or replace a region and its category tree
pub async fn upsert_region(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateRegionRequest>,
) -> axum::response::Response {
    match services.upsert_region(body) {
        Ok(region) => (StatusCode::CREATED, Json(region)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /regions
pub async fn list_regions(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.list_regions())
}
