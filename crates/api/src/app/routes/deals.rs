use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use incentive_core::{DealId, RegionId, UserId};
use incentive_rewards::RegisterDeal;

use crate::app::{
    dto::{RegisterDealRequest, RejectDealRequest},
    errors,
    services::AppServices,
};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_deal).get(list_deals))
        .route("/:id", get(get_deal))
        .route("/:id/approve", post(approve_deal))
        .route("/:id/reject", post(reject_deal))
}

/// POST /deals - Register a deal; goals are computed from the region's rate
pub async fn register_deal(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterDealRequest>,
) -> axum::response::Response {
    let user_id: UserId = match errors::parse_id(&body.user_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let region_id: RegionId = match errors::parse_id(&body.region_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = RegisterDeal {
        user_id,
        region_id,
        category: body.category,
        subcategory: body.subcategory,
        deal_type: body.deal_type,
        value: body.value,
    };

    match services.register_deal(cmd) {
        Ok(deal) => (StatusCode::CREATED, Json(deal)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /deals
pub async fn list_deals(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.list_deals())
}

/// GET /deals/:id
pub async fn get_deal(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DealId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.get_deal(&id) {
        Ok(deal) => Json(deal).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /deals/:id/approve - Approve and credit the owner's goals
pub async fn approve_deal(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DealId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.approve_deal(&id) {
        Ok(deal) => Json(deal).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /deals/:id/reject
pub async fn reject_deal(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Option<Json<RejectDealRequest>>,
) -> axum::response::Response {
    let id: DealId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let reason = body.and_then(|Json(b)| b.reason);
    match services.reject_deal(&id, reason) {
        Ok(deal) => Json(deal).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
