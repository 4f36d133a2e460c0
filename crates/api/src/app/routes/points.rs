use std::sync::Arc;

use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::put,
    Json, Router,
};

use incentive_rewards::PointsRate;

use crate::app::{dto::SetRateRequest, errors, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/rates", put(set_rate).get(list_rates))
}

/// PUT /points/rates - Set the conversion rate for a region and deal type
pub async fn set_rate(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SetRateRequest>,
) -> axum::response::Response {
    let rate = PointsRate {
        region_id: body.region_id,
        deal_type: body.deal_type,
        rate: body.rate,
    };
    match services.set_rate(rate) {
        Ok(rate) => Json(rate).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /points/rates
pub async fn list_rates(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.list_rates())
}
