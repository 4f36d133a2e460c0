use serde::{Deserialize, Serialize};

use incentive_core::{RegionId, UserId};
use incentive_notifications::JobId;
use incentive_rewards::{Category, DealType};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRegionRequest {
    /// Present when replacing an existing region.
    pub id: Option<RegionId>,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
pub struct SetRateRequest {
    pub region_id: RegionId,
    pub deal_type: DealType,
    pub rate: u64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDealRequest {
    pub user_id: String,
    pub region_id: String,
    pub category: String,
    pub subcategory: String,
    pub deal_type: DealType,
    pub value: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectDealRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub user_id: UserId,
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct GoalsResponse {
    pub user_id: UserId,
    pub goals: u64,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: usize,
}

