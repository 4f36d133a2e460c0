//! Application services: rewards state + outbound email.
//!
//! Everything lives in memory behind one mutex; handlers never hold it across
//! an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::json;

use incentive_core::{DealId, DomainError, DomainResult, UserId};
use incentive_notifications::{EmailKind, EmailQueue, JobId};
use incentive_rewards::{
    Deal, Ledger, PointsConfig, PointsRate, Region, RegionDirectory, RegisterDeal,
};

use crate::app::dto::CreateRegionRequest;

#[derive(Debug, Default)]
struct RewardsState {
    regions: RegionDirectory,
    points: PointsConfig,
    deals: BTreeMap<DealId, Deal>,
    ledger: Ledger,
    user_emails: HashMap<UserId, String>,
    users_by_email: HashMap<String, UserId>,
}

/// Shared services handed to every handler.
#[derive(Debug)]
pub struct AppServices {
    state: Mutex<RewardsState>,
    email_queue: EmailQueue,
    admin_email: String,
}

impl AppServices {
    pub fn new(email_queue: EmailQueue, admin_email: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(RewardsState::default()),
            email_queue,
            admin_email: admin_email.into(),
        }
    }

    pub fn email_queue(&self) -> &EmailQueue {
        &self.email_queue
    }

    fn lock(&self) -> MutexGuard<'_, RewardsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---------------------------------------------------------------------
    // Regions + points
    // ---------------------------------------------------------------------

    pub fn upsert_region(&self, req: CreateRegionRequest) -> DomainResult<Region> {
        let region = Region::new(req.id.unwrap_or_default(), req.name, req.categories)?;
        let replaced = self.lock().regions.upsert_region(region.clone()).is_some();
        tracing::info!(region_id = %region.id, name = %region.name, replaced, "region saved");
        Ok(region)
    }

    pub fn list_regions(&self) -> Vec<Region> {
        self.lock().regions.list().into_iter().cloned().collect()
    }

    pub fn set_rate(&self, rate: PointsRate) -> DomainResult<PointsRate> {
        let mut state = self.lock();
        if state.regions.region(&rate.region_id).is_none() {
            return Err(DomainError::not_found(format!("region {}", rate.region_id)));
        }
        let previous = state.points.set_rate(rate.region_id, rate.deal_type, rate.rate)?;
        tracing::info!(
            region_id = %rate.region_id,
            deal_type = %rate.deal_type,
            rate = rate.rate,
            previous = ?previous,
            "points rate set"
        );
        Ok(rate)
    }

    pub fn list_rates(&self) -> Vec<PointsRate> {
        self.lock().points.rates()
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    /// Queue an invitation for `email`. Re-inviting an address keeps its
    /// existing user id.
    pub fn invite_user(&self, email: &str) -> DomainResult<(UserId, JobId)> {
        let email = normalize_email(email)?;
        let user_id = {
            let mut state = self.lock();
            match state.users_by_email.get(&email).copied() {
                Some(id) => id,
                None => {
                    let id = UserId::new();
                    state.users_by_email.insert(email.clone(), id);
                    state.user_emails.insert(id, email.clone());
                    id
                }
            }
        };

        let job_id = self.email_queue.add(
            EmailKind::Invite,
            email,
            json!({ "user_id": user_id }),
            None,
        );
        Ok((user_id, job_id))
    }

    pub fn send_magic_link(&self, email: &str) -> DomainResult<JobId> {
        let email = normalize_email(email)?;
        let token = uuid::Uuid::new_v4();
        Ok(self
            .email_queue
            .add(EmailKind::MagicLink, email, json!({ "token": token }), None))
    }

    pub fn goals(&self, user_id: &UserId) -> u64 {
        self.lock().ledger.balance(user_id)
    }

    // ---------------------------------------------------------------------
    // Deals
    // ---------------------------------------------------------------------

    /// Register a deal and ask the admin to approve it.
    pub fn register_deal(&self, cmd: RegisterDeal) -> DomainResult<Deal> {
        let deal = {
            let mut state = self.lock();
            let deal = Deal::register(cmd, &state.regions, &state.points, Utc::now())?;
            state.deals.insert(deal.id, deal.clone());
            deal
        };

        tracing::info!(
            deal_id = %deal.id,
            user_id = %deal.user_id,
            goals = deal.goals,
            "deal registered"
        );
        self.email_queue.add(
            EmailKind::Approval,
            self.admin_email.clone(),
            json!({
                "event": "deal_registered",
                "deal_id": deal.id,
                "user_id": deal.user_id,
                "region": deal.placement.region,
                "deal_type": deal.deal_type,
                "value": deal.value,
                "goals": deal.goals,
            }),
            None,
        );
        Ok(deal)
    }

    pub fn get_deal(&self, id: &DealId) -> DomainResult<Deal> {
        self.lock()
            .deals
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("deal {id}")))
    }

    pub fn list_deals(&self) -> Vec<Deal> {
        self.lock().deals.values().cloned().collect()
    }

    /// Approve a pending deal and credit its goals.
    pub fn approve_deal(&self, id: &DealId) -> DomainResult<Deal> {
        let (deal, owner_email) = {
            let mut state = self.lock();
            let deal = state
                .deals
                .get_mut(id)
                .ok_or_else(|| DomainError::not_found(format!("deal {id}")))?;
            deal.approve(Utc::now())?;
            let deal = deal.clone();
            let balance = state.ledger.credit(&deal)?;
            tracing::info!(deal_id = %deal.id, user_id = %deal.user_id, balance, "deal approved");
            let owner_email = state.user_emails.get(&deal.user_id).cloned();
            (deal, owner_email)
        };

        self.notify_owner(&deal, owner_email);
        Ok(deal)
    }

    pub fn reject_deal(&self, id: &DealId, reason: Option<String>) -> DomainResult<Deal> {
        let (deal, owner_email) = {
            let mut state = self.lock();
            let deal = state
                .deals
                .get_mut(id)
                .ok_or_else(|| DomainError::not_found(format!("deal {id}")))?;
            deal.reject(reason, Utc::now())?;
            let deal = deal.clone();
            tracing::info!(deal_id = %deal.id, user_id = %deal.user_id, "deal rejected");
            let owner_email = state.user_emails.get(&deal.user_id).cloned();
            (deal, owner_email)
        };

        self.notify_owner(&deal, owner_email);
        Ok(deal)
    }

    fn notify_owner(&self, deal: &Deal, email: Option<String>) {
        let Some(email) = email else {
            tracing::debug!(deal_id = %deal.id, "deal owner has no email on file");
            return;
        };
        self.email_queue.add(
            EmailKind::Approval,
            email,
            json!({
                "event": "deal_decided",
                "deal_id": deal.id,
                "status": deal.status,
                "goals": deal.goals,
                "reason": deal.rejection_reason,
            }),
            None,
        );
    }
}

fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(DomainError::validation(format!("invalid email address '{email}'"))),
    }
}
