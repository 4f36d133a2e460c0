//! Deal registration and approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use incentive_core::{DealId, DomainError, DomainResult, RegionId, UserId};

use crate::points::{DealType, PointsConfig};
use crate::region::{Placement, RegionDirectory};

/// Deal lifecycle: `pending -> approved | rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Pending,
    Approved,
    Rejected,
}

/// Command: RegisterDeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDeal {
    pub user_id: UserId,
    pub region_id: RegionId,
    pub category: String,
    pub subcategory: String,
    pub deal_type: DealType,
    /// Value in smallest currency unit (e.g., cents).
    pub value: u64,
}

/// A registered deal and the goals it is worth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub user_id: UserId,
    pub placement: Placement,
    pub deal_type: DealType,
    pub value: u64,
    /// Goals computed at registration with the rate in force then.
    pub goals: u64,
    pub status: DealStatus,
    pub rejection_reason: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Deal {
    /// Validate placement, price the deal and create it as pending.
    pub fn register(
        cmd: RegisterDeal,
        regions: &RegionDirectory,
        points: &PointsConfig,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if cmd.value == 0 {
            return Err(DomainError::validation("deal value must be greater than zero"));
        }

        let placement = regions.resolve(&cmd.region_id, &cmd.category, &cmd.subcategory)?;
        let goals = points.goals_for(&cmd.region_id, cmd.deal_type, cmd.value)?;

        Ok(Self {
            id: DealId::new(),
            user_id: cmd.user_id,
            placement,
            deal_type: cmd.deal_type,
            value: cmd.value,
            goals,
            status: DealStatus::Pending,
            rejection_reason: None,
            registered_at: now,
            decided_at: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, DealStatus::Pending)
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_pending()?;
        self.status = DealStatus::Approved;
        self.decided_at = Some(now);
        Ok(())
    }

    pub fn reject(&mut self, reason: Option<String>, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_pending()?;
        self.status = DealStatus::Rejected;
        self.rejection_reason = reason;
        self.decided_at = Some(now);
        Ok(())
    }

    fn ensure_pending(&self) -> DomainResult<()> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "deal {} is already {:?}",
                self.id, self.status
            )))
        }
    }
}
