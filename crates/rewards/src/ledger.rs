//! Goal balances per user.

use std::collections::HashMap;

use incentive_core::{DealId, DomainError, DomainResult, UserId};

use crate::deal::{Deal, DealStatus};

/// Goals credited from approved deals.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<UserId, u64>,
    credited: HashMap<DealId, UserId>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an approved deal's goals to its owner, once.
    pub fn credit(&mut self, deal: &Deal) -> DomainResult<u64> {
        if deal.status != DealStatus::Approved {
            return Err(DomainError::validation(format!(
                "deal {} is not approved",
                deal.id
            )));
        }
        if self.credited.contains_key(&deal.id) {
            return Err(DomainError::conflict(format!(
                "deal {} already credited",
                deal.id
            )));
        }

        self.credited.insert(deal.id, deal.user_id);
        let balance = self.balances.entry(deal.user_id).or_insert(0);
        *balance = balance.saturating_add(deal.goals);
        Ok(*balance)
    }

    pub fn balance(&self, user_id: &UserId) -> u64 {
        self.balances.get(user_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::RegisterDeal;
    use crate::points::{DealType, PointsConfig};
    use crate::region::{Category, Region, RegionDirectory};
    use chrono::Utc;
    use incentive_core::RegionId;

    fn deal_for(user_id: UserId, value: u64) -> Deal {
        let region = Region::new(RegionId::new(), "NA", vec![Category::new("Cloud", ["Compute"])])
            .unwrap();
        let region_id = region.id;
        let mut regions = RegionDirectory::new();
        regions.upsert_region(region);
        let mut points = PointsConfig::new();
        points.set_rate(region_id, DealType::Renewal, 100).unwrap();

        Deal::register(
            RegisterDeal {
                user_id,
                region_id,
                category: "Cloud".into(),
                subcategory: "Compute".into(),
                deal_type: DealType::Renewal,
                value,
            },
            &regions,
            &points,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn approved_deals_accumulate() {
        let user = UserId::new();
        let mut ledger = Ledger::new();

        let mut first = deal_for(user, 1_000);
        first.approve(Utc::now()).unwrap();
        let mut second = deal_for(user, 550);
        second.approve(Utc::now()).unwrap();

        assert_eq!(ledger.credit(&first).unwrap(), 10);
        assert_eq!(ledger.credit(&second).unwrap(), 15);
        assert_eq!(ledger.balance(&user), 15);
        assert_eq!(ledger.balance(&UserId::new()), 0);
    }

    #[test]
    fn pending_or_repeated_credits_are_refused() {
        let user = UserId::new();
        let mut ledger = Ledger::new();

        let mut deal = deal_for(user, 1_000);
        assert!(ledger.credit(&deal).is_err());

        deal.approve(Utc::now()).unwrap();
        ledger.credit(&deal).unwrap();
        assert!(matches!(ledger.credit(&deal), Err(DomainError::Conflict(_))));
        assert_eq!(ledger.balance(&user), 10);
    }
}
