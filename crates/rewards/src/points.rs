//! Points configuration and the goals formula.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use incentive_core::{DomainError, DomainResult, RegionId};

/// Kind of deal; each region prices them separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    NewBusiness,
    Renewal,
    Upsell,
}

impl DealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealType::NewBusiness => "new_business",
            DealType::Renewal => "renewal",
            DealType::Upsell => "upsell",
        }
    }
}

impl core::fmt::Display for DealType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured conversion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsRate {
    pub region_id: RegionId,
    pub deal_type: DealType,
    /// Deal value (smallest currency unit) that earns one goal.
    pub rate: u64,
}

/// Conversion rates per (region, deal type).
#[derive(Debug, Clone, Default)]
pub struct PointsConfig {
    rates: BTreeMap<(RegionId, DealType), u64>,
}

impl PointsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a rate; returns the previous one. Zero is rejected.
    pub fn set_rate(
        &mut self,
        region_id: RegionId,
        deal_type: DealType,
        rate: u64,
    ) -> DomainResult<Option<u64>> {
        if rate == 0 {
            return Err(DomainError::validation("rate must be greater than zero"));
        }
        Ok(self.rates.insert((region_id, deal_type), rate))
    }

    pub fn rate(&self, region_id: &RegionId, deal_type: DealType) -> Option<u64> {
        self.rates.get(&(*region_id, deal_type)).copied()
    }

    pub fn rates(&self) -> Vec<PointsRate> {
        self.rates
            .iter()
            .map(|(&(region_id, deal_type), &rate)| PointsRate {
                region_id,
                deal_type,
                rate,
            })
            .collect()
    }

    /// Goals earned by a deal: `value / rate`, rounded down.
    pub fn goals_for(
        &self,
        region_id: &RegionId,
        deal_type: DealType,
        value: u64,
    ) -> DomainResult<u64> {
        let rate = self.rate(region_id, deal_type).ok_or_else(|| {
            DomainError::validation(format!(
                "no points rate configured for {deal_type} deals in region {region_id}"
            ))
        })?;
        Ok(value / rate)
    }
}
