//! Rewards domain: regions, points rates, deals and goal balances.
//!
//! Pure, deterministic business rules (no IO, no HTTP, no storage). Deal
//! values are in the smallest currency unit; goals are whole points.

pub mod deal;
pub mod ledger;
pub mod points;
pub mod region;

pub use deal::{Deal, DealStatus, RegisterDeal};
pub use ledger::Ledger;
pub use points::{DealType, PointsConfig, PointsRate};
pub use region::{Category, Placement, Region, RegionDirectory};
