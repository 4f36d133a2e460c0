//! Outbound email with bounded retries.
//!
//! ## Design
//!
//! - `EmailQueue::add` never blocks and never rejects; it returns a `JobId`
//! - A single processing loop per queue sweeps pending jobs in insertion order
//! - Failed attempts go back to `pending` until `max_attempts` is reached
//! - Exhausted jobs stay in the store as `failed` for inspection
//! - Delivery itself sits behind the `Mailer` trait
//!
//! ## Components
//!
//! - `EmailJob`: one unit of outbound email work and its state machine
//! - `JobStore`: ordered in-memory store with per-status counts
//! - `EmailQueue`: the handle owned by the application, plus the worker loop
//! - `Mailer`: the delivery seam (`LogMailer` logs and succeeds)
//! - `QueueConfig`: attempts and delays, loadable from the environment

pub mod config;
pub mod job;
pub mod mailer;
pub mod queue;
pub mod store;

pub use config::QueueConfig;
pub use job::{EmailJob, EmailKind, EmailStatus, JobId};
pub use mailer::{DeliveryError, LogMailer, Mailer};
pub use queue::{EmailQueue, JobSummary, QueueStatus};
pub use store::{JobStore, StatusCounts};
