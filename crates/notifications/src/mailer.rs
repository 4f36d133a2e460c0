//! Delivery seam between the queue and the mail provider.

use async_trait::async_trait;
use tracing::info;

use super::job::EmailJob;

/// Why a delivery attempt failed. The queue only records the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The provider refused or could not be reached; worth retrying.
    #[error("transient delivery failure: {0}")]
    Transient(String),
    /// The provider rejected the message itself.
    #[error("delivery rejected: {0}")]
    Rejected(String),
    /// The mailer panicked mid-attempt.
    #[error("mailer panicked: {0}")]
    Panicked(String),
}

impl DeliveryError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Sends one email job.
///
/// Implementations pick the template from `job.kind` and render `job.data`.
/// There is no timeout around `deliver`; a hanging call stalls the sweep.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, job: &EmailJob) -> Result<(), DeliveryError>;
}

/// Mailer that logs the message it would send and reports success.
///
/// Stands in for a provider integration in development and tests.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, job: &EmailJob) -> Result<(), DeliveryError> {
        info!(
            job_id = %job.id,
            kind = %job.kind,
            template = job.kind.template(),
            recipient = %job.recipient,
            attempt = job.attempts,
            "email delivered (log mailer)"
        );
        Ok(())
    }
}
