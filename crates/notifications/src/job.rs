//! Email job types and the per-job state machine.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use incentive_core::DomainError;

/// Unique email job identifier.
///
/// UUIDv7, so ids sort in creation order and two jobs created in the same
/// millisecond for the same recipient still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s)
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("JobId: {e}")))
    }
}

/// What kind of email a job sends. Delivery picks its template from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    MagicLink,
    Invite,
    Welcome,
    Approval,
    Other,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::MagicLink => "magic_link",
            EmailKind::Invite => "invite",
            EmailKind::Welcome => "welcome",
            EmailKind::Approval => "approval",
            EmailKind::Other => "other",
        }
    }

    /// Template name used by the mail provider for this kind.
    pub fn template(&self) -> &'static str {
        match self {
            EmailKind::MagicLink => "auth/magic-link",
            EmailKind::Invite => "users/invite",
            EmailKind::Welcome => "users/welcome",
            EmailKind::Approval => "deals/approval",
            EmailKind::Other => "generic",
        }
    }
}

impl std::fmt::Display for EmailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job status.
///
/// `pending -> processing -> {sent | pending | failed}`; `sent` and `failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    /// Waiting for the next sweep.
    Pending,
    /// Handed to the mailer, attempt in flight.
    Processing,
    /// Delivered.
    Sent,
    /// Attempts exhausted.
    Failed,
}

impl EmailStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EmailStatus::Sent | EmailStatus::Failed)
    }
}

/// One unit of outbound email work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJob {
    pub id: JobId,
    pub kind: EmailKind,
    /// Destination address; the queue does not validate it.
    pub recipient: String,
    /// Opaque payload handed to the mailer.
    pub data: serde_json::Value,
    pub attempts: u32,
    pub max_attempts: u32,
    pub status: EmailStatus,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Last failure message; only set after a failed attempt.
    pub error: Option<String>,
}

impl EmailJob {
    /// Create a pending job.
    pub fn new(
        kind: EmailKind,
        recipient: impl Into<String>,
        data: serde_json::Value,
        max_attempts: u32,
    ) -> Self {
        Self {
            id: JobId::new(),
            kind,
            recipient: recipient.into(),
            data,
            attempts: 0,
            max_attempts,
            status: EmailStatus::Pending,
            created_at: Utc::now(),
            last_attempt_at: None,
            error: None,
        }
    }

    /// Whether another attempt is allowed after the current count.
    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Start an attempt: `pending -> processing`.
    pub fn mark_processing(&mut self) {
        self.status = EmailStatus::Processing;
        self.attempts += 1;
        self.last_attempt_at = Some(Utc::now());
    }

    /// `processing -> sent`.
    pub fn mark_sent(&mut self) {
        self.status = EmailStatus::Sent;
    }

    /// Record a failed attempt: back to `pending` while attempts remain,
    /// otherwise `failed`. Returns the resulting status.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> EmailStatus {
        self.error = Some(error.into());
        self.status = if self.has_attempts_left() {
            EmailStatus::Pending
        } else {
            EmailStatus::Failed
        };
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(max_attempts: u32) -> EmailJob {
        EmailJob::new(
            EmailKind::Welcome,
            "a@x.com",
            serde_json::json!({"name": "Ada"}),
            max_attempts,
        )
    }

    #[test]
    fn new_job_is_pending_without_attempts() {
        let job = job(3);
        assert_eq!(job.status, EmailStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert!(job.last_attempt_at.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn failure_returns_to_pending_until_exhausted() {
        let mut job = job(2);

        job.mark_processing();
        assert_eq!(job.status, EmailStatus::Processing);
        assert_eq!(job.mark_failed("smtp timeout"), EmailStatus::Pending);
        assert_eq!(job.attempts, 1);

        job.mark_processing();
        assert_eq!(job.mark_failed("smtp timeout again"), EmailStatus::Failed);
        assert_eq!(job.attempts, 2);
        assert_eq!(job.error.as_deref(), Some("smtp timeout again"));
        assert!(job.status.is_terminal());
    }

    #[test]
    fn success_is_terminal() {
        let mut job = job(3);
        job.mark_processing();
        job.mark_sent();
        assert!(job.status.is_terminal());
        assert!(job.last_attempt_at.is_some());
        assert!(job.error.is_none());
    }

    #[test]
    fn kind_and_status_use_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_value(EmailKind::MagicLink).unwrap(),
            serde_json::json!("magic_link")
        );
        assert_eq!(
            serde_json::to_value(EmailStatus::Processing).unwrap(),
            serde_json::json!("processing")
        );
        let kind: EmailKind = serde_json::from_value(serde_json::json!("approval")).unwrap();
        assert_eq!(kind, EmailKind::Approval);
    }

    #[test]
    fn ids_are_distinct_for_identical_jobs() {
        let a = job(3);
        let b = job(3);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn job_id_parses_from_its_display_form() {
        let id = JobId::new();
        assert_eq!(id.to_string().parse::<JobId>().unwrap(), id);
        assert!(matches!(
            "not-a-uuid".parse::<JobId>(),
            Err(DomainError::InvalidId(_))
        ));
    }
}
