//! The email queue handle and its processing loop.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use super::config::QueueConfig;
use super::job::{EmailJob, EmailKind, EmailStatus, JobId};
use super::mailer::{DeliveryError, Mailer};
use super::store::JobStore;

/// Snapshot of the queue returned by `EmailQueue::status`.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub sent: usize,
    pub failed: usize,
    pub jobs: Vec<JobSummary>,
}

/// Per-job view without the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub kind: EmailKind,
    pub recipient: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub status: EmailStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl From<&EmailJob> for JobSummary {
    fn from(job: &EmailJob) -> Self {
        Self {
            id: job.id,
            kind: job.kind,
            recipient: job.recipient.clone(),
            attempts: job.attempts,
            max_attempts: job.max_attempts,
            status: job.status,
            error: job.error.clone(),
            created_at: job.created_at,
            last_attempt_at: job.last_attempt_at,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    store: JobStore,
    /// A processing loop owns the store's pending jobs. Only flipped while
    /// the state lock is held, so `add` and loop exit cannot interleave.
    running: bool,
}

struct Inner {
    state: Mutex<State>,
    idle: Notify,
    mailer: Arc<dyn Mailer>,
    config: QueueConfig,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory email queue with bounded retries.
///
/// Cheap to clone; clones share the same store and worker. Construct one in
/// the composition root and hand clones to whatever sends mail.
#[derive(Clone)]
pub struct EmailQueue {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for EmailQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailQueue")
            .field("config", &self.inner.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl EmailQueue {
    pub fn new(mailer: Arc<dyn Mailer>, config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                idle: Notify::new(),
                mailer,
                config,
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Enqueue an email and return its id without waiting for delivery.
    ///
    /// `max_attempts` defaults to the configured limit; zero is treated as
    /// one. Starts the processing loop if it is idle. Called outside a Tokio
    /// runtime, the job stays pending until the next `add` from inside one.
    pub fn add(
        &self,
        kind: EmailKind,
        recipient: impl Into<String>,
        data: serde_json::Value,
        max_attempts: Option<u32>,
    ) -> JobId {
        let max_attempts = max_attempts
            .unwrap_or(self.inner.config.default_max_attempts)
            .max(1);
        let job = EmailJob::new(kind, recipient, data, max_attempts);
        let id = job.id;

        let mut state = self.inner.lock();
        state.store.insert(job);
        debug!(job_id = %id, kind = %kind, max_attempts, "email job queued");

        if !state.running {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    state.running = true;
                    handle.spawn(process_loop(Arc::clone(&self.inner)));
                }
                Err(e) => {
                    warn!(job_id = %id, error = %e, "no runtime to start email queue loop");
                }
            }
        }

        id
    }

    /// Counts per status plus a summary of every stored job.
    pub fn status(&self) -> QueueStatus {
        let state = self.inner.lock();
        let counts = state.store.counts();
        QueueStatus {
            total: counts.total(),
            pending: counts.pending,
            processing: counts.processing,
            sent: counts.sent,
            failed: counts.failed,
            jobs: state.store.iter().map(JobSummary::from).collect(),
        }
    }

    pub fn job(&self, id: &JobId) -> Option<JobSummary> {
        self.inner.lock().store.get(id).map(JobSummary::from)
    }

    /// Drop every `sent` job. Pending, processing and failed jobs stay.
    pub fn cleanup(&self) -> usize {
        let removed = self.inner.lock().store.remove_by_status(EmailStatus::Sent);
        if removed > 0 {
            info!(removed, "removed sent email jobs");
        }
        removed
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Resolves once no processing loop is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }
}

/// Releases the loop's claim on the queue if its task is dropped mid-sweep
/// (runtime shutdown, abort). An attempt cut short counts as a failure, so
/// the job is retried by the next loop or ends `failed` when exhausted.
struct LoopGuard {
    inner: Arc<Inner>,
    armed: bool,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut state = self.inner.lock();
        state.running = false;
        let mut interrupted = 0;
        for job in state
            .store
            .iter_mut()
            .filter(|j| j.status == EmailStatus::Processing)
        {
            job.mark_failed("delivery interrupted");
            interrupted += 1;
        }
        drop(state);

        self.inner.idle.notify_waiters();
        warn!(interrupted, "email queue loop dropped before going idle");
    }
}

async fn process_loop(inner: Arc<Inner>) {
    debug!("email queue loop started");
    let mut guard = LoopGuard {
        inner: Arc::clone(&inner),
        armed: true,
    };

    loop {
        let sweep = {
            let mut state = inner.lock();
            let ids = state.store.pending_ids();
            if ids.is_empty() {
                // Cleared under the same lock `add` checks, so a job queued
                // after this point starts a fresh loop.
                state.running = false;
                guard.armed = false;
                drop(state);
                inner.idle.notify_waiters();
                debug!("email queue loop idle");
                return;
            }
            ids
        };

        debug!(jobs = sweep.len(), "email queue sweep");

        for id in sweep {
            let job = {
                let mut state = inner.lock();
                match state.store.get_mut(&id) {
                    Some(job) if job.status == EmailStatus::Pending => {
                        job.mark_processing();
                        job.clone()
                    }
                    _ => continue,
                }
            };

            let outcome = deliver(&inner.mailer, job).await;

            let retry = {
                let mut state = inner.lock();
                record_outcome(&mut state.store, &id, outcome, inner.config.retain_sent)
            };

            if retry {
                tokio::time::sleep(inner.config.retry_delay).await;
            }
            tokio::time::sleep(inner.config.send_interval).await;
        }
    }
}

/// Run one attempt on its own task so a panicking mailer fails the attempt
/// instead of killing the loop.
async fn deliver(mailer: &Arc<dyn Mailer>, job: EmailJob) -> Result<(), DeliveryError> {
    let mailer = Arc::clone(mailer);
    match tokio::spawn(async move { mailer.deliver(&job).await }).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(DeliveryError::Panicked(panic_message(e.into_panic()))),
        Err(e) => Err(DeliveryError::transient(e.to_string())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Apply an attempt's outcome. Returns true when the job went back to
/// pending and the loop should wait out the retry delay.
fn record_outcome(
    store: &mut JobStore,
    id: &JobId,
    outcome: Result<(), DeliveryError>,
    retain_sent: bool,
) -> bool {
    let Some(job) = store.get_mut(id) else {
        return false;
    };

    match outcome {
        Ok(()) => {
            job.mark_sent();
            info!(
                job_id = %id,
                kind = %job.kind,
                attempts = job.attempts,
                "email sent"
            );
            if !retain_sent {
                store.remove(id);
            }
            false
        }
        Err(e) => match job.mark_failed(e.to_string()) {
            EmailStatus::Pending => {
                warn!(
                    job_id = %id,
                    attempt = job.attempts,
                    max_attempts = job.max_attempts,
                    error = %e,
                    "email attempt failed; will retry"
                );
                true
            }
            _ => {
                error!(
                    job_id = %id,
                    kind = %job.kind,
                    recipient = %job.recipient,
                    attempts = job.attempts,
                    error = %e,
                    "email failed permanently"
                );
                false
            }
        },
    }
}
