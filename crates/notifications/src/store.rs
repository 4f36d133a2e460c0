//! In-memory job storage.
//!
//! Jobs are kept in insertion order (a sequence number keys the map) with a
//! secondary index by id. Sweeps read the pending ids in that order.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::job::{EmailJob, EmailStatus, JobId};

/// Per-status job counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub sent: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.sent + self.failed
    }
}

/// Ordered job store. Not synchronized; the queue guards it.
#[derive(Debug, Default)]
pub struct JobStore {
    next_seq: u64,
    jobs: BTreeMap<u64, EmailJob>,
    index: HashMap<JobId, u64>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job at the end of the order.
    pub fn insert(&mut self, job: EmailJob) -> JobId {
        let id = job.id;
        if let Some(seq) = self.index.remove(&id) {
            self.jobs.remove(&seq);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(id, seq);
        self.jobs.insert(seq, job);
        id
    }

    pub fn get(&self, id: &JobId) -> Option<&EmailJob> {
        self.index.get(id).and_then(|seq| self.jobs.get(seq))
    }

    pub fn get_mut(&mut self, id: &JobId) -> Option<&mut EmailJob> {
        let seq = self.index.get(id)?;
        self.jobs.get_mut(seq)
    }

    pub fn remove(&mut self, id: &JobId) -> Option<EmailJob> {
        let seq = self.index.remove(id)?;
        self.jobs.remove(&seq)
    }

    /// Ids of pending jobs, in insertion order.
    pub fn pending_ids(&self) -> Vec<JobId> {
        self.jobs
            .values()
            .filter(|j| j.status == EmailStatus::Pending)
            .map(|j| j.id)
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.jobs.values().any(|j| j.status == EmailStatus::Pending)
    }

    /// Remove every job in `status`; returns how many were removed.
    pub fn remove_by_status(&mut self, status: EmailStatus) -> usize {
        let doomed: Vec<(u64, JobId)> = self
            .jobs
            .iter()
            .filter(|(_, j)| j.status == status)
            .map(|(seq, j)| (*seq, j.id))
            .collect();

        for (seq, id) in &doomed {
            self.jobs.remove(seq);
            self.index.remove(id);
        }
        doomed.len()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for job in self.jobs.values() {
            match job.status {
                EmailStatus::Pending => counts.pending += 1,
                EmailStatus::Processing => counts.processing += 1,
                EmailStatus::Sent => counts.sent += 1,
                EmailStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Jobs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EmailJob> {
        self.jobs.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EmailJob> {
        self.jobs.values_mut()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
