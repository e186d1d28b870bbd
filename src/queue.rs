//! `JobQueue`: a bounded FIFO holding pending jobs, with non-blocking
//! admission and blocking consumption for workers.

use tokio::sync::mpsc;

use crate::types::Job;

/// Bounded FIFO of capacity `max_queued_jobs`. `offer` never blocks;
/// `take` is only ever called by workers and blocks until a job is
/// available or the queue is closed.
pub(crate) struct JobQueue {
    sender: mpsc::Sender<Job>,
}

/// The consuming half, shared by the fixed worker pool.
pub(crate) type JobQueueReceiver = mpsc::Receiver<Job>;

impl JobQueue {
    /// Create a queue with the given capacity, returning the admission
    /// handle and the receiver workers will drain from.
    pub fn new(capacity: usize) -> (Self, JobQueueReceiver) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Non-blocking admission attempt. Returns `false` if the queue is at
    /// capacity (the caller must surface this as `QueueFull`).
    pub fn offer(&self, job: Job) -> bool {
        self.sender.try_send(job).is_ok()
    }
}
