//! The synchronization queue: deferred steps run strictly in enqueue order, and a test can
//! suspend draining until it resumes or the timeout fires.

use crate::errors::HarnessError;
use crate::harness::Harness;
use crate::timers::{TimerAction, TimerId};
use std::collections::VecDeque;
use tracing::{debug, warn};

pub(crate) type QueueEntry = Box<dyn FnOnce(&mut Harness)>;

/// Proof of an outstanding [`Harness::block`]. Hand it back to [`Harness::unblock`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping the token leaves the queue blocked until the timeout fires"]
pub struct SuspensionToken {
    id: u64,
}

impl SuspensionToken {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ActiveSuspension {
    pub(crate) id: u64,
    pub(crate) timer: TimerId,
    pub(crate) allow_failure_on_timeout: bool,
}

#[derive(Default)]
pub(crate) struct SyncQueue {
    entries: VecDeque<QueueEntry>,
    started: bool,
    draining: bool,
    suspension: Option<ActiveSuspension>,
    next_token: u64,
    /// Steps run since the queue was created.
    steps_run: u64,
}

impl SyncQueue {
    pub(crate) fn push(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Blocked before the run starts and while a suspension is outstanding.
    pub(crate) fn is_blocked(&self) -> bool {
        !self.started || self.suspension.is_some()
    }

    pub(crate) fn start(&mut self) {
        self.started = true;
    }

    pub(crate) fn steps_run(&self) -> u64 {
        self.steps_run
    }

    fn pop_ready(&mut self) -> Option<QueueEntry> {
        if self.is_blocked() {
            return None;
        }
        self.entries.pop_front()
    }

    fn next_token_id(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn take_suspension(&mut self, id: u64) -> Option<ActiveSuspension> {
        match self.suspension {
            Some(active) if active.id == id => self.suspension.take(),
            _ => None,
        }
    }
}

impl Harness {
    /// Append a step; runs right away when the queue is not blocked.
    ///
    /// A step enqueued from inside a running step is picked up by the drain loop that is
    /// already active, after everything queued before it.
    pub fn enqueue<F>(&mut self, step: F)
    where
        F: FnOnce(&mut Harness) + 'static,
    {
        self.queue.push(Box::new(step));
        if !self.queue.is_blocked() {
            self.drain();
        }
    }

    /// Run queued steps from the front until the queue is empty or blocked.
    pub fn drain(&mut self) {
        if self.queue.draining {
            return;
        }
        self.queue.draining = true;
        let mut ran = 0usize;
        while let Some(step) = self.queue.pop_ready() {
            step(self);
            ran += 1;
            self.queue.steps_run += 1;
        }
        self.queue.draining = false;
        debug!(
            ran,
            pending = self.queue.len(),
            blocked = self.queue.is_blocked(),
            "queue drained"
        );
    }

    pub fn is_blocked(&self) -> bool {
        self.queue.is_blocked()
    }

    pub fn pending_steps(&self) -> usize {
        self.queue.len()
    }

    /// Suspend draining until the returned token is passed to [`Harness::unblock`].
    ///
    /// Arms a timeout of `async_timeout_ms`. When it fires the queue resumes on its own and,
    /// unless `allow_failure_on_timeout` is set, a `"Test timed out"` failure is recorded.
    /// Only one suspension may be outstanding at a time.
    pub fn block(&mut self, allow_failure_on_timeout: bool) -> Result<SuspensionToken, HarnessError> {
        if let Some(active) = self.queue.suspension {
            return Err(HarnessError::AlreadySuspended { active: active.id });
        }
        let id = self.queue.next_token_id();
        let timer = self.timers.schedule(
            self.config.async_timeout_ms,
            TimerAction::SuspensionTimeout(id),
        );
        self.queue.suspension = Some(ActiveSuspension {
            id,
            timer,
            allow_failure_on_timeout,
        });
        debug!(token = id, timeout_ms = self.config.async_timeout_ms, "queue suspended");
        Ok(SuspensionToken { id })
    }

    /// Cancel the timeout of `token` and resume draining.
    pub fn unblock(&mut self, token: SuspensionToken) -> Result<(), HarnessError> {
        let active = self
            .queue
            .take_suspension(token.id)
            .ok_or(HarnessError::StaleSuspension { token: token.id })?;
        self.timers.cancel(active.timer);
        debug!(token = active.id, "queue resumed");
        self.drain();
        Ok(())
    }

    /// Schedule [`Harness::unblock`] after `delay_ms`. A stale token is logged and ignored.
    pub fn unblock_after(&mut self, token: SuspensionToken, delay_ms: u64) -> TimerId {
        self.set_timeout(delay_ms, move |h| {
            if let Err(e) = h.unblock(token) {
                warn!(error = %e, "deferred unblock ignored");
            }
        })
    }

    pub(crate) fn suspension_timed_out(&mut self, id: u64) {
        let Some(active) = self.queue.take_suspension(id) else {
            return;
        };
        warn!(
            token = id,
            allow_failure = active.allow_failure_on_timeout,
            "suspension timed out"
        );
        if !active.allow_failure_on_timeout {
            self.assertions.record(false, "Test timed out");
        }
        self.drain();
    }
}
