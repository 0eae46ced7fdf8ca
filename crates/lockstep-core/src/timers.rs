//! Virtual clock. Timers never fire on their own: the host advances time explicitly, so a
//! run with asynchronous tests is fully deterministic.

use crate::errors::HarnessError;
use crate::harness::Harness;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(u64);

impl TimerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

pub(crate) enum TimerAction {
    Callback(Box<dyn FnOnce(&mut Harness)>),
    SuspensionTimeout(u64),
}

pub(crate) struct ScheduledTimer {
    id: TimerId,
    due_at: u64,
    order: u64,
    action: TimerAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: u64,
    pub order: u64,
    /// True for the timeout armed by `block`.
    pub suspension: bool,
}

#[derive(Default)]
pub(crate) struct TimerQueue {
    now_ms: u64,
    next_id: u64,
    next_order: u64,
    tasks: Vec<ScheduledTimer>,
}

impl TimerQueue {
    pub(crate) fn schedule(&mut self, delay_ms: u64, action: TimerAction) -> TimerId {
        self.next_id += 1;
        self.next_order += 1;
        let id = TimerId(self.next_id);
        self.tasks.push(ScheduledTimer {
            id,
            due_at: self.now_ms.saturating_add(delay_ms),
            order: self.next_order,
            action,
        });
        id
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    fn next_index(&self, due_limit: Option<u64>) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.map_or(true, |limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    fn pop_next(&mut self, due_limit: Option<u64>) -> Option<ScheduledTimer> {
        self.next_index(due_limit).map(|idx| self.tasks.remove(idx))
    }

    fn pending(&self) -> Vec<PendingTimer> {
        let mut timers: Vec<PendingTimer> = self
            .tasks
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                suspension: matches!(task.action, TimerAction::SuspensionTimeout(_)),
            })
            .collect();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }
}

impl Harness {
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms
    }

    /// Run `callback` once the virtual clock reaches `now + delay_ms`.
    pub fn set_timeout<F>(&mut self, delay_ms: u64, callback: F) -> TimerId
    where
        F: FnOnce(&mut Harness) + 'static,
    {
        let id = self
            .timers
            .schedule(delay_ms, TimerAction::Callback(Box::new(callback)));
        debug!(timer = id.0, delay_ms, now_ms = self.timers.now_ms, "timer scheduled");
        id
    }

    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Pending timers in firing order.
    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.timers.pending()
    }

    /// Move the clock forward and run every timer that is now due.
    pub fn advance_time(&mut self, delta_ms: u64) -> Result<usize, HarnessError> {
        let from = self.timers.now_ms;
        self.timers.now_ms = from.saturating_add(delta_ms);
        let ran = self.run_timer_queue(Some(self.timers.now_ms), false)?;
        debug!(delta_ms, from, to = self.timers.now_ms, ran, "time advanced");
        Ok(ran)
    }

    /// Jump to the next timer and run it. Returns false when none is pending.
    pub fn run_next_timer(&mut self) -> bool {
        let Some(task) = self.timers.pop_next(None) else {
            return false;
        };
        if task.due_at > self.timers.now_ms {
            self.timers.now_ms = task.due_at;
        }
        self.execute_timer(task);
        true
    }

    /// Run timers in due order, advancing the clock, until none remain.
    pub fn flush(&mut self) -> Result<usize, HarnessError> {
        let from = self.timers.now_ms;
        let ran = self.run_timer_queue(None, true)?;
        debug!(from, to = self.timers.now_ms, ran, "timers flushed");
        Ok(ran)
    }

    /// Only timers that run back to back without the synchronization queue taking a step
    /// count toward `timer_step_limit`; queue progress resets the count.
    fn run_timer_queue(
        &mut self,
        due_limit: Option<u64>,
        advance_clock: bool,
    ) -> Result<usize, HarnessError> {
        let limit = self.config.timer_step_limit;
        let mut ran = 0usize;
        let mut idle_steps = 0usize;
        let mut progress = self.queue.steps_run();
        while let Some(task) = self.timers.pop_next(due_limit) {
            idle_steps += 1;
            if idle_steps > limit {
                let pending = self.timers.tasks.len() + 1;
                // put it back so the caller can inspect the queue
                self.timers.tasks.push(task);
                return Err(HarnessError::TimerStepLimit {
                    limit,
                    now_ms: self.timers.now_ms,
                    pending,
                });
            }
            if advance_clock && task.due_at > self.timers.now_ms {
                self.timers.now_ms = task.due_at;
            }
            self.execute_timer(task);
            ran += 1;
            if self.queue.steps_run() != progress {
                progress = self.queue.steps_run();
                idle_steps = 0;
            }
        }
        Ok(ran)
    }

    fn execute_timer(&mut self, task: ScheduledTimer) {
        debug!(timer = task.id.0, due_at = task.due_at, now_ms = self.timers.now_ms, "timer fired");
        match task.action {
            TimerAction::Callback(callback) => callback(self),
            TimerAction::SuspensionTimeout(token) => self.suspension_timed_out(token),
        }
    }
}
