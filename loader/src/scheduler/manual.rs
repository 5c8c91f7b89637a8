use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use log::trace;

use super::{Action, Scheduler};

/// Identifies an action scheduled on a [`ManualScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    deadline: Duration,
    seq: u64,
}

impl TimerId {
    /// Clock time at which the action becomes due.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_seq: u64,
    timers: BTreeMap<TimerId, Action>,
}

/// A simulated clock that only moves when told to.
///
/// Time starts at zero. Nothing fires until [`advance`](Self::advance),
/// [`advance_to`](Self::advance_to) or [`run_pending`](Self::run_pending) is
/// called; due actions then run in deadline order (ties in the order they were
/// scheduled) with the clock set to their deadline. Actions scheduled while the
/// clock is advancing fire in the same call if they fall due before the target.
///
/// Clones share the same clock, so a test (or a UI frame loop feeding in the
/// frame time) can keep one handle while the loader owns another.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Rc<RefCell<Clock>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock time.
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    /// Number of actions waiting to fire.
    pub fn pending(&self) -> usize {
        self.clock.borrow().timers.len()
    }

    /// Deadline of the earliest pending action.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.clock
            .borrow()
            .timers
            .first_key_value()
            .map(|(id, _)| id.deadline)
    }

    /// Moves the clock forward by `by`, running everything that falls due.
    ///
    /// Returns the number of actions that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Moves the clock to `target`, running everything due at or before it.
    ///
    /// The clock never goes backwards: a `target` in the past only runs the
    /// actions that are already due.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        loop {
            let action = {
                let mut clock = self.clock.borrow_mut();
                let due = match clock.timers.first_key_value() {
                    Some((id, _)) if id.deadline <= target => *id,
                    _ => break,
                };
                clock.now = clock.now.max(due.deadline);
                clock.timers.remove(&due)
            };
            // The clock is released here so the action can schedule or cancel.
            if let Some(action) = action {
                action();
                fired += 1;
            }
        }

        let mut clock = self.clock.borrow_mut();
        clock.now = clock.now.max(target);
        if fired > 0 {
            trace!("manual clock at {:?}, {} action(s) ran", clock.now, fired);
        }
        fired
    }

    /// Runs whatever is due right now, including zero-delay actions.
    pub fn run_pending(&self) -> usize {
        self.advance_to(self.now())
    }
}

impl Scheduler for ManualScheduler {
    type Token = TimerId;

    fn schedule(&self, delay: Duration, action: Action) -> TimerId {
        let mut clock = self.clock.borrow_mut();
        let id = TimerId {
            deadline: clock.now.saturating_add(delay),
            seq: clock.next_seq,
        };
        clock.next_seq += 1;
        clock.timers.insert(id, action);
        id
    }

    fn cancel(&self, token: TimerId) {
        self.clock.borrow_mut().timers.remove(&token);
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.clock.borrow();
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("pending", &clock.timers.len())
            .finish()
    }
}
