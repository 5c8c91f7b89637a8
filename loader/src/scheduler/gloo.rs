use std::time::Duration;

use gloo_timers::callback::Timeout;

use super::{Action, Scheduler};

/// Browser `setTimeout` scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooScheduler;

impl Scheduler for GlooScheduler {
    type Token = Timeout;

    fn schedule(&self, delay: Duration, action: Action) -> Timeout {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, action)
    }

    fn cancel(&self, token: Timeout) {
        token.cancel();
    }
}
