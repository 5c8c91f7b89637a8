//! The timer port a loader uses to arm and cancel its settle action.
//!
//! A loader never talks to a global timer. It is handed a [`Scheduler`] at
//! construction time, which lets the same loader run on a tokio runtime, in
//! the browser, or against a simulated clock in tests and frame loops.

use std::time::Duration;

mod manual;
#[cfg(not(target_arch = "wasm32"))]
mod tokio_local;

#[cfg(target_arch = "wasm32")]
mod gloo;

pub use manual::{ManualScheduler, TimerId};
#[cfg(not(target_arch = "wasm32"))]
pub use tokio_local::TokioScheduler;

#[cfg(target_arch = "wasm32")]
pub use gloo::GlooScheduler;

/// A delayed action. Actions run on the thread that drives the scheduler.
pub type Action = Box<dyn FnOnce() + 'static>;

/// Schedules one-shot delayed actions and cancels them again.
///
/// `schedule` must never run `action` before returning; the action only ever
/// runs when the underlying clock or event loop gets to it.
pub trait Scheduler {
    /// Handle identifying one scheduled action.
    type Token: 'static;

    /// Runs `action` once `delay` has elapsed.
    ///
    /// A zero delay runs the action on the next tick of the scheduler.
    fn schedule(&self, delay: Duration, action: Action) -> Self::Token;

    /// Cancels a scheduled action. Cancelling an action that already ran is a no-op.
    fn cancel(&self, token: Self::Token);
}
