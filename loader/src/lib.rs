//! Debounced loading state for interactive front-end components.
//!
//! A [`DebounceLoader`] tracks a value that changes rapidly, such as the text
//! of a search box, and exposes a loading flag that only clears once the value
//! has stopped changing for a quiet period. An optional `on_finish` callback
//! receives each settled value exactly once.
//!
//! Timers come from an injected [`Scheduler`]: [`ManualScheduler`] for tests
//! and frame-driven UIs, [`TokioScheduler`] on a tokio runtime, and
//! `GlooScheduler` in the browser.
#![warn(clippy::all, rust_2018_idioms)]

mod config;
mod error;
mod loader;
pub mod scheduler;

pub use config::{LoaderConfig, LoaderOptions, DEFAULT_DEBOUNCE_TIME, DEFAULT_DEBOUNCE_TIME_MS};
pub use error::{Error, Result};
pub use loader::{create, DebounceLoader, LoaderState, Phase, Reporter, SubscriptionId};
pub use scheduler::{ManualScheduler, Scheduler};

#[cfg(not(target_arch = "wasm32"))]
pub use scheduler::TokioScheduler;

#[cfg(target_arch = "wasm32")]
pub use scheduler::GlooScheduler;
