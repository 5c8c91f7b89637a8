use thiserror::Error;

/// Errors raised while wiring a loader to its timer facility.
///
/// Reporting and settling never fail; only setting up a scheduler can.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no tokio runtime available to drive debounce timers")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, Error>;
