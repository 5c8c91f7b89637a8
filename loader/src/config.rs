use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Quiet period used when none is configured.
pub const DEFAULT_DEBOUNCE_TIME_MS: u64 = 1000;

/// [`DEFAULT_DEBOUNCE_TIME_MS`] as a [`Duration`].
pub const DEFAULT_DEBOUNCE_TIME: Duration = Duration::from_millis(DEFAULT_DEBOUNCE_TIME_MS);

pub(crate) type FinishCallback<T> = Rc<RefCell<dyn FnMut(&T)>>;

/// Options a loader is built from.
///
/// They are consumed by the loader on construction; changing them afterwards
/// means building a new loader.
pub struct LoaderOptions<T> {
    pub(crate) debounce_time: Duration,
    pub(crate) initial_value: Option<T>,
    pub(crate) on_finish: Option<FinishCallback<T>>,
}

impl<T> Default for LoaderOptions<T> {
    fn default() -> Self {
        Self {
            debounce_time: DEFAULT_DEBOUNCE_TIME,
            initial_value: None,
            on_finish: None,
        }
    }
}

impl<T> LoaderOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long the value has to stay unchanged before the loader settles.
    ///
    /// A zero duration settles on the next scheduler tick.
    pub fn debounce_time(mut self, debounce_time: Duration) -> Self {
        self.debounce_time = debounce_time;
        self
    }

    /// Value exposed before anything is reported.
    pub fn initial_value(mut self, value: T) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Called with the settled value, once per settle, before loading clears.
    pub fn on_finish<F>(mut self, on_finish: F) -> Self
    where
        F: FnMut(&T) + 'static,
    {
        self.on_finish = Some(Rc::new(RefCell::new(on_finish)));
        self
    }
}

impl<T: fmt::Debug> fmt::Debug for LoaderOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("debounce_time", &self.debounce_time)
            .field("initial_value", &self.initial_value)
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// Serializable timing configuration, e.g. a section of an app config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub debounce_time_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            debounce_time_ms: DEFAULT_DEBOUNCE_TIME_MS,
        }
    }
}

impl LoaderConfig {
    pub fn debounce_time(&self) -> Duration {
        Duration::from_millis(self.debounce_time_ms)
    }
}

impl<T> From<LoaderConfig> for LoaderOptions<T> {
    fn from(config: LoaderConfig) -> Self {
        LoaderOptions::new().debounce_time(config.debounce_time())
    }
}
