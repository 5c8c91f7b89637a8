use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{debug, trace};

use crate::config::{FinishCallback, LoaderOptions};
use crate::scheduler::Scheduler;

/// What a loader currently exposes to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderState<T> {
    pub is_loading: bool,
    /// Most recently reported value, or the initial value before any report.
    pub value: Option<T>,
}

impl<T> LoaderState<T> {
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Pending
        } else {
            Phase::Idle
        }
    }
}

/// The two states a loader moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing reported since the last settle; no timer is armed.
    Idle,
    /// A report is waiting for the quiet period to elapse.
    Pending,
}

/// Handle returned by [`DebounceLoader::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Rc<RefCell<dyn FnMut(&LoaderState<T>)>>;

struct Slot<T> {
    is_loading: bool,
    value: Option<T>,
    /// Bumped on every report; a settle only applies to the report that armed it.
    generation: u64,
}

struct Inner<T, S: Scheduler> {
    scheduler: S,
    debounce_time: Duration,
    on_finish: Option<FinishCallback<T>>,
    slot: RefCell<Slot<T>>,
    timer: RefCell<Option<S::Token>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<T>)>>,
    next_subscription: Cell<u64>,
    /// Bumped by every notification pass, so an outer pass can tell it was overtaken.
    notifications: Cell<u64>,
}

impl<T: Clone + 'static, S: Scheduler + 'static> Inner<T, S> {
    fn report(self: &Rc<Self>, value: T) {
        let generation = {
            let mut slot = self.slot.borrow_mut();
            slot.value = Some(value);
            slot.is_loading = true;
            slot.generation += 1;
            slot.generation
        };

        let superseded = self.timer.borrow_mut().take();
        if let Some(token) = superseded {
            trace!("report #{generation} supersedes the pending settle");
            self.scheduler.cancel(token);
        }

        let weak = Rc::downgrade(self);
        let token = self.scheduler.schedule(
            self.debounce_time,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.settle(generation);
                }
            }),
        );
        *self.timer.borrow_mut() = Some(token);
        trace!(
            "report #{generation} accepted, settling in {:?}",
            self.debounce_time
        );

        self.notify();
    }

    fn settle(self: &Rc<Self>, generation: u64) {
        let value = {
            let slot = self.slot.borrow();
            if slot.generation != generation || !slot.is_loading {
                trace!("ignoring stale settle for report #{generation}");
                return;
            }
            slot.value.clone()
        };
        // Fired; nothing left to cancel.
        drop(self.timer.borrow_mut().take());

        // No borrows are held while the callback runs, so it may report again.
        if let (Some(on_finish), Some(value)) = (&self.on_finish, &value) {
            (&mut *on_finish.borrow_mut())(value);
        }

        let settled = {
            let mut slot = self.slot.borrow_mut();
            if slot.generation == generation {
                slot.is_loading = false;
                true
            } else {
                false
            }
        };
        if settled {
            debug!("report #{generation} settled");
            self.notify();
        } else {
            debug!("report #{generation} finished, but a newer report is pending");
        }
    }

    fn snapshot(&self) -> LoaderState<T> {
        let slot = self.slot.borrow();
        LoaderState {
            is_loading: slot.is_loading,
            value: slot.value.clone(),
        }
    }

    fn notify(&self) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        if listeners.is_empty() {
            return;
        }

        let pass = self.notifications.get() + 1;
        self.notifications.set(pass);

        let state = self.snapshot();
        for listener in listeners {
            // A listener that triggered this notification is skipped rather than re-entered.
            if let Ok(mut listener) = listener.try_borrow_mut() {
                (&mut *listener)(&state);
            }
            // A listener reported and a nested pass already delivered the newer state.
            if self.notifications.get() != pass {
                trace!("notification pass #{pass} superseded");
                break;
            }
        }
    }
}

impl<T, S: Scheduler> Drop for Inner<T, S> {
    fn drop(&mut self) {
        if let Some(token) = self.timer.get_mut().take() {
            trace!("loader dropped while pending, cancelling its settle");
            self.scheduler.cancel(token);
        }
    }
}

/// Tracks a rapidly changing value and a loading flag that clears once the
/// value has stayed put for the debounce time.
///
/// Every [`report`](Self::report) updates the value immediately, marks the
/// loader as loading and restarts the quiet period. When the period elapses
/// without another report, the `on_finish` callback (if any) receives the
/// current value and loading clears. Only the latest report can settle.
///
/// The loader owns its state and timer. Dropping it cancels a pending settle,
/// so the callback never runs for a loader that is gone; [`Reporter`] handles
/// handed out to widgets do not keep it alive.
///
/// ```
/// use std::time::Duration;
/// use debounce_loader::{DebounceLoader, LoaderOptions, ManualScheduler};
///
/// let clock = ManualScheduler::new();
/// let loader = DebounceLoader::new(LoaderOptions::new(), clock.clone());
///
/// loader.report("Hello");
/// assert!(loader.is_loading());
///
/// clock.advance(Duration::from_millis(1000));
/// assert!(!loader.is_loading());
/// assert_eq!(loader.state().value, Some("Hello"));
/// ```
pub struct DebounceLoader<T, S: Scheduler> {
    inner: Rc<Inner<T, S>>,
}

impl<T: Clone + 'static, S: Scheduler + 'static> DebounceLoader<T, S> {
    pub fn new(options: LoaderOptions<T>, scheduler: S) -> Self {
        let LoaderOptions {
            debounce_time,
            initial_value,
            on_finish,
        } = options;

        Self {
            inner: Rc::new(Inner {
                scheduler,
                debounce_time,
                on_finish,
                slot: RefCell::new(Slot {
                    is_loading: false,
                    value: initial_value,
                    generation: 0,
                }),
                timer: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
                notifications: Cell::new(0),
            }),
        }
    }

    /// Records a new value and restarts the quiet period.
    pub fn report(&self, value: T) {
        self.inner.report(value);
    }

    /// A cloneable report function that does not keep the loader alive.
    pub fn reporter(&self) -> Reporter<T, S> {
        Reporter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn state(&self) -> LoaderState<T> {
        self.inner.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.slot.borrow().is_loading
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading() {
            Phase::Pending
        } else {
            Phase::Idle
        }
    }

    /// Borrows the current value without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` reports to this loader, since the value is borrowed while
    /// `f` runs. Use [`state`](Self::state) when the value has to outlive the call.
    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.inner.slot.borrow().value.as_ref())
    }

    pub fn debounce_time(&self) -> Duration {
        self.inner.debounce_time
    }

    /// Calls `listener` with a fresh snapshot after every report and settle.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&LoaderState<T>) + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.0 + 1);
        let listener: Listener<T> = Rc::new(RefCell::new(listener));
        self.inner.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(subscription, _)| *subscription != id);
        listeners.len() != before
    }
}

impl<T: fmt::Debug, S: Scheduler> fmt::Debug for DebounceLoader<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.inner.slot.borrow();
        f.debug_struct("DebounceLoader")
            .field("is_loading", &slot.is_loading)
            .field("value", &slot.value)
            .field("debounce_time", &self.inner.debounce_time)
            .finish()
    }
}

/// Report half of a loader, for handing to widgets and callbacks.
///
/// Once the owning [`DebounceLoader`] is dropped, reports are discarded.
pub struct Reporter<T, S: Scheduler> {
    inner: Weak<Inner<T, S>>,
}

impl<T: Clone + 'static, S: Scheduler + 'static> Reporter<T, S> {
    pub fn report(&self, value: T) {
        match self.inner.upgrade() {
            Some(inner) => inner.report(value),
            None => trace!("report after the loader was dropped, ignoring"),
        }
    }

    /// Whether the owning loader is still alive.
    pub fn is_attached(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T, S: Scheduler> Clone for Reporter<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, S: Scheduler> fmt::Debug for Reporter<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("attached", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Builds a loader and returns its report function alongside it.
pub fn create<T, S>(options: LoaderOptions<T>, scheduler: S) -> (Reporter<T, S>, DebounceLoader<T, S>)
where
    T: Clone + 'static,
    S: Scheduler + 'static,
{
    let loader = DebounceLoader::new(options, scheduler);
    (loader.reporter(), loader)
}
