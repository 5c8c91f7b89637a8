use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use debounce_loader::{DebounceLoader, LoaderOptions, LoaderState, ManualScheduler};
use egui::Color32;
use log::debug;

/// Frame-independent state of the demo.
///
/// Both loaders run on one [`ManualScheduler`] that the UI advances to the
/// frame time, so the whole model can be driven from tests without egui.
pub struct SearchModel {
    clock: ManualScheduler,
    query: DebounceLoader<String, ManualScheduler>,
    background: DebounceLoader<Color32, ManualScheduler>,
    settled_searches: Rc<RefCell<Vec<String>>>,
    applied_background: Rc<Cell<Color32>>,
}

impl SearchModel {
    pub const BACKGROUND_DEBOUNCE: Duration = Duration::from_millis(350);
    pub const MAX_HISTORY: usize = 20;

    pub fn new(search_debounce: Duration) -> Self {
        let clock = ManualScheduler::new();

        let settled_searches = Rc::new(RefCell::new(Vec::new()));
        let query = {
            let settled_searches = settled_searches.clone();
            DebounceLoader::new(
                LoaderOptions::new()
                    .debounce_time(search_debounce)
                    .initial_value(String::new())
                    .on_finish(move |query: &String| {
                        let query = query.trim();
                        if query.is_empty() {
                            return;
                        }
                        debug!("search settled: {query:?}");
                        let mut history = settled_searches.borrow_mut();
                        history.insert(0, query.to_owned());
                        history.truncate(Self::MAX_HISTORY);
                    }),
                clock.clone(),
            )
        };

        let applied_background = Rc::new(Cell::new(Color32::TRANSPARENT));
        let background = {
            let applied_background = applied_background.clone();
            DebounceLoader::new(
                LoaderOptions::new()
                    .debounce_time(Self::BACKGROUND_DEBOUNCE)
                    .initial_value(Color32::TRANSPARENT)
                    .on_finish(move |color: &Color32| applied_background.set(*color)),
                clock.clone(),
            )
        };

        Self {
            clock,
            query,
            background,
            settled_searches,
            applied_background,
        }
    }

    /// Calls `wakeup` whenever either loader changes.
    pub fn on_change<F>(&self, wakeup: F)
    where
        F: Fn() + Clone + 'static,
    {
        let other = wakeup.clone();
        self.query.subscribe(move |_| wakeup());
        self.background.subscribe(move |_| other());
    }

    pub fn edit_query(&self, text: String) {
        self.query.report(text);
    }

    pub fn pick_background(&self, color: Color32) {
        self.background.report(color);
    }

    /// Advances the clock to the frame time and runs due settles.
    pub fn tick(&self, now: Duration) -> usize {
        self.clock.advance_to(now)
    }

    /// How long until the next settle is due, for scheduling a repaint.
    pub fn next_wake(&self) -> Option<Duration> {
        self.clock
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.clock.now()))
    }

    pub fn query_state(&self) -> LoaderState<String> {
        self.query.state()
    }

    pub fn is_searching(&self) -> bool {
        self.query.is_loading()
    }

    pub fn background_pending(&self) -> bool {
        self.background.is_loading()
    }

    /// Settled queries, newest first.
    pub fn settled_searches(&self) -> Vec<String> {
        self.settled_searches.borrow().clone()
    }

    pub fn applied_background(&self) -> Color32 {
        self.applied_background.get()
    }
}
