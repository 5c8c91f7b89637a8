use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use debounce_loader::{
    create, DebounceLoader, LoaderConfig, LoaderOptions, LoaderState, ManualScheduler, Phase,
    Reporter, DEFAULT_DEBOUNCE_TIME, DEFAULT_DEBOUNCE_TIME_MS,
};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// A loader on a fresh clock, recording every value passed to `on_finish`.
fn recording_loader(
    options: LoaderOptions<String>,
) -> (
    ManualScheduler,
    DebounceLoader<String, ManualScheduler>,
    Rc<RefCell<Vec<String>>>,
) {
    let clock = ManualScheduler::new();
    let finished = Rc::new(RefCell::new(Vec::new()));
    let sink = finished.clone();
    let loader = DebounceLoader::new(
        options.on_finish(move |value: &String| sink.borrow_mut().push(value.clone())),
        clock.clone(),
    );
    (clock, loader, finished)
}

#[test]
fn shows_loading_while_value_is_being_debounced() {
    let clock = ManualScheduler::new();
    let (report, loader) = create(LoaderOptions::new(), clock.clone());

    report.report("Hello".to_string());
    assert_eq!(
        loader.state(),
        LoaderState {
            is_loading: true,
            value: Some("Hello".to_string())
        }
    );

    clock.advance(DEFAULT_DEBOUNCE_TIME / 2);
    assert!(loader.is_loading());
    assert_eq!(loader.state().value.as_deref(), Some("Hello"));

    clock.advance(DEFAULT_DEBOUNCE_TIME / 2);
    assert_eq!(
        loader.state(),
        LoaderState {
            is_loading: false,
            value: Some("Hello".to_string())
        }
    );
}

#[test]
fn value_updates_before_any_time_passes() {
    let clock = ManualScheduler::new();
    let loader = DebounceLoader::new(LoaderOptions::new(), clock.clone());

    for value in [0, -7, i64::MAX] {
        loader.report(value);
        assert_eq!(loader.state().value, Some(value));
        assert_eq!(loader.phase(), Phase::Pending);
    }
    assert_eq!(clock.now(), Duration::ZERO);
}

#[test]
fn never_settles_before_the_deadline() {
    let clock = ManualScheduler::new();
    let loader = DebounceLoader::new(LoaderOptions::new(), clock.clone());

    loader.report('x');
    for _ in 0..DEFAULT_DEBOUNCE_TIME_MS - 1 {
        clock.advance(ms(1));
        assert!(loader.is_loading(), "settled early at {:?}", clock.now());
    }

    clock.advance(ms(1));
    assert!(!loader.is_loading());
}

#[test]
fn new_report_restarts_the_quiet_period() {
    let (clock, loader, finished) = recording_loader(LoaderOptions::new());
    let half = DEFAULT_DEBOUNCE_TIME / 2;

    loader.report("v1".to_string());
    clock.advance(half);
    loader.report("v2".to_string());

    // The first report's deadline passes without settling.
    clock.advance(half);
    assert!(loader.is_loading());
    assert!(finished.borrow().is_empty());

    clock.advance(half);
    assert!(!loader.is_loading());
    assert_eq!(*finished.borrow(), vec!["v2".to_string()]);
}

#[test]
fn fires_finish_callback_once_with_latest_value() {
    let (clock, loader, finished) = recording_loader(LoaderOptions::new());

    loader.report("b".to_string());
    loader.report("ba".to_string());
    loader.report("bar".to_string());
    clock.advance(DEFAULT_DEBOUNCE_TIME);
    assert_eq!(*finished.borrow(), vec!["bar".to_string()]);

    // Nothing else fires later on.
    clock.advance(DEFAULT_DEBOUNCE_TIME * 10);
    assert_eq!(finished.borrow().len(), 1);
}

#[test]
fn each_burst_settles_separately() {
    let (clock, loader, finished) = recording_loader(LoaderOptions::new().debounce_time(ms(100)));

    loader.report("first".to_string());
    clock.advance(ms(100));
    loader.report("second".to_string());
    clock.advance(ms(100));

    assert_eq!(
        *finished.borrow(),
        vec!["first".to_string(), "second".to_string()]
    );
}

#[test]
fn uses_the_initial_value() {
    let clock = ManualScheduler::new();
    let loader = DebounceLoader::new(LoaderOptions::new().initial_value("foo"), clock.clone());

    assert_eq!(
        loader.state(),
        LoaderState {
            is_loading: false,
            value: Some("foo")
        }
    );
    assert_eq!(clock.pending(), 0);
}

#[test]
fn value_is_empty_without_initial_value() {
    let loader = DebounceLoader::<String, _>::new(LoaderOptions::new(), ManualScheduler::new());

    assert_eq!(loader.state().value, None);
    assert_eq!(loader.state().phase(), Phase::Idle);
    assert!(loader.with_value(|value| value.is_none()));
}

#[test]
fn debounces_for_user_specified_time() {
    for debounce in [ms(1), ms(250), ms(3000)] {
        let clock = ManualScheduler::new();
        let loader = DebounceLoader::new(LoaderOptions::new().debounce_time(debounce), clock.clone());
        assert_eq!(loader.debounce_time(), debounce);

        loader.report("Hello World");
        clock.advance(debounce - ms(1));
        assert!(loader.is_loading());

        clock.advance(ms(1));
        assert!(!loader.is_loading());
    }
}

#[test]
fn zero_debounce_settles_on_next_tick() {
    let (clock, loader, finished) = recording_loader(LoaderOptions::new().debounce_time(Duration::ZERO));

    loader.report("now".to_string());
    assert!(loader.is_loading());

    clock.run_pending();
    assert!(!loader.is_loading());
    assert_eq!(*finished.borrow(), vec!["now".to_string()]);
}

#[test]
fn options_from_config() {
    let config = LoaderConfig {
        debounce_time_ms: 40,
    };
    let clock = ManualScheduler::new();
    let loader = DebounceLoader::new(config.into(), clock.clone());

    loader.report(1u8);
    clock.advance(ms(40));
    assert!(!loader.is_loading());
}

#[test]
fn dropped_loader_never_calls_back() {
    let (clock, loader, finished) = recording_loader(LoaderOptions::new());
    let reporter = loader.reporter();

    loader.report("pending".to_string());
    drop(loader);
    assert_eq!(clock.pending(), 0);
    assert!(!reporter.is_attached());

    clock.advance(DEFAULT_DEBOUNCE_TIME * 2);
    assert!(finished.borrow().is_empty());

    // Reports after teardown go nowhere.
    reporter.report("late".to_string());
    assert_eq!(clock.pending(), 0);
}

#[test]
fn reporter_clones_feed_the_same_loader() {
    let clock = ManualScheduler::new();
    let (report, loader) = create(LoaderOptions::new().debounce_time(ms(10)), clock.clone());
    let other: Reporter<&str, ManualScheduler> = report.clone();

    report.report("left");
    other.report("right");

    assert_eq!(loader.state().value, Some("right"));
    assert_eq!(clock.pending(), 1);
}

#[test]
fn instances_are_independent() {
    let clock = ManualScheduler::new();
    let fast = DebounceLoader::new(LoaderOptions::new().debounce_time(ms(100)), clock.clone());
    let slow = DebounceLoader::new(LoaderOptions::new().debounce_time(ms(500)), clock.clone());

    fast.report(1);
    slow.report(2);
    clock.advance(ms(100));

    assert!(!fast.is_loading());
    assert!(slow.is_loading());
    assert_eq!(slow.state().value, Some(2));
}

#[test]
fn subscribers_see_reports_and_settles() {
    let clock = ManualScheduler::new();
    let loader = DebounceLoader::new(LoaderOptions::new().debounce_time(ms(10)), clock.clone());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = seen.clone();
    let id = loader.subscribe(move |state: &LoaderState<u32>| sink.borrow_mut().push(state.clone()));

    loader.report(7);
    clock.advance(ms(10));
    assert_eq!(
        *seen.borrow(),
        vec![
            LoaderState {
                is_loading: true,
                value: Some(7)
            },
            LoaderState {
                is_loading: false,
                value: Some(7)
            },
        ]
    );

    loader.unsubscribe(id);
    loader.report(8);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn report_from_finish_callback_keeps_loading() {
    let clock = ManualScheduler::new();
    let finished = Rc::new(RefCell::new(Vec::new()));
    let retry: Rc<RefCell<Option<Reporter<&str, ManualScheduler>>>> = Rc::new(RefCell::new(None));

    let loader = {
        let finished = finished.clone();
        let retry = retry.clone();
        DebounceLoader::new(
            LoaderOptions::new()
                .debounce_time(ms(100))
                .on_finish(move |value: &&str| {
                    finished.borrow_mut().push(*value);
                    if *value == "retry" {
                        if let Some(reporter) = retry.borrow().as_ref() {
                            reporter.report("done");
                        }
                    }
                }),
            clock.clone(),
        )
    };
    *retry.borrow_mut() = Some(loader.reporter());

    loader.report("retry");
    clock.advance(ms(100));
    assert!(loader.is_loading());
    assert_eq!(loader.state().value, Some("done"));

    clock.advance(ms(100));
    assert!(!loader.is_loading());
    assert_eq!(*finished.borrow(), vec!["retry", "done"]);
}

#[test]
fn panicking_finish_callback_leaves_loading_set() {
    let clock = ManualScheduler::new();
    let loader = DebounceLoader::new(
        LoaderOptions::new()
            .debounce_time(ms(10))
            .on_finish(|_: &u32| panic!("finish failed")),
        clock.clone(),
    );

    loader.report(1);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| clock.advance(ms(10))));

    assert!(outcome.is_err());
    // The flag is cleared after the callback returns, so it stays set here.
    assert!(loader.is_loading());
    assert_eq!(clock.pending(), 0);
}

#[test]
fn later_subscribers_end_on_state_reported_by_earlier_ones() {
    let clock = ManualScheduler::new();
    let loader = DebounceLoader::new(LoaderOptions::new().debounce_time(ms(10)), clock.clone());
    let reporter = loader.reporter();

    loader.subscribe(move |state: &LoaderState<&str>| {
        if !state.is_loading && state.value == Some("a") {
            reporter.report("b");
        }
    });
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    loader.subscribe(move |state: &LoaderState<&str>| sink.borrow_mut().push(state.clone()));

    loader.report("a");
    clock.advance(ms(10));

    assert_eq!(seen.borrow().last(), Some(&loader.state()));
    assert_eq!(
        *seen.borrow(),
        vec![
            LoaderState {
                is_loading: true,
                value: Some("a")
            },
            LoaderState {
                is_loading: true,
                value: Some("b")
            },
        ]
    );

    clock.advance(ms(10));
    assert_eq!(
        seen.borrow().last(),
        Some(&LoaderState {
            is_loading: false,
            value: Some("b")
        })
    );
}

#[test]
#[should_panic]
fn reporting_from_with_value_panics() {
    let loader = DebounceLoader::new(LoaderOptions::new().initial_value(1), ManualScheduler::new());
    loader.with_value(|_| loader.report(2));
}
