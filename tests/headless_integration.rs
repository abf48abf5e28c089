use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use faster::{
    app::{Action, App, Screen},
    config::Config,
    runtime::{AppEvent, ChannelEventSource, FixedTicker, Runner},
    store::TimerStore,
};

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Feed events through the runner until the app quits or the step budget runs out
fn drive(app: &mut App, runner: &mut Runner<ChannelEventSource, FixedTicker>, steps: u32) -> bool {
    for _ in 0..steps {
        match runner.step() {
            AppEvent::Tick(now) => app.on_tick(now),
            AppEvent::Resize => {}
            AppEvent::Key(k) => {
                if app.on_key(k, Instant::now()) == Action::Quit {
                    return true;
                }
            }
        }
    }
    false
}

// Headless flow using the internal runtime without a TTY: create a timer,
// time a run without countdown, and quit.
#[test]
fn headless_run_records_a_duration() {
    let store = TimerStore::open_in_memory().unwrap();
    let mut app = App::new(store, Config::default());

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::from_millis(5));

    for code in [
        KeyCode::Char('n'),
        KeyCode::Enter,
        KeyCode::Char('s'),
        KeyCode::Char('c'),
        KeyCode::Char(' '),
    ] {
        tx.send(key(code)).unwrap();
    }
    drive(&mut app, &mut runner, 50);
    assert!(app.stopwatch.is_running());

    std::thread::sleep(Duration::from_millis(30));
    tx.send(key(KeyCode::Char(' '))).unwrap();
    drive(&mut app, &mut runner, 50);

    let timer = &app.store.timers()[0];
    assert!(!timer.enable_countdown);
    assert_eq!(timer.records.len(), 1);
    assert!(timer.records[0].duration > 0.0);
    assert!(matches!(app.screen, Screen::History { .. }));

    tx.send(key(KeyCode::Esc)).unwrap();
    tx.send(key(KeyCode::Char('q'))).unwrap();
    assert!(drive(&mut app, &mut runner, 100), "app should quit");
}

#[test]
fn headless_countdown_advances_on_ticks() {
    let store = TimerStore::open_in_memory().unwrap();
    let mut app = App::new(store, Config::default());

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::from_millis(5));

    for code in [KeyCode::Char('n'), KeyCode::Enter, KeyCode::Char('s'), KeyCode::Char(' ')] {
        tx.send(key(code)).unwrap();
    }
    drive(&mut app, &mut runner, 20);
    assert_eq!(app.stopwatch.countdown_stage(), Some(3));

    // ticks alone carry the countdown through to a running stopwatch
    let deadline = Instant::now() + Duration::from_secs(10);
    while !app.stopwatch.is_running() && Instant::now() < deadline {
        drive(&mut app, &mut runner, 1);
    }
    assert!(app.stopwatch.is_running());
}
