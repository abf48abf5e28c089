use chrono::{DateTime, Duration as ChronoDuration, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tracing::error;

use crate::config::Config;
use crate::db::Database;
use crate::error::StoreResult;
use crate::model::{Record, RecordId, Timer, TimerId};
use crate::stats::{filtered_records, nearest_record, TimeRange};
use crate::stopwatch::Stopwatch;
use crate::store::{Repository, TimerStore};

/// Number of cursor steps across the chart's time span
const CURSOR_STEPS: i32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    TimerList,
    History { timer: TimerId },
    Run { timer: TimerId },
    Rename { timer: TimerId, input: String },
    Stats { timer: TimerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct StatsState {
    pub range: TimeRange,
    /// Position of the chart cursor on the time axis
    pub cursor: Option<DateTime<Local>>,
    pub selected: Option<RecordId>,
}

#[derive(Debug)]
pub struct App<R: Repository = Database> {
    pub store: TimerStore<R>,
    pub config: Config,
    pub screen: Screen,
    pub list_selected: usize,
    pub history_selected: usize,
    pub stopwatch: Stopwatch,
    pub stats: StatsState,
    /// Last error shown in the status line
    pub status: Option<String>,
}

impl<R: Repository> App<R> {
    pub fn new(store: TimerStore<R>, config: Config) -> Self {
        let stats = StatsState {
            range: config.default_range,
            ..StatsState::default()
        };
        Self {
            store,
            config,
            screen: Screen::TimerList,
            list_selected: 0,
            history_selected: 0,
            stopwatch: Stopwatch::new(),
            stats,
            status: None,
        }
    }

    /// Timer the current screen is about, if any
    pub fn current_timer(&self) -> Option<&Timer> {
        match &self.screen {
            Screen::TimerList => None,
            Screen::History { timer }
            | Screen::Run { timer }
            | Screen::Rename { timer, .. }
            | Screen::Stats { timer } => self.store.timer(*timer),
        }
    }

    pub fn selected_timer(&self) -> Option<&Timer> {
        self.store.timers().get(self.list_selected)
    }

    /// Records of the current timer inside the selected range, oldest first
    pub fn stats_records(&self, now: DateTime<Local>) -> Vec<Record> {
        self.current_timer()
            .map(|t| filtered_records(t, self.stats.range, now))
            .unwrap_or_default()
    }

    fn report<T>(&mut self, result: StoreResult<T>) -> Option<T> {
        match result {
            Ok(v) => {
                self.status = None;
                Some(v)
            }
            Err(e) => {
                error!(error = %e, "store operation failed");
                self.status = Some(e.to_string());
                None
            }
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        if matches!(self.screen, Screen::Run { .. }) {
            self.stopwatch.tick(now);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.leave_run(now);
            return Action::Quit;
        }

        match self.screen.clone() {
            Screen::TimerList => return self.on_list_key(key),
            Screen::History { timer } => self.on_history_key(timer, key),
            Screen::Run { timer } => self.on_run_key(timer, key, now),
            Screen::Rename { timer, input } => self.on_rename_key(timer, input, key),
            Screen::Stats { timer } => self.on_stats_key(timer, key),
        }
        Action::Continue
    }

    fn on_list_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_selected = self.list_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.list_selected + 1 < self.store.len() {
                    self.list_selected += 1;
                }
            }
            KeyCode::Char('n') | KeyCode::Char('+') => {
                let created = self.store.create_timer(None);
                if self.report(created).is_some() {
                    self.list_selected = self.store.len() - 1;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let deleted = self.store.delete_timers_at(&[self.list_selected]);
                self.report(deleted);
                self.list_selected = self.list_selected.min(self.store.len().saturating_sub(1));
            }
            KeyCode::Enter | KeyCode::Right => {
                if let Some(id) = self.selected_timer().map(|t| t.id) {
                    self.history_selected = 0;
                    self.screen = Screen::History { timer: id };
                }
            }
            _ => {}
        }
        Action::Continue
    }

    fn on_history_key(&mut self, timer: TimerId, key: KeyEvent) {
        let Some(record_count) = self.store.timer(timer).map(|t| t.records.len()) else {
            self.screen = Screen::TimerList;
            return;
        };

        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('b') => {
                self.screen = Screen::TimerList;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.history_selected = self.history_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.history_selected + 1 < record_count {
                    self.history_selected += 1;
                }
            }
            KeyCode::Char('s') | KeyCode::Char(' ') => {
                self.stopwatch.reset();
                self.screen = Screen::Run { timer };
            }
            KeyCode::Char('e') => {
                let input = self
                    .store
                    .timer(timer)
                    .map(|t| t.title.clone())
                    .unwrap_or_default();
                self.screen = Screen::Rename { timer, input };
            }
            KeyCode::Char('g') | KeyCode::Tab => {
                self.stats = StatsState {
                    range: self.config.default_range,
                    ..StatsState::default()
                };
                self.screen = Screen::Stats { timer };
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let deleted = self.store.delete_records_at(timer, &[self.history_selected]);
                self.report(deleted);
                let remaining = self.store.timer(timer).map_or(0, |t| t.records.len());
                self.history_selected = self.history_selected.min(remaining.saturating_sub(1));
            }
            _ => {}
        }
    }

    fn save_run(&mut self, timer: TimerId, secs: Option<f64>) {
        if let Some(secs) = secs {
            let appended = self.store.append_record(timer, secs, None);
            self.report(appended);
            self.history_selected = 0;
        }
    }

    /// Stop-and-save a running stopwatch or cancel its countdown when the
    /// run screen is left
    fn leave_run(&mut self, now: Instant) {
        if let Screen::Run { timer } = self.screen {
            let secs = self.stopwatch.dismiss(now);
            self.save_run(timer, secs);
        }
    }

    fn on_run_key(&mut self, timer: TimerId, key: KeyEvent, now: Instant) {
        let countdown = self
            .store
            .timer(timer)
            .map_or(true, |t| t.enable_countdown);

        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => {
                let secs = self.stopwatch.toggle(now, countdown);
                if secs.is_some() {
                    self.save_run(timer, secs);
                    self.screen = Screen::History { timer };
                }
            }
            KeyCode::Char('c') => {
                let toggled = self.store.set_countdown(timer, !countdown);
                self.report(toggled);
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                self.leave_run(now);
                self.screen = Screen::History { timer };
            }
            _ => {}
        }
    }

    fn on_rename_key(&mut self, timer: TimerId, mut input: String, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::History { timer };
            }
            KeyCode::Enter => {
                let renamed = self.store.rename_timer(timer, &input);
                self.report(renamed);
                self.screen = Screen::History { timer };
            }
            KeyCode::Backspace => {
                input.pop();
                self.screen = Screen::Rename { timer, input };
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                input.push(c);
                self.screen = Screen::Rename { timer, input };
            }
            _ => {}
        }
    }

    /// Switch the statistics window; the choice becomes the range the
    /// screen opens with next time
    fn set_range(&mut self, range: TimeRange) {
        self.stats.range = range;
        self.config.default_range = range;
        self.stats.cursor = None;
        self.stats.selected = None;
    }

    fn on_stats_key(&mut self, timer: TimerId, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                self.screen = Screen::History { timer };
            }
            KeyCode::Tab | KeyCode::Char('r') => self.set_range(self.stats.range.next()),
            KeyCode::Char('1') => self.set_range(TimeRange::Week),
            KeyCode::Char('2') => self.set_range(TimeRange::Month),
            KeyCode::Char('3') => self.set_range(TimeRange::Year),
            KeyCode::Char('4') => self.set_range(TimeRange::All),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1, Local::now()),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1, Local::now()),
            KeyCode::Enter => self.tap_cursor(Local::now()),
            KeyCode::Char('x') => {
                self.stats.cursor = None;
                self.stats.selected = None;
            }
            _ => {}
        }
    }

    /// Slide the chart cursor one step and select the record nearest to it
    pub fn move_cursor(&mut self, direction: i32, now: DateTime<Local>) {
        let records = self.stats_records(now);
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return;
        };

        let span = last.timestamp - first.timestamp;
        let step = (span / CURSOR_STEPS).max(ChronoDuration::seconds(1));
        let cursor = match self.stats.cursor {
            Some(c) => (c + step * direction).clamp(first.timestamp, last.timestamp),
            None if direction < 0 => last.timestamp,
            None => first.timestamp,
        };

        self.stats.cursor = Some(cursor);
        self.stats.selected = nearest_record(&records, cursor).map(|r| r.id);
    }

    /// Select the record nearest to the cursor, or clear the selection if
    /// that record is already selected
    pub fn tap_cursor(&mut self, now: DateTime<Local>) {
        let records = self.stats_records(now);
        let Some(cursor) = self.stats.cursor.or_else(|| records.last().map(|r| r.timestamp))
        else {
            self.stats.selected = None;
            return;
        };

        self.stats.cursor = Some(cursor);
        let nearest = nearest_record(&records, cursor).map(|r| r.id);
        self.stats.selected = if nearest == self.stats.selected {
            None
        } else {
            nearest
        };
    }

    pub fn selected_record(&self) -> Option<&Record> {
        let id = self.stats.selected?;
        self.current_timer()?.record(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(TimerStore::open_in_memory().unwrap(), Config::default())
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        app.on_key(key(code), Instant::now())
    }

    fn open_first_timer(app: &mut App) -> TimerId {
        press(app, KeyCode::Char('n'));
        press(app, KeyCode::Enter);
        match app.screen {
            Screen::History { timer } => timer,
            ref other => panic!("expected history screen, got {other:?}"),
        }
    }

    #[test]
    fn test_list_create_and_navigate() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.len(), 2);
        assert_eq!(app.list_selected, 1);
        assert_eq!(app.selected_timer().unwrap().title, "Timer 2");

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.list_selected, 0);
    }

    #[test]
    fn test_list_delete_clamps_selection() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.list_selected, 0);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('d'));
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_quit_from_list() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::Quit);
        assert_eq!(
            app.on_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                Instant::now()
            ),
            Action::Quit
        );
    }

    #[test]
    fn test_run_with_countdown_records_on_stop() {
        let mut app = app();
        let timer = open_first_timer(&mut app);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.screen, Screen::Run { timer });

        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char(' ')), t0);
        assert_eq!(app.stopwatch.countdown_stage(), Some(3));

        app.on_tick(t0 + Duration::from_millis(3500));
        assert!(app.stopwatch.is_running());
        app.on_tick(t0 + Duration::from_millis(5500));

        app.on_key(key(KeyCode::Char(' ')), t0 + Duration::from_millis(5500));
        assert_eq!(app.screen, Screen::History { timer });
        let records = &app.store.timer(timer).unwrap().records;
        assert_eq!(records.len(), 1);
        assert!((records[0].duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cancelled_countdown_records_nothing() {
        let mut app = app();
        let timer = open_first_timer(&mut app);
        press(&mut app, KeyCode::Char('s'));

        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char(' ')), t0);
        app.on_key(key(KeyCode::Esc), t0 + Duration::from_millis(1200));

        assert_eq!(app.screen, Screen::History { timer });
        assert!(app.store.timer(timer).unwrap().records.is_empty());
    }

    #[test]
    fn test_leaving_a_running_stopwatch_saves_it() {
        let mut app = app();
        let timer = open_first_timer(&mut app);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('c'));
        assert!(!app.store.timer(timer).unwrap().enable_countdown);

        let t0 = Instant::now();
        app.on_key(key(KeyCode::Enter), t0);
        assert!(app.stopwatch.is_running());
        app.on_key(key(KeyCode::Esc), t0 + Duration::from_millis(1500));

        let records = &app.store.timer(timer).unwrap().records;
        assert_eq!(records.len(), 1);
        assert!((records[0].duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_instant_stop_is_discarded() {
        let mut app = app();
        let timer = open_first_timer(&mut app);
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('c'));

        let t0 = Instant::now();
        app.on_key(key(KeyCode::Enter), t0);
        app.on_key(key(KeyCode::Enter), t0);
        assert!(app.store.timer(timer).unwrap().records.is_empty());
    }

    #[test]
    fn test_rename_flow() {
        let mut app = app();
        let timer = open_first_timer(&mut app);

        press(&mut app, KeyCode::Char('e'));
        for _ in 0.."Timer 1".len() {
            press(&mut app, KeyCode::Backspace);
        }
        // empty submission keeps the old title
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.timer(timer).unwrap().title, "Timer 1");

        press(&mut app, KeyCode::Char('e'));
        for _ in 0.."Timer 1".len() {
            press(&mut app, KeyCode::Backspace);
        }
        for c in "Rowing".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.timer(timer).unwrap().title, "Rowing");
        assert_eq!(app.screen, Screen::History { timer });
    }

    #[test]
    fn test_history_delete_record() {
        let mut app = app();
        let timer = open_first_timer(&mut app);
        app.store.append_record(timer, 1.0, None).unwrap();
        app.store.append_record(timer, 2.0, None).unwrap();

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));

        let records = &app.store.timer(timer).unwrap().records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration, 2.0);
        assert_eq!(app.history_selected, 0);
    }

    #[test]
    fn test_stats_range_and_cursor_selection() {
        let mut app = app();
        let timer = open_first_timer(&mut app);
        let now = Local::now();
        let old = app
            .store
            .append_record(timer, 30.0, Some(now - ChronoDuration::days(3)))
            .unwrap()
            .unwrap();
        let recent = app
            .store
            .append_record(timer, 10.0, Some(now - ChronoDuration::hours(1)))
            .unwrap()
            .unwrap();
        app.store
            .append_record(timer, 99.0, Some(now - ChronoDuration::days(60)))
            .unwrap();

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.stats.range, TimeRange::Week);
        assert_eq!(app.stats_records(now).len(), 2);

        // first step lands on the oldest in-range record
        app.move_cursor(1, now);
        assert_eq!(app.stats.selected, Some(old.id));

        for _ in 0..CURSOR_STEPS {
            app.move_cursor(1, now);
        }
        assert_eq!(app.stats.selected, Some(recent.id));
        assert_eq!(app.selected_record().map(|r| r.duration), Some(10.0));

        // tapping the selected record clears it
        app.tap_cursor(now);
        assert_eq!(app.stats.selected, None);
        app.tap_cursor(now);
        assert_eq!(app.stats.selected, Some(recent.id));

        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.stats.range, TimeRange::All);
        assert_eq!(app.stats.selected, None);
        assert_eq!(app.stats_records(now).len(), 3);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::History { timer });
    }

    #[test]
    fn test_last_range_is_remembered() {
        let mut app = app();
        open_first_timer(&mut app);
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.config.default_range, TimeRange::Year);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.stats.range, TimeRange::Year);
    }

    #[test]
    fn test_cursor_on_empty_range_does_nothing() {
        let mut app = app();
        open_first_timer(&mut app);
        press(&mut app, KeyCode::Char('g'));
        app.move_cursor(1, Local::now());
        app.tap_cursor(Local::now());
        assert_eq!(app.stats.cursor, None);
        assert_eq!(app.stats.selected, None);
    }
}
