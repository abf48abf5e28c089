use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
};

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use faster::{
    app::{Action, App},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    model::Timer,
    runtime::{AppEvent, FixedTicker, Runner, TerminalEventSource},
    stats::{filtered_records, Summary, TimeRange},
    store::{Repository, TimerStore},
    ui::{charting::format_seconds, draw},
};
use chrono::Local;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};
use uuid::Uuid;

/// stopwatch for repeated tasks, with history and trend charts
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal stopwatch that keeps a history of runs per timer and charts how your times trend over the last week, month, year or all time."
)]
pub struct Cli {
    /// database file to use instead of the default location
    #[clap(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// keep timers in memory only; nothing is saved
    #[clap(long, conflicts_with = "db")]
    in_memory: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// list timers with their record counts
    List,
    /// create a timer; without a title it is named "Timer N"
    Add { title: Option<String> },
    /// save a run for a timer (title or id) lasting SECONDS
    Record { timer: String, seconds: f64 },
    /// print count, average, fastest and slowest run for a timer
    Stats {
        timer: String,
        /// time window; defaults to the configured range
        #[clap(short, long, value_enum)]
        range: Option<TimeRange>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_path) = AppDirs::log_path() {
        logging::init(&log_path);
    }
    let config_store = FileConfigStore::new();
    let config = config_store.load();

    let store = open_store(&cli)?.with_countdown_by_default(config.countdown_by_default);

    if let Some(command) = cli.command.clone() {
        let mut store = store;
        run_command(&mut store, command, &config, &mut io::stdout())?;
        store.close()?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, config.clone());
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    if let Err(e) = config_store.save_if_changed(&config, &app.config) {
        warn!(path = %config_store.path().display(), error = %e, "could not save config");
    }
    app.store.close()?;
    Ok(())
}

fn open_store(cli: &Cli) -> Result<TimerStore, Box<dyn Error>> {
    if cli.in_memory {
        return Ok(TimerStore::open_in_memory()?);
    }
    let path = cli
        .db
        .clone()
        .or_else(AppDirs::db_path)
        .ok_or("could not determine a data directory; pass --db")?;
    info!(path = %path.display(), "opening timer store");
    Ok(TimerStore::open(&path)?)
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let ticker = FixedTicker::from_millis(app.config.tick_rate_ms);
    let mut runner = Runner::new(TerminalEventSource::new(), ticker);

    terminal.draw(|f| draw(app, f))?;
    loop {
        match runner.step() {
            AppEvent::Tick(now) => {
                app.on_tick(now);
                // only the run screen animates
                if app.stopwatch.is_counting() || app.stopwatch.is_running() {
                    terminal.draw(|f| draw(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| draw(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.on_key(key, std::time::Instant::now()) == Action::Quit {
                    break;
                }
                terminal.draw(|f| draw(app, f))?;
            }
        }
    }

    Ok(())
}

/// Resolve a timer argument by exact title, then by id
fn resolve_timer<'a, R: Repository>(store: &'a TimerStore<R>, key: &str) -> Option<&'a Timer> {
    store.find_by_title(key).or_else(|| {
        Uuid::parse_str(key)
            .ok()
            .and_then(|id| store.timers().iter().find(|t| t.id.0 == id))
    })
}

fn run_command<R: Repository, W: Write>(
    store: &mut TimerStore<R>,
    command: Command,
    config: &Config,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List => {
            if store.is_empty() {
                writeln!(out, "no timers")?;
            }
            for timer in store.timers() {
                writeln!(
                    out,
                    "{}\t{}\t{} records\t{}",
                    timer.title,
                    timer.created_at.format("%Y-%m-%d %H:%M"),
                    timer.records.len(),
                    timer.id
                )?;
            }
        }
        Command::Add { title } => {
            let timer = store.create_timer(title.as_deref())?;
            writeln!(out, "created {}\t{}", timer.title, timer.id)?;
        }
        Command::Record { timer, seconds } => {
            let id = resolve_timer(store, &timer)
                .map(|t| t.id)
                .ok_or_else(|| format!("no timer named {timer:?}"))?;
            match store.append_record(id, seconds, None)? {
                Some(record) => writeln!(out, "recorded {}", format_seconds(record.duration))?,
                None => {
                    warn!(seconds, "discarded non-positive duration");
                    writeln!(out, "ignored: duration must be positive")?;
                }
            }
        }
        Command::Stats { timer, range } => {
            let timer = resolve_timer(store, &timer).ok_or_else(|| format!("no timer named {timer:?}"))?;
            let range = range.unwrap_or(config.default_range);
            let records = filtered_records(timer, range, Local::now());
            if records.is_empty() {
                writeln!(out, "{} ({range}): no data", timer.title)?;
                return Ok(());
            }
            let summary = Summary::of(&records);
            writeln!(out, "{} ({range})", timer.title)?;
            writeln!(out, "runs\t{}", summary.count)?;
            writeln!(out, "average\t{}", format_seconds(summary.average))?;
            writeln!(out, "fastest\t{}", format_seconds(summary.minimum))?;
            writeln!(out, "slowest\t{}", format_seconds(summary.maximum))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(store: &mut TimerStore, args: &[&str]) -> String {
        let cli = Cli::parse_from(args);
        let mut out = Vec::new();
        run_command(store, cli.command.unwrap(), &Config::default(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["faster"]);
        assert_eq!(cli.db, None);
        assert!(!cli.in_memory);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_cli_db_and_in_memory_conflict() {
        assert!(Cli::try_parse_from(["faster", "--db", "x.db", "--in-memory"]).is_err());
        let cli = Cli::parse_from(["faster", "--db", "x.db"]);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::parse_from(["faster", "add", "Laundry"]);
        assert_eq!(
            cli.command,
            Some(Command::Add {
                title: Some("Laundry".into())
            })
        );

        let cli = Cli::parse_from(["faster", "record", "Laundry", "12.5"]);
        assert_eq!(
            cli.command,
            Some(Command::Record {
                timer: "Laundry".into(),
                seconds: 12.5
            })
        );

        let cli = Cli::parse_from(["faster", "stats", "Laundry", "--range", "month"]);
        assert_eq!(
            cli.command,
            Some(Command::Stats {
                timer: "Laundry".into(),
                range: Some(TimeRange::Month)
            })
        );
    }

    #[test]
    fn test_cli_rejects_unknown_range() {
        assert!(Cli::try_parse_from(["faster", "stats", "x", "--range", "decade"]).is_err());
    }

    #[test]
    fn test_commands_against_memory_store() {
        let mut store = TimerStore::open_in_memory().unwrap();
        assert_eq!(run(&mut store, &["faster", "list"]), "no timers\n");

        assert!(run(&mut store, &["faster", "add"]).starts_with("created Timer 1"));
        assert_eq!(
            run(&mut store, &["faster", "record", "Timer 1", "3"]),
            "recorded 3.0 s\n"
        );
        assert_eq!(
            run(&mut store, &["faster", "record", "Timer 1", "5"]),
            "recorded 5.0 s\n"
        );
        assert_eq!(
            run(&mut store, &["faster", "record", "Timer 1", "0"]),
            "ignored: duration must be positive\n"
        );

        let stats = run(&mut store, &["faster", "stats", "Timer 1"]);
        assert!(stats.contains("runs\t2"));
        assert!(stats.contains("average\t4.0 s"));
        assert!(stats.contains("fastest\t3.0 s"));
        assert!(stats.contains("slowest\t5.0 s"));

        assert!(run(&mut store, &["faster", "list"]).contains("2 records"));
    }

    #[test]
    fn test_timer_resolves_by_id() {
        let mut store = TimerStore::open_in_memory().unwrap();
        let timer = store.create_timer(Some("Run")).unwrap();
        let id = timer.id.to_string();
        assert_eq!(resolve_timer(&store, &id).map(|t| t.id), Some(timer.id));
        assert!(resolve_timer(&store, "missing").is_none());
    }

    #[test]
    fn test_unknown_timer_is_an_error() {
        let mut store = TimerStore::open_in_memory().unwrap();
        let cli = Cli::parse_from(["faster", "record", "ghost", "1"]);
        let mut out = Vec::new();
        assert!(run_command(&mut store, cli.command.unwrap(), &Config::default(), &mut out).is_err());
    }
}
