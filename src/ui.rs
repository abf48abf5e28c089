pub mod charting;
pub mod stats_view;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Screen};
use crate::model::{Record, Timer};
use crate::stopwatch::{countdown_label, format_elapsed};
use crate::store::Repository;
use crate::ui::charting::format_seconds;

const HORIZONTAL_MARGIN: u16 = 2;

/// Render the whole frame for the current screen
pub fn draw<R: Repository>(app: &App<R>, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // screen body
            Constraint::Length(1), // status
            Constraint::Length(1), // key help
        ])
        .split(f.area());

    match &app.screen {
        Screen::TimerList => render_timer_list(app, f, chunks[0]),
        Screen::History { .. } => render_history(app, f, chunks[0]),
        Screen::Run { .. } => render_run(app, f, chunks[0]),
        Screen::Rename { input, .. } => {
            render_history(app, f, chunks[0]);
            render_rename_popup(input, f, chunks[0]);
        }
        Screen::Stats { .. } => stats_view::render_stats(app, f, chunks[0]),
    }

    if let Some(status) = &app.status {
        let status = Paragraph::new(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        f.render_widget(status, chunks[1]);
    }

    let help = Paragraph::new(help_text(&app.screen))
        .style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);
}

pub fn help_text(screen: &Screen) -> &'static str {
    match screen {
        Screen::TimerList => "(n)ew  (d)elete  (enter) open  ↑/↓  (q)uit",
        Screen::History { .. } => "(s)tart  (e)dit title  (g)raph  (d)elete record  ↑/↓  (esc) back",
        Screen::Run { .. } => "(space) start/stop  (c)ountdown on/off  (esc) leave",
        Screen::Rename { .. } => "(enter) save  (esc) cancel",
        Screen::Stats { .. } => "(tab)/1-4 range  ←/→ move cursor  (enter) select  (x) clear  (esc) back",
    }
}

/// Cell text of a timer list row: title, creation time, record count
pub fn timer_row_cells(timer: &Timer) -> [String; 3] {
    let count = match timer.records.len() {
        1 => "1 record".to_string(),
        n => format!("{n} records"),
    };
    [
        timer.title.clone(),
        format!("created {}", timer.created_at.format("%Y-%m-%d %H:%M")),
        count,
    ]
}

pub fn present_timer_row(timer: &Timer) -> Row<'static> {
    let [title, created, count] = timer_row_cells(timer);
    Row::new(vec![
        Cell::from(title).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(created).style(Style::default().fg(Color::Gray)),
        Cell::from(count).style(Style::default().fg(Color::DarkGray)),
    ])
}

/// Cell text of a history row: duration, date, time of day
pub fn record_row_cells(record: &Record) -> [String; 3] {
    [
        format_seconds(record.duration),
        record.timestamp.format("%Y-%m-%d").to_string(),
        record.timestamp.format("%H:%M").to_string(),
    ]
}

pub fn present_record_row(record: &Record) -> Row<'static> {
    let [duration, date, time] = record_row_cells(record);
    Row::new(vec![
        Cell::from(duration),
        Cell::from(date).style(Style::default().fg(Color::Gray)),
        Cell::from(time).style(Style::default().fg(Color::Gray)),
    ])
}

fn render_timer_list<R: Repository>(app: &App<R>, f: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Timers");

    if app.store.is_empty() {
        let empty = Paragraph::new("No timers yet.\nPress (n) to create one.")
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = app.store.timers().iter().map(present_timer_row).collect();
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(26),
            Constraint::Length(14),
        ],
    )
    .block(block)
    .highlight_symbol("> ")
    .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default().with_selected(Some(app.list_selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_history<R: Repository>(app: &App<R>, f: &mut Frame, area: Rect) {
    let Some(timer) = app.current_timer() else {
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} · history", timer.title));

    if timer.records.is_empty() {
        let empty = Paragraph::new("No runs recorded.\nPress (s) to start the stopwatch.")
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = timer.records.iter().map(present_record_row).collect();
    let header = Row::new(vec!["Duration", "Date", "Time"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(block)
    .highlight_symbol("> ")
    .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default().with_selected(Some(app.history_selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_run<R: Repository>(app: &App<R>, f: &mut Frame, area: Rect) {
    let Some(timer) = app.current_timer() else {
        return;
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(2), // title
            Constraint::Length(3), // clock or countdown
            Constraint::Length(2), // countdown flag
            Constraint::Min(0),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Span::styled(timer.title.as_str(), bold)).alignment(Alignment::Center),
        chunks[1],
    );

    let clock = match app.stopwatch.countdown_stage() {
        Some(stage) => {
            let color = if stage > 0 { Color::Rgb(255, 165, 0) } else { Color::Green };
            Paragraph::new(vec![
                Line::from(Span::styled(
                    countdown_label(stage),
                    bold.fg(color),
                )),
                Line::from(Span::styled("Get ready...", Style::default().fg(Color::Gray))),
            ])
        }
        None => {
            let color = if app.stopwatch.is_running() {
                Color::Green
            } else {
                Color::White
            };
            Paragraph::new(Span::styled(
                format_elapsed(app.stopwatch.elapsed_secs()),
                bold.fg(color),
            ))
        }
    };
    f.render_widget(clock.alignment(Alignment::Center), chunks[2]);

    let flag = format!(
        "Countdown: {}",
        if timer.enable_countdown { "ON" } else { "OFF" }
    );
    f.render_widget(
        Paragraph::new(Span::styled(flag, Style::default().fg(Color::Gray)))
            .alignment(Alignment::Center),
        chunks[3],
    );
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

fn render_rename_popup(input: &str, f: &mut Frame, area: Rect) {
    let popup = popup_area(area, area.width.min(50), 3);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(input).block(Block::default().borders(Borders::ALL).title("Timer name")),
        popup,
    );

    let max_x = popup.x + popup.width.saturating_sub(2);
    let cursor_x = (popup.x + 1 + input.width() as u16).min(max_x);
    f.set_cursor_position((cursor_x, popup.y + 1));
}
