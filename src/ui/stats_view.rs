use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Tabs},
    Frame,
};

use crate::app::App;
use crate::model::Record;
use crate::stats::{axis_date_format, chart_points, Summary, TimeRange};
use crate::time_series::ChartPoint;
use crate::store::Repository;
use crate::ui::charting::{
    compute_chart_bounds, dashed_line, format_seconds, vertical_rule, x_labels, y_labels,
};

const X_LABEL_COUNT: usize = 4;
const AVERAGE_DASHES: usize = 40;
const RULE_STEPS: usize = 24;

/// Label/value pairs of the summary table
pub fn present_summary(summary: &Summary) -> Vec<(&'static str, String)> {
    vec![
        ("Runs", summary.count.to_string()),
        ("Average", format_seconds(summary.average)),
        ("Fastest", format_seconds(summary.minimum)),
        ("Slowest", format_seconds(summary.maximum)),
    ]
}

pub fn present_selected(record: &Record) -> String {
    format!(
        "{}  on {}",
        format_seconds(record.duration),
        record.timestamp.format("%a %d %b %Y, %H:%M")
    )
}

pub fn render_stats<R: Repository>(app: &App<R>, f: &mut Frame, area: Rect) {
    let Some(timer) = app.current_timer() else {
        return;
    };
    let records = app.stats_records(Local::now());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // range tabs
            Constraint::Min(8),    // chart
            Constraint::Length(3), // selected record
            Constraint::Length(6), // summary
        ])
        .split(area);

    let tabs = Tabs::new(TimeRange::ALL.iter().map(|r| r.label()))
        .select(
            TimeRange::ALL
                .iter()
                .position(|r| *r == app.stats.range)
                .unwrap_or(0),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} · statistics", timer.title)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[0]);

    if records.is_empty() {
        let empty = Paragraph::new("No data")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
        render_summary(&Summary::default(), f, chunks[3]);
        return;
    }

    let summary = Summary::of(&records);
    render_chart(app, &records, &summary, f, chunks[1]);

    let selected = app
        .selected_record()
        .map(present_selected)
        .unwrap_or_else(|| "Use ←/→ to move the cursor, enter to select".to_string());
    f.render_widget(
        Paragraph::new(selected).block(Block::default().borders(Borders::ALL).title("Selected")),
        chunks[2],
    );

    render_summary(&summary, f, chunks[3]);
}

fn render_chart<R: Repository>(
    app: &App<R>,
    records: &[Record],
    summary: &Summary,
    f: &mut Frame,
    area: Rect,
) {
    let points = chart_points(records, app.config.chart_point_limit);
    let Some(bounds) = compute_chart_bounds(records, summary) else {
        return;
    };
    let data: Vec<(f64, f64)> = points.iter().copied().map(Into::into).collect();
    let average = dashed_line(summary.average, &bounds, AVERAGE_DASHES);

    let cursor_rule = app
        .stats
        .cursor
        .map(|c| vertical_rule(c.timestamp_millis() as f64 / 1000.0, &bounds, RULE_STEPS))
        .unwrap_or_default();
    let selected: Vec<(f64, f64)> = app
        .selected_record()
        .map(|r| vec![ChartPoint::from(r).into()])
        .unwrap_or_default();

    let mut datasets = vec![
        Dataset::default()
            .name("duration")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&data),
        Dataset::default()
            .name(format!("avg {}", format_seconds(summary.average)))
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Gray))
            .data(&average),
    ];
    if !cursor_rule.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::DarkGray))
                .data(&cursor_rule),
        );
    }
    if !selected.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Rgb(255, 165, 0)))
                .data(&selected),
        );
    }

    let fmt = axis_date_format(app.stats.range);
    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(bounds.x)
                .labels(x_labels(&bounds, fmt, X_LABEL_COUNT)),
        )
        .y_axis(
            Axis::default()
                .title("seconds")
                .style(Style::default().fg(Color::Gray))
                .bounds(bounds.y)
                .labels(y_labels(&bounds)),
        );
    f.render_widget(chart, area);
}

fn render_summary(summary: &Summary, f: &mut Frame, area: Rect) {
    let rows: Vec<Row> = present_summary(summary)
        .into_iter()
        .map(|(label, value)| {
            Row::new(vec![
                Cell::from(label).style(Style::default().fg(Color::Gray)),
                Cell::from(value).style(Style::default().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(10)])
        .block(Block::default().borders(Borders::ALL).title("Summary"));
    f.render_widget(table, area);
}
