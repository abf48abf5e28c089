use chrono::{Local, TimeZone};

use crate::model::Record;
use crate::stats::{AxisDateFormat, Summary};
use crate::time_series::ChartPoint;

/// Padding applied to a degenerate axis so the chart never collapses
const FLAT_Y_PAD: f64 = 1.0;
const FLAT_X_PAD_SECS: f64 = 3_600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

/// Compute X (unix seconds) and Y (duration) bounds for the trend chart.
///
/// Both axes cover the whole filtered window, not just the plotted points:
/// x spans the first to last record (where the cursor can go) and y is
/// exactly `[minimum, maximum]` of the summary. Identical values get a
/// fixed pad on either side.
pub fn compute_chart_bounds(records: &[Record], summary: &Summary) -> Option<ChartBounds> {
    let first = ChartPoint::from(records.first()?);
    let last = ChartPoint::from(records.last()?);

    let (mut lo, mut hi) = (summary.minimum, summary.maximum);
    if hi - lo < f64::EPSILON {
        lo -= FLAT_Y_PAD;
        hi += FLAT_Y_PAD;
    }

    let (mut x0, mut x1) = (first.t, last.t);
    if x1 - x0 < f64::EPSILON {
        x0 -= FLAT_X_PAD_SECS;
        x1 += FLAT_X_PAD_SECS;
    }

    Some(ChartBounds {
        x: [x0, x1],
        y: [lo.max(0.0), hi],
    })
}

/// Date labels spread evenly across the x bounds
pub fn x_labels(bounds: &ChartBounds, fmt: AxisDateFormat, count: usize) -> Vec<String> {
    let [x0, x1] = bounds.x;
    let steps = count.max(2) - 1;
    (0..=steps)
        .map(|i| x0 + (x1 - x0) * i as f64 / steps as f64)
        .map(|t| {
            Local
                .timestamp_millis_opt((t * 1000.0) as i64)
                .single()
                .map(|dt| fmt.format(&dt))
                .unwrap_or_default()
        })
        .collect()
}

pub fn y_labels(bounds: &ChartBounds) -> Vec<String> {
    let [lo, hi] = bounds.y;
    vec![format_label(lo), format_label((lo + hi) / 2.0), format_label(hi)]
}

/// Evenly spaced points at height `y`; drawn as a scatter this reads as
/// a dashed horizontal rule
pub fn dashed_line(y: f64, bounds: &ChartBounds, dashes: usize) -> Vec<(f64, f64)> {
    let [x0, x1] = bounds.x;
    let dashes = dashes.max(2);
    (0..dashes)
        .map(|i| (x0 + (x1 - x0) * i as f64 / (dashes - 1) as f64, y))
        .collect()
}

/// Vertical rule at `x` spanning the y bounds
pub fn vertical_rule(x: f64, bounds: &ChartBounds, steps: usize) -> Vec<(f64, f64)> {
    let [lo, hi] = bounds.y;
    let steps = steps.max(2);
    (0..steps)
        .map(|i| (x, lo + (hi - lo) * i as f64 / (steps - 1) as f64))
        .collect()
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.1}")
    }
}

/// Duration as shown in history rows and summaries
pub fn format_seconds(secs: f64) -> String {
    format!("{secs:.1} s")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(values: &[(i64, f64)]) -> Vec<Record> {
        values
            .iter()
            .map(|&(t, d)| Record::new(d, Local.timestamp_opt(t, 0).single()))
            .collect()
    }

    fn bounds_of(values: &[(i64, f64)]) -> Option<ChartBounds> {
        let records = records(values);
        compute_chart_bounds(&records, &Summary::of(&records))
    }

    #[test]
    fn test_bounds_empty() {
        assert_eq!(bounds_of(&[]), None);
    }

    #[test]
    fn test_bounds_use_min_and_max() {
        let b = bounds_of(&[(100, 4.0), (200, 9.5), (300, 2.0)]).unwrap();
        assert_eq!(b.x, [100.0, 300.0]);
        assert_eq!(b.y, [2.0, 9.5]);
    }

    #[test]
    fn test_bounds_single_point_are_padded() {
        let b = bounds_of(&[(1_000, 5.0)]).unwrap();
        assert_eq!(b.y, [4.0, 6.0]);
        assert!(b.x[0] < 1_000.0 && b.x[1] > 1_000.0);
    }

    #[test]
    fn test_flat_pad_never_goes_negative() {
        let b = bounds_of(&[(0, 0.5), (10, 0.5)]).unwrap();
        assert_eq!(b.y, [0.0, 1.5]);
    }

    #[test]
    fn test_bounds_cover_records_beyond_the_point_limit() {
        // 50 quick runs are plotted; 10 slow ones after them are not
        let mut values: Vec<(i64, f64)> =
            (0..50).map(|i| (i * 60, 10.0 + (i % 3) as f64)).collect();
        values.extend((50..60).map(|i| (i * 60, 1000.0)));
        let records = records(&values);
        let summary = Summary::of(&records);

        let b = compute_chart_bounds(&records, &summary).unwrap();
        assert_eq!(b.y, [10.0, 1000.0]);
        assert_eq!(b.x, [0.0, 59.0 * 60.0]);
        assert!(summary.average > b.y[0] && summary.average < b.y[1]);

        let plotted = crate::stats::chart_points(&records, 50);
        assert!(plotted.iter().all(|p| p.t >= b.x[0] && p.t <= b.x[1]));
    }

    #[test]
    fn test_dashed_line_spans_x() {
        let b = ChartBounds { x: [0.0, 10.0], y: [0.0, 1.0] };
        let line = dashed_line(3.0, &b, 6);
        assert_eq!(line.len(), 6);
        assert_eq!(line.first(), Some(&(0.0, 3.0)));
        assert_eq!(line.last(), Some(&(10.0, 3.0)));
    }

    #[test]
    fn test_vertical_rule_spans_y() {
        let b = ChartBounds { x: [0.0, 10.0], y: [2.0, 4.0] };
        let rule = vertical_rule(5.0, &b, 3);
        assert_eq!(rule, vec![(5.0, 2.0), (5.0, 3.0), (5.0, 4.0)]);
    }

    #[test]
    fn test_x_labels_count() {
        let b = ChartBounds { x: [1_700_000_000.0, 1_700_600_000.0], y: [0.0, 1.0] };
        let labels = x_labels(&b, AxisDateFormat::DayMonth, 3);
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().all(|l| !l.is_empty()));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.2");
        assert_eq!(format_seconds(12.345), "12.3 s");
    }
}
