use crate::model::Record;

/// A point on the trend chart: x is the record's unix time in seconds,
/// y its duration in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub t: f64,
    pub duration: f64,
}

impl ChartPoint {
    pub fn new(t: f64, duration: f64) -> Self {
        Self { t, duration }
    }
}

impl From<&Record> for ChartPoint {
    fn from(r: &Record) -> Self {
        ChartPoint {
            t: r.timestamp.timestamp_millis() as f64 / 1000.0,
            duration: r.duration,
        }
    }
}

impl From<ChartPoint> for (f64, f64) {
    fn from(p: ChartPoint) -> Self {
        (p.t, p.duration)
    }
}
