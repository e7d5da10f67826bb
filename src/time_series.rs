use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::Deserialize;

/// One precomputed historical interval, as served by the history endpoints.
///
/// `overall_score` is on the [0, 1] scale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredInterval {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub overall_score: f64,
    #[serde(default)]
    pub sleeping_confidence: Option<f64>,
}

impl ScoredInterval {
    pub fn new(start_time: NaiveDateTime, end_time: NaiveDateTime, overall_score: f64) -> Self {
        Self {
            start_time,
            end_time,
            overall_score,
            sleeping_confidence: None,
        }
    }
}

/// Index-aligned labels and values; a `None` value breaks the line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlottableSeries {
    pub labels: Vec<NaiveDateTime>,
    pub values: Vec<Option<f64>>,
}

impl PlottableSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push(&mut self, label: NaiveDateTime, value: Option<f64>) {
        self.labels.push(label);
        self.values.push(value);
    }

    pub fn gap_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Contiguous runs of plotted points, split at every gap.
    pub fn segments(&self) -> Vec<Vec<(NaiveDateTime, f64)>> {
        self.labels
            .iter()
            .zip(&self.values)
            .chunk_by(|(_, value)| value.is_some())
            .into_iter()
            .filter(|(present, _)| *present)
            .map(|(_, run)| run.filter_map(|(label, value)| value.map(|v| (*label, v))).collect())
            .collect()
    }
}

pub fn midpoint(a: NaiveDateTime, b: NaiveDateTime) -> NaiveDateTime {
    a + (b - a) / 2
}

/// Turn ordered intervals into a plottable series with a null point in every gap.
pub fn reconstruct(intervals: &[ScoredInterval]) -> PlottableSeries {
    let mut series = PlottableSeries::default();
    let mut prev_end: Option<NaiveDateTime> = None;

    for interval in intervals {
        if let Some(prev_end) = prev_end {
            if interval.start_time != prev_end {
                series.push(midpoint(prev_end, interval.start_time), None);
            }
        }
        series.push(
            midpoint(interval.start_time, interval.end_time),
            Some(interval.overall_score),
        );
        prev_end = Some(interval.end_time);
    }

    series
}
