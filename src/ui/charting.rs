use crate::axis::{AxisPlan, Granularity};
use crate::error::RenderError;
use crate::history::ChartPayload;

/// A constructed history chart: the plan plus one polyline per contiguous run.
///
/// X is seconds from the window start, Y the [0, 1] score.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryChart {
    pub granularity: Granularity,
    pub plan: AxisPlan,
    pub segments: Vec<Vec<(f64, f64)>>,
    pub point_count: usize,
    pub gap_count: usize,
}

impl HistoryChart {
    pub fn build(payload: &ChartPayload) -> Result<Self, RenderError> {
        let series = &payload.series;
        if series.labels.len() != series.values.len() {
            return Err(RenderError::LengthMismatch {
                labels: series.labels.len(),
                values: series.values.len(),
            });
        }
        if let Some(idx) = series
            .values
            .iter()
            .position(|v| v.is_some_and(|v| !v.is_finite()))
        {
            return Err(RenderError::NonFinite(idx));
        }

        let plan = payload.plan.clone();
        let segments: Vec<Vec<(f64, f64)>> = series
            .segments()
            .into_iter()
            .map(|seg| {
                seg.into_iter()
                    .map(|(t, v)| (plan.offset_secs(t), v))
                    .collect()
            })
            .collect();

        Ok(Self {
            granularity: payload.granularity,
            point_count: segments.iter().map(Vec::len).sum(),
            gap_count: series.gap_count(),
            segments,
            plan,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    /// Release the chart before a replacement is built.
    pub fn dispose(self) {
        tracing::debug!(
            points = self.point_count,
            start = %self.plan.start,
            "history chart disposed"
        );
    }

    /// X-axis labels, thinned so that at most `max` remain, always keeping both ends.
    pub fn x_labels(&self, max: usize) -> Vec<String> {
        thin_labels(self.plan.tick_labels(), max)
    }
}

pub fn thin_labels(labels: Vec<String>, max: usize) -> Vec<String> {
    if max < 2 || labels.len() <= max {
        return labels;
    }
    let stride = (labels.len() - 1).div_ceil(max - 1);
    let last = labels.len() - 1;
    labels
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % stride == 0 || *i == last)
        .map(|(_, l)| l)
        .collect()
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
