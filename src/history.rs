//! Historical score queries.
//!
//! Query failures never escape this module: a failed request is logged and
//! reported as "no data", which renders as an empty chart.

use chrono::{NaiveDate, NaiveDateTime};
use std::time::Duration;
use ureq::Agent;

use crate::axis::{plan_axis, truncate_pivot, AxisPlan, Granularity};
use crate::error::QueryError;
use crate::time_series::{reconstruct, PlottableSeries, ScoredInterval};

pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

pub trait HistorySource: Send + Sync {
    fn by_hour(&self, hour: NaiveDateTime) -> Vec<ScoredInterval>;
    fn by_date(&self, date: NaiveDate) -> Vec<ScoredInterval>;
}

/// History endpoints of the monitor web service.
pub struct HttpHistorySource {
    agent: Agent,
    base_url: String,
}

impl HttpHistorySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(QUERY_TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn fetch(&self, path: &str, param: &str, value: &str) -> Result<Vec<ScoredInterval>, QueryError> {
        let url = format!("{}{}", self.base_url, path);
        let response = match self.agent.get(&url).query(param, value).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(QueryError::Status(code)),
            Err(ureq::Error::Transport(t)) => return Err(QueryError::Transport(t.to_string())),
        };
        Ok(response.into_json::<Vec<ScoredInterval>>()?)
    }

    fn fetch_or_empty(&self, path: &str, param: &str, value: &str) -> Vec<ScoredInterval> {
        match self.fetch(path, param, value) {
            Ok(intervals) => {
                tracing::debug!(path, value, count = intervals.len(), "history fetched");
                intervals
            }
            Err(err) => {
                tracing::warn!(path, value, %err, "history query failed, showing no data");
                Vec::new()
            }
        }
    }
}

impl HistorySource for HttpHistorySource {
    fn by_hour(&self, hour: NaiveDateTime) -> Vec<ScoredInterval> {
        let value = hour.format("%Y-%m-%dT%H:00:00").to_string();
        self.fetch_or_empty("/status/by-hour", "target_hour", &value)
    }

    fn by_date(&self, date: NaiveDate) -> Vec<ScoredInterval> {
        let value = date.format("%Y-%m-%d").to_string();
        self.fetch_or_empty("/status/by-date", "target_date", &value)
    }
}

/// Everything the chart needs for one render request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPayload {
    pub generation: u64,
    pub granularity: Granularity,
    pub series: PlottableSeries,
    pub plan: AxisPlan,
}

/// Query, reconstruct and plan one chart.
pub fn fetch_chart(
    source: &dyn HistorySource,
    generation: u64,
    pivot: NaiveDateTime,
    granularity: Granularity,
) -> ChartPayload {
    let pivot = truncate_pivot(pivot, granularity);
    let mut intervals = match granularity {
        Granularity::Hourly => source.by_hour(pivot),
        Granularity::Daily => source.by_date(pivot.date()),
    };
    intervals.sort_by_key(|i| i.start_time);

    ChartPayload {
        generation,
        granularity,
        series: reconstruct(&intervals),
        plan: plan_axis(pivot, granularity),
    }
}
