//! Axis range planning for the history chart.

use chrono::{Days, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Granularity {
    #[default]
    Hourly,
    Daily,
}

impl Granularity {
    pub fn toggled(self) -> Self {
        match self {
            Granularity::Hourly => Granularity::Daily,
            Granularity::Daily => Granularity::Hourly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickUnit {
    Minute,
    Hour,
}

/// Chart window `[start, end)` and how its ticks are laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisPlan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub unit: TickUnit,
    pub step: u32,
    pub display_format: &'static str,
}

pub fn plan_axis(pivot: NaiveDateTime, granularity: Granularity) -> AxisPlan {
    match granularity {
        Granularity::Hourly => AxisPlan {
            start: pivot,
            end: pivot
                .checked_add_signed(TimeDelta::hours(1))
                .unwrap_or(NaiveDateTime::MAX),
            unit: TickUnit::Minute,
            step: 5,
            display_format: "%M",
        },
        Granularity::Daily => AxisPlan {
            start: pivot,
            end: pivot
                .checked_add_days(Days::new(1))
                .unwrap_or(NaiveDateTime::MAX),
            unit: TickUnit::Hour,
            step: 1,
            display_format: "%H",
        },
    }
}

/// Start of the hour or day containing `dt`.
pub fn truncate_pivot(dt: NaiveDateTime, granularity: Granularity) -> NaiveDateTime {
    match granularity {
        Granularity::Hourly => dt.date().and_time(NaiveTime::MIN) + TimeDelta::hours(dt.hour() as i64),
        Granularity::Daily => dt.date().and_time(NaiveTime::MIN),
    }
}

impl AxisPlan {
    pub fn step_delta(&self) -> TimeDelta {
        match self.unit {
            TickUnit::Minute => TimeDelta::minutes(self.step as i64),
            TickUnit::Hour => TimeDelta::hours(self.step as i64),
        }
    }

    pub fn window_secs(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64
    }

    /// Seconds from the window start, the x coordinate used by the chart.
    pub fn offset_secs(&self, ts: NaiveDateTime) -> f64 {
        (ts - self.start).num_milliseconds() as f64 / 1000.0
    }

    /// Tick positions from `start` to `end` inclusive.
    pub fn ticks(&self) -> Vec<NaiveDateTime> {
        let step = self.step_delta();
        let mut ticks = Vec::new();
        let mut t = self.start;
        while t <= self.end {
            ticks.push(t);
            match t.checked_add_signed(step) {
                Some(next) => t = next,
                None => break,
            }
        }
        ticks
    }

    pub fn tick_labels(&self) -> Vec<String> {
        self.ticks()
            .iter()
            .map(|t| t.format(self.display_format).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn hourly_window_spans_one_hour() {
        let plan = plan_axis(dt(1, 10, 0), Granularity::Hourly);
        assert_eq!(plan.start, dt(1, 10, 0));
        assert_eq!(plan.end, dt(1, 11, 0));
        assert_eq!(plan.unit, TickUnit::Minute);
        assert_eq!(plan.step, 5);
        assert_eq!(plan.window_secs(), 3600.0);
    }

    #[test]
    fn daily_window_spans_one_calendar_day() {
        let plan = plan_axis(dt(1, 0, 0), Granularity::Daily);
        assert_eq!(plan.start, dt(1, 0, 0));
        assert_eq!(plan.end, dt(2, 0, 0));
        assert_eq!(plan.unit, TickUnit::Hour);
        assert_eq!(plan.step, 1);
    }

    #[test]
    fn daily_window_crosses_month_end() {
        let pivot = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let plan = plan_axis(pivot, Granularity::Daily);
        assert_eq!(
            plan.end,
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn plan_saturates_at_end_of_range() {
        let plan = plan_axis(NaiveDateTime::MAX, Granularity::Daily);
        assert_eq!(plan.end, NaiveDateTime::MAX);
    }

    #[test]
    fn hourly_ticks_every_five_minutes() {
        let plan = plan_axis(dt(1, 10, 0), Granularity::Hourly);
        let labels = plan.tick_labels();
        assert_eq!(labels.len(), 13);
        assert_eq!(labels[0], "00");
        assert_eq!(labels[1], "05");
        assert_eq!(labels[12], "00");
    }

    #[test]
    fn daily_ticks_every_hour() {
        let plan = plan_axis(dt(1, 0, 0), Granularity::Daily);
        let labels = plan.tick_labels();
        assert_eq!(labels.len(), 25);
        assert_eq!(labels[13], "13");
    }

    #[test]
    fn truncation_to_hour_and_day() {
        let t = dt(1, 10, 37);
        assert_eq!(truncate_pivot(t, Granularity::Hourly), dt(1, 10, 0));
        assert_eq!(truncate_pivot(t, Granularity::Daily), dt(1, 0, 0));
    }

    #[test]
    fn offset_is_relative_to_window_start() {
        let plan = plan_axis(dt(1, 10, 0), Granularity::Hourly);
        assert_eq!(plan.offset_secs(dt(1, 10, 30)), 1800.0);
    }

    #[test]
    fn granularity_toggles() {
        assert_eq!(Granularity::Hourly.toggled(), Granularity::Daily);
        assert_eq!(Granularity::Daily.toggled(), Granularity::Hourly);
        assert_eq!(Granularity::Daily.to_string(), "Daily");
    }
}
