use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use crate::axis::Granularity;
use crate::controller::{Dashboard, PIVOT_INPUT_FORMAT};
use crate::ui::charting::{format_label, HistoryChart};

/// Roughly how many columns one x label needs.
const LABEL_SPACING: u16 = 6;

pub fn render_history(dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_controls(dashboard, chunks[0], buf);

    match dashboard.chart() {
        Some(chart) => render_chart(chart, chunks[1], buf),
        None => {
            let message = if dashboard.is_render_pending() {
                "loading…"
            } else {
                "press enter to plot the selected period"
            };
            Paragraph::new(Span::styled(
                message,
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            ))
            .block(Block::default().borders(Borders::ALL).title("Concentration Score"))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
        }
    }
}

fn render_controls(dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let controls = &dashboard.controls;

    let pivot_span = match &controls.editing {
        Some(text) => Span::styled(
            format!("{text}_"),
            bold.fg(Color::Black).bg(Color::Yellow),
        ),
        None => {
            let shown = match controls.granularity {
                Granularity::Hourly => controls.pivot.format(PIVOT_INPUT_FORMAT).to_string(),
                Granularity::Daily => controls.pivot.format("%Y-%m-%d").to_string(),
            };
            Span::styled(shown, bold.fg(Color::Cyan))
        }
    };

    let line = Line::from(vec![
        Span::raw("by "),
        Span::styled(
            match controls.granularity {
                Granularity::Hourly => "hour",
                Granularity::Daily => "day",
            },
            bold.fg(Color::Magenta),
        ),
        Span::raw("   at "),
        pivot_span,
    ]);

    Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("Period"))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_chart(chart: &HistoryChart, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let line_style = Style::default().fg(Color::Rgb(75, 192, 192));

    let datasets: Vec<Dataset> = chart
        .segments
        .iter()
        .map(|segment| {
            Dataset::default()
                .marker(Marker::Braille)
                .style(line_style)
                // a lone point has nothing to connect to
                .graph_type(if segment.len() > 1 {
                    GraphType::Line
                } else {
                    GraphType::Scatter
                })
                .data(segment)
        })
        .collect();

    let max_labels = (area.width / LABEL_SPACING).max(2) as usize;
    let x_title = match chart.granularity {
        Granularity::Hourly => "minute",
        Granularity::Daily => "hour",
    };
    let title = if chart.is_empty() {
        "Concentration Score (no data)".to_string()
    } else {
        format!("Concentration Score ({} points, {} gaps)", chart.point_count, chart.gap_count)
    };

    Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .title(x_title)
                .bounds([0.0, chart.plan.window_secs()])
                .labels(
                    chart
                        .x_labels(max_labels)
                        .into_iter()
                        .map(|l| Span::styled(l, bold))
                        .collect::<Vec<_>>(),
                ),
        )
        .y_axis(
            Axis::default()
                .title("score")
                .bounds([0.0, 1.0])
                .labels(vec![
                    Span::styled(format_label(0.0), bold),
                    Span::styled(format_label(0.5), bold),
                    Span::styled(format_label(1.0), bold),
                ]),
        )
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistorySource;
    use crate::session::SessionMachine;
    use crate::time_series::ScoredInterval;
    use chrono::{NaiveDate, NaiveDateTime};

    struct Gappy;

    impl HistorySource for Gappy {
        fn by_hour(&self, hour: NaiveDateTime) -> Vec<ScoredInterval> {
            let m = |min: i64| hour + chrono::TimeDelta::minutes(min);
            vec![
                ScoredInterval::new(m(0), m(5), 0.8),
                ScoredInterval::new(m(5), m(10), 0.7),
                ScoredInterval::new(m(30), m(35), 0.4),
            ]
        }

        fn by_date(&self, _: NaiveDate) -> Vec<ScoredInterval> {
            vec![]
        }
    }

    fn dashboard() -> Dashboard {
        let pivot = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Dashboard::new(SessionMachine::default(), pivot, Granularity::Hourly)
    }

    fn rendered(d: &Dashboard) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        render_history(d, area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn idle_history_prompts_for_plot() {
        let text = rendered(&dashboard());
        assert!(text.contains("press enter"));
        assert!(text.contains("2024-01-01T10:00"));
    }

    #[test]
    fn pending_render_shows_loading() {
        let mut d = dashboard();
        d.request_render();
        assert!(rendered(&d).contains("loading"));
    }

    #[test]
    fn chart_with_gaps_renders_title() {
        let mut d = dashboard();
        let req = d.request_render();
        d.on_chart_ready(req.run(&Gappy));
        let text = rendered(&d);
        assert!(text.contains("3 points, 1 gaps"));
    }

    #[test]
    fn empty_day_renders_no_data_chart() {
        let mut d = dashboard();
        d.toggle_granularity();
        let req = d.request_render();
        d.on_chart_ready(req.run(&Gappy));
        let text = rendered(&d);
        assert!(text.contains("no data"));
        assert!(text.contains("2024-01-01"));
    }
}
