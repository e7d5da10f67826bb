//! Dashboard controller.
//!
//! Owns the live session and all display state, and is driven one event at a
//! time by the loop in `main.rs`. Producer threads never touch it directly.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::axis::{truncate_pivot, Granularity};
use crate::effects::{Bounce, TransformEffect};
use crate::history::{fetch_chart, ChartPayload, HistorySource};
use crate::live::ChannelEvent;
use crate::runtime::DashEvent;
use crate::score::NO_PENALTIES;
use crate::session::{DisplayCommand, SessionMachine, SessionState, ShakeTier};
use crate::ui::charting::HistoryChart;
use crate::wire::{decode, StreamMessage};

pub const PIVOT_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Live,
    History,
}

/// Everything the live panel draws.
#[derive(Debug)]
pub struct LiveView {
    pub accumulated_score: f64,
    pub shake: ShakeTier,
    pub evolved: bool,
    pub penalties: Vec<&'static str>,
    pub last_diagnostic: Option<String>,
    pub transform: TransformEffect,
    pub bounce: Bounce,
    pub frame: u64,
}

impl Default for LiveView {
    fn default() -> Self {
        Self {
            accumulated_score: 0.0,
            shake: ShakeTier::Level0,
            evolved: false,
            penalties: vec![NO_PENALTIES],
            last_diagnostic: None,
            transform: TransformEffect::new(),
            bounce: Bounce::default(),
            frame: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryControls {
    pub granularity: Granularity,
    pub pivot: NaiveDateTime,
    /// Pivot text being typed, when editing.
    pub editing: Option<String>,
}

/// A historical render job handed to a worker thread.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub generation: u64,
    pub pivot: NaiveDateTime,
    pub granularity: Granularity,
}

impl RenderRequest {
    pub fn run(&self, source: &dyn HistorySource) -> ChartPayload {
        fetch_chart(source, self.generation, self.pivot, self.granularity)
    }

    /// Run on a worker thread and deliver the result as [`DashEvent::ChartReady`].
    pub fn spawn(self, source: Arc<dyn HistorySource>, tx: Sender<DashEvent>) {
        thread::spawn(move || {
            let payload = self.run(source.as_ref());
            // The loop may already be gone on shutdown.
            let _ = tx.send(DashEvent::ChartReady(payload));
        });
    }
}

#[derive(Debug, Default)]
struct ChartSlot {
    current: Option<HistoryChart>,
    generation: u64,
    pending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Continue,
    Render(RenderRequest),
    Quit,
}

#[derive(Debug)]
pub struct Dashboard {
    machine: SessionMachine,
    session: Option<SessionState>,
    chart: ChartSlot,
    pub live: LiveView,
    pub view: View,
    pub controls: HistoryControls,
    pub status: Option<String>,
}

impl Dashboard {
    pub fn new(machine: SessionMachine, pivot: NaiveDateTime, granularity: Granularity) -> Self {
        Self {
            machine,
            session: None,
            chart: ChartSlot::default(),
            live: LiveView::default(),
            view: View::Live,
            controls: HistoryControls {
                granularity,
                pivot: truncate_pivot(pivot, granularity),
                editing: None,
            },
            status: None,
        }
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn chart(&self) -> Option<&HistoryChart> {
        self.chart.current.as_ref()
    }

    pub fn is_render_pending(&self) -> bool {
        self.chart.pending
    }

    pub fn open_session(&mut self) {
        self.session = Some(SessionState::new());
        self.live = LiveView::default();
    }

    /// Stop mutating live state. Events still queued afterwards are ignored.
    pub fn close_session(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("live session closed");
        }
    }

    pub fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => tracing::info!("live stream connected"),
            ChannelEvent::TransportError(reason) => {
                tracing::warn!(%reason, "live stream transport error")
            }
            ChannelEvent::Message(raw) => {
                let Some(state) = self.session.as_mut() else {
                    tracing::debug!(event = %raw.name, "dropping event, no open session");
                    return;
                };
                match decode(&raw.name, &raw.data) {
                    Ok(StreamMessage::Status(score)) => {
                        let commands = self.machine.apply(state, &score);
                        self.apply_commands(commands, Instant::now());
                    }
                    Ok(StreamMessage::Error(diagnostic)) => {
                        tracing::warn!(%diagnostic, "monitor reported an error");
                        self.live.last_diagnostic = Some(diagnostic);
                    }
                    Err(err) => {
                        tracing::warn!(event = %raw.name, data = %raw.data, %err, "discarding undecodable event")
                    }
                }
            }
        }
    }

    pub fn on_repeat_pulse(&mut self) {
        if let Some(command) = self.machine.poll(self.session.as_ref()) {
            self.apply_commands(vec![command], Instant::now());
        }
    }

    /// Advance effects by `dt` seconds.
    pub fn on_tick(&mut self, dt: f64) {
        self.live.frame = self.live.frame.wrapping_add(1);
        self.live.transform.update(dt);
    }

    fn apply_commands(&mut self, commands: Vec<DisplayCommand>, now: Instant) {
        for command in commands {
            match command {
                DisplayCommand::SetScore(score) => self.live.accumulated_score = score,
                DisplayCommand::SetShake(tier) => self.live.shake = tier,
                DisplayCommand::Evolve => {
                    self.live.evolved = true;
                    self.live.shake = ShakeTier::Level0;
                    // Burst from the companion's center; the renderer positions it.
                    self.live.transform.play(0.0, 0.0);
                }
                DisplayCommand::RestartBounce => self.live.bounce.restart(now),
                DisplayCommand::SetPenalties(lines) => self.live.penalties = lines,
            }
        }
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Live => View::History,
            View::History => View::Live,
        };
    }

    pub fn toggle_granularity(&mut self) {
        let granularity = self.controls.granularity.toggled();
        self.controls.granularity = granularity;
        self.controls.pivot = truncate_pivot(self.controls.pivot, granularity);
    }

    /// Move the pivot by whole hours or days.
    pub fn shift_pivot(&mut self, units: i64) {
        let delta = match self.controls.granularity {
            Granularity::Hourly => TimeDelta::hours(units),
            Granularity::Daily => TimeDelta::days(units),
        };
        if let Some(pivot) = self.controls.pivot.checked_add_signed(delta) {
            self.controls.pivot = truncate_pivot(pivot, self.controls.granularity);
        }
    }

    pub fn begin_edit(&mut self) {
        self.controls.editing = Some(self.controls.pivot.format(PIVOT_INPUT_FORMAT).to_string());
    }

    pub fn cancel_edit(&mut self) {
        self.controls.editing = None;
    }

    /// Apply the typed pivot. Returns false when the text does not parse.
    pub fn commit_edit(&mut self) -> bool {
        let Some(text) = self.controls.editing.take() else {
            return false;
        };
        match parse_pivot(&text) {
            Some(pivot) => {
                self.controls.pivot = truncate_pivot(pivot, self.controls.granularity);
                self.status = None;
                true
            }
            None => {
                tracing::warn!(input = %text, "unparseable pivot");
                self.status = Some(format!("cannot read '{text}', expected YYYY-MM-DDTHH:MM"));
                false
            }
        }
    }

    /// Dispose of the current chart and describe the job that replaces it.
    pub fn request_render(&mut self) -> RenderRequest {
        if let Some(chart) = self.chart.current.take() {
            chart.dispose();
        }
        self.chart.generation += 1;
        self.chart.pending = true;

        let granularity = self.controls.granularity;
        let pivot = truncate_pivot(self.controls.pivot, granularity);
        self.controls.pivot = pivot;
        tracing::debug!(generation = self.chart.generation, %pivot, %granularity, "render requested");

        RenderRequest {
            generation: self.chart.generation,
            pivot,
            granularity,
        }
    }

    pub fn on_chart_ready(&mut self, payload: ChartPayload) {
        if payload.generation != self.chart.generation {
            tracing::debug!(
                got = payload.generation,
                want = self.chart.generation,
                "ignoring superseded chart"
            );
            return;
        }
        self.chart.pending = false;

        match HistoryChart::build(&payload) {
            Ok(chart) => {
                if chart.is_empty() {
                    self.status = Some("no data for this period".to_string());
                } else {
                    self.status = None;
                }
                self.chart.current = Some(chart);
            }
            Err(err) => {
                tracing::error!(%err, "cannot render history chart");
                self.status = Some(format!("chart unavailable: {err}"));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        if self.controls.editing.is_some() {
            match key.code {
                KeyCode::Esc => self.cancel_edit(),
                KeyCode::Enter => {
                    self.commit_edit();
                }
                KeyCode::Backspace => {
                    if let Some(text) = self.controls.editing.as_mut() {
                        text.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(text) = self.controls.editing.as_mut() {
                        text.push(c);
                    }
                }
                _ => {}
            }
            return KeyOutcome::Continue;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Tab => self.toggle_view(),
            _ if self.view == View::History => match key.code {
                KeyCode::Char('g') => self.toggle_granularity(),
                KeyCode::Left => self.shift_pivot(-1),
                KeyCode::Right => self.shift_pivot(1),
                KeyCode::Char('e') => self.begin_edit(),
                KeyCode::Enter | KeyCode::Char('p') => {
                    return KeyOutcome::Render(self.request_render())
                }
                _ => {}
            },
            _ => {}
        }
        KeyOutcome::Continue
    }
}

/// Accepts `YYYY-MM-DDTHH:MM[:SS]`, the same with a space, or a bare date.
pub fn parse_pivot(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
