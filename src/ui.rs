pub mod charting;
pub mod history;
pub mod live;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};

use crate::controller::{Dashboard, View};
use screen::current_screen;

const HORIZONTAL_MARGIN: u16 = 1;

impl Widget for &Dashboard {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // tabs
                Constraint::Min(6),    // body
                Constraint::Length(2), // status + legend
            ])
            .split(area);

        render_tabs(self.view, chunks[0], buf);
        current_screen(self.view).render(self, chunks[1], buf);
        render_footer(self, chunks[2], buf);
    }
}

fn render_tabs(view: View, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let selected = bold.fg(Color::Black).bg(Color::Cyan);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let spans: Vec<Span> = [View::Live, View::History]
        .into_iter()
        .flat_map(|v| {
            let title = current_screen(v).title();
            let style = if v == view { selected } else { dim };
            [Span::styled(format!(" {title} "), style), Span::raw(" ")]
        })
        .collect();

    Paragraph::new(Line::from(spans)).render(area, buf);
}

fn render_footer(dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let legend = match (dashboard.view, dashboard.controls.editing.is_some()) {
        (_, true) => "(enter) apply / (esc) cancel",
        (View::Live, false) => "(tab) history / (q) quit",
        (View::History, false) => {
            "(tab) live / (g) hour-day / (←→) move / (e) edit / (enter) plot / (q) quit"
        }
    };

    let mut lines = Vec::with_capacity(2);
    lines.push(match &dashboard.status {
        Some(status) => Line::from(Span::styled(status.clone(), italic.fg(Color::Yellow))),
        None => Line::from(""),
    });
    lines.push(Line::from(Span::styled(legend, italic.add_modifier(Modifier::DIM))));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

/// Draw the whole dashboard into a frame.
pub fn draw(dashboard: &Dashboard, f: &mut Frame) {
    f.render_widget(dashboard, f.area());
}
