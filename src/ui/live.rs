use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::controller::{Dashboard, LiveView};
use crate::effects::TransformEffect;
use crate::session::ShakeTier;

const EGG: [&str; 5] = [
    "  .-\"\"-.  ",
    " /      \\ ",
    "|  o  o  |",
    "|   --   |",
    " \\______/ ",
];

const CREATURE: [&str; 5] = [
    "  /\\__/\\  ",
    " ( ^  ^ ) ",
    " (  ww  ) ",
    " /|    |\\ ",
    "(_|____|_)",
];

const SPARK_COLORS: [Color; 7] = [
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::Red,
    Color::Blue,
    Color::LightYellow,
];

/// Horizontal shake offset for a frame: 0, +a, 0, -a, ...
pub fn shake_offset(tier: ShakeTier, frame: u64) -> i32 {
    let a = tier.amplitude() as i32;
    match frame % 4 {
        1 => a,
        3 => -a,
        _ => 0,
    }
}

pub fn render_live(dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_companion(&dashboard.live, chunks[0], buf);
    render_scoreboard(dashboard, chunks[1], buf);
}

fn render_companion(live: &LiveView, area: Rect, buf: &mut Buffer) {
    let title = if live.evolved { "Companion" } else { "Egg" };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    block.render(area, buf);

    let sprite: &[&str] = if live.evolved { &CREATURE } else { &EGG };
    let sprite_width = sprite.iter().map(|l| l.width()).max().unwrap_or(0) as i32;
    let sprite_height = sprite.len() as i32;

    let dx = if live.evolved {
        0
    } else {
        shake_offset(live.shake, live.frame)
    };
    let lift = live.bounce.lift(Instant::now()) as i32;

    let left = inner.x as i32 + (inner.width as i32 - sprite_width) / 2 + dx;
    let top = inner.y as i32 + (inner.height as i32 - sprite_height) / 2 - lift;

    let style = if live.evolved {
        Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD)
    } else {
        match live.shake {
            ShakeTier::Level3 => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ShakeTier::Level2 => Style::default().fg(Color::LightRed),
            ShakeTier::Level1 => Style::default().fg(Color::Yellow),
            ShakeTier::Level0 => Style::default().fg(Color::White),
        }
    };

    for (row, line) in sprite.iter().enumerate() {
        let y = top + row as i32;
        if y < inner.y as i32 || y >= inner.bottom() as i32 {
            continue;
        }
        for (col, ch) in line.chars().enumerate() {
            let x = left + col as i32;
            if ch == ' ' || x < inner.x as i32 || x >= inner.right() as i32 {
                continue;
            }
            if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
                cell.set_char(ch);
                cell.set_style(style);
            }
        }
    }

    if live.transform.is_active {
        let center_x = inner.x as f64 + inner.width as f64 / 2.0;
        let center_y = inner.y as f64 + inner.height as f64 / 2.0;
        render_sparks(&live.transform, center_x, center_y, inner, buf);
    }
}

/// Draw sparks around `(center_x, center_y)`, clipped to `clip`.
fn render_sparks(effect: &TransformEffect, center_x: f64, center_y: f64, clip: Rect, buf: &mut Buffer) {
    for spark in &effect.sparks {
        let x = (center_x + spark.x).round();
        let y = (center_y + spark.y).round();
        if x < clip.x as f64 || y < clip.y as f64 || x >= clip.right() as f64 || y >= clip.bottom() as f64 {
            continue;
        }

        let color = SPARK_COLORS[spark.color_index % SPARK_COLORS.len()];
        let life = spark.life();
        let style = if life > 0.6 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if life > 0.25 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
            cell.set_char(spark.symbol);
            cell.set_style(style);
        }
    }
}

fn render_scoreboard(dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
    let live = &dashboard.live;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // progress
            Constraint::Length(3), // state
            Constraint::Min(3),    // penalties
            Constraint::Length(3), // diagnostics
        ])
        .split(area);

    let threshold = dashboard.machine().evolution_threshold();
    let ratio = (live.accumulated_score / threshold).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Accumulated"))
        .gauge_style(if live.evolved {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Magenta)
        })
        .ratio(ratio)
        .label(format!("{:.0} / {:.0}", live.accumulated_score, threshold));
    gauge.render(chunks[0], buf);

    let state_line = match dashboard.session() {
        None => Span::styled("not connected", Style::default().fg(Color::DarkGray)),
        Some(s) if s.is_evolved() && s.is_active() => {
            Span::styled("evolved · focused!", bold.fg(Color::LightGreen))
        }
        Some(s) if s.is_evolved() => Span::styled("evolved · resting", bold.fg(Color::Green)),
        Some(_) => Span::styled(
            match live.shake {
                ShakeTier::Level0 => "incubating",
                ShakeTier::Level1 => "wobbling",
                ShakeTier::Level2 => "shaking",
                ShakeTier::Level3 => "about to hatch",
            },
            bold.fg(Color::Yellow),
        ),
    };
    Paragraph::new(Line::from(state_line))
        .block(Block::default().borders(Borders::ALL).title("State"))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let penalties: Vec<Line> = live
        .penalties
        .iter()
        .map(|p| Line::from(Span::styled(format!("• {p}"), Style::default().fg(Color::LightRed))))
        .collect();
    Paragraph::new(penalties)
        .block(Block::default().borders(Borders::ALL).title("Penalties"))
        .render(chunks[2], buf);

    let diagnostic = live.last_diagnostic.as_deref().unwrap_or("-");
    Paragraph::new(Span::styled(
        diagnostic.to_string(),
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
    ))
    .block(Block::default().borders(Borders::ALL).title("Monitor"))
    .wrap(Wrap { trim: true })
    .render(chunks[3], buf);
}
