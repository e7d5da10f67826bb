use ratatui::{buffer::Buffer, layout::Rect};

use crate::controller::{Dashboard, View};
use crate::ui::{history::render_history, live::render_live};

/// A UI Screen boundary: draws one view of the dashboard into the body area
pub trait Screen {
    fn title(&self) -> &'static str;
    fn render(&self, dashboard: &Dashboard, area: Rect, buf: &mut Buffer);
}

/// Live companion and score panel
pub struct LiveScreen;

impl Screen for LiveScreen {
    fn title(&self) -> &'static str {
        "Live"
    }

    fn render(&self, dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
        render_live(dashboard, area, buf);
    }
}

/// Period controls and history chart
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn title(&self) -> &'static str {
        "History"
    }

    fn render(&self, dashboard: &Dashboard, area: Rect, buf: &mut Buffer) {
        render_history(dashboard, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current view
pub fn current_screen(view: View) -> Box<dyn Screen> {
    match view {
        View::Live => Box::new(LiveScreen),
        View::History => Box::new(HistoryScreen),
    }
}
