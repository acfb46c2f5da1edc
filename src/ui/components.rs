//! Shared UI components (status bar, modal helpers).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{AppState, InputMode, ModalState};

/// Render the bottom status bar with mode, sort, counts and the last message.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let loading = if app.store.is_loading() { "  [loading]" } else { "" };
    let mut msg = format!(
        "mode: {mode}  users:{}  shown:{}  sort:{}:{}  rows/page:{}{loading}",
        app.store.records().len(),
        app.store.filtered_count(),
        app.store.sort_field(),
        app.store.sort_order(),
        app.store.items_per_page(),
    );
    if let Some(status) = &app.status {
        msg.push_str("  | ");
        msg.push_str(status);
    }
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render a generic informational modal dialog.
pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Info { message } = state {
        // Wrap long text; size roughly to the message
        let max_w = area.width.saturating_sub(6).max(30);
        let min_w = 50u16.min(max_w);
        let approx_lines = (message.len() as u16 / (min_w.saturating_sub(4).max(10))).max(1)
            + message.lines().count() as u16;
        let max_h = area.height.saturating_sub(6).max(5);
        let height = (approx_lines + 2).min(max_h).max(5);
        let rect = centered_rect(min_w, height, area);
        let p = Paragraph::new(message.clone())
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(app.theme.text))
            .block(
                Block::default()
                    .title("Info")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.error_fg)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_fits_inside_small_areas() {
        let area = Rect { x: 0, y: 0, width: 30, height: 5 };
        let r = centered_rect(60, 9, area);
        assert_eq!((r.width, r.height), (30, 5));
        let big = Rect { x: 10, y: 4, width: 100, height: 40 };
        let r = centered_rect(60, 10, big);
        assert_eq!((r.x, r.y), (30, 19));
    }
}
