pub mod components;
pub mod plain;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(root[1]);

    render_header(f, root[0], app);
    users::render_users_table(f, body[0], app);
    users::render_user_details(f, body[1], app);
    components::render_status_bar(f, root[2], app);

    if app.modal.is_some() {
        render_modal(f, f.area(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let km = &app.keymap;
    let prompt = match app.input_mode {
        InputMode::Search => format!("Search: {}_", app.store.search_query()),
        _ if !app.store.search_query().is_empty() => {
            format!("Search: {}", app.store.search_query())
        }
        _ => format!("{}: search", km.hint(KeyAction::StartSearch)),
    };
    let hints = format!(
        "{}: new  {}: edit  {}: delete  {}: sort  {}: order  {}: reload  {}: quit",
        km.hint(KeyAction::NewUser),
        km.hint(KeyAction::EditSelection),
        km.hint(KeyAction::DeleteSelection),
        km.hint(KeyAction::CycleSortField),
        km.hint(KeyAction::ToggleSortOrder),
        km.hint(KeyAction::Reload),
        km.hint(KeyAction::Quit),
    );
    let p = Paragraph::new(format!("{prompt}    {hints}"))
        .block(
            Block::default()
                .title(format!("userlist-manager ({})", app.source_label))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, area);
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    if let Some(state) = &app.modal {
        match state {
            ModalState::Form(_) | ModalState::DeleteConfirm { .. } => {
                users::render_user_modal(f, area, app, state);
            }
            ModalState::Info { .. } => {
                components::render_info_modal(f, area, app, state);
            }
        }
    }
}
