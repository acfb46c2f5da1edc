use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, FormField, ModalState};
use crate::store::{SortField, SortOrder};

fn header_label(app: &AppState, field: SortField, label: &str) -> String {
    if *app.store.sort_field() == field {
        let arrow = match app.store.sort_order() {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        };
        format!("{label} {arrow}")
    } else {
        label.to_string()
    }
}

pub fn render_users_table(f: &mut Frame, area: Rect, app: &AppState) {
    let page = app.store.paginated_users();

    let rows = page.iter().enumerate().map(|(i, u)| {
        let style = if i == app.selected {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from(u.id.to_string()),
            Cell::from(u.first_name.clone()),
            Cell::from(u.last_name.clone()),
            Cell::from(u.email.clone()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(25),
        Constraint::Percentage(25),
        Constraint::Percentage(50),
    ];

    let header = Row::new(vec![
        header_label(app, SortField::Id, "ID"),
        header_label(app, SortField::FirstName, "FIRST NAME"),
        header_label(app, SortField::LastName, "LAST NAME"),
        header_label(app, SortField::Email, "EMAIL"),
    ])
    .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let total = app.store.total_pages();
    let title = if app.store.is_loading() {
        "Users (loading...)".to_string()
    } else {
        format!(
            "Users  page {}/{}  ({} matches)",
            app.store.current_page(),
            total.max(1),
            app.store.filtered_count()
        )
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);

    if page.is_empty() && !app.store.is_loading() {
        let msg = if app.store.records().is_empty() {
            "No users loaded."
        } else {
            "No users match the search."
        };
        let inner = Rect {
            x: area.x + 2,
            y: area.y + 2,
            width: area.width.saturating_sub(4),
            height: 1.min(area.height.saturating_sub(3)),
        };
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(app.theme.muted)),
            inner,
        );
    }
}

pub fn render_user_details(f: &mut Frame, area: Rect, app: &AppState) {
    let mut text = String::new();
    if let Some(u) = app.selected_user() {
        text.push_str(&format!(
            "ID: {}\nFirst name: {}\nLast name: {}\nEmail: {}\n",
            u.id, u.first_name, u.last_name, u.email
        ));
        for (k, v) in &u.extra {
            let shown = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            text.push_str(&format!("{k}: {shown}\n"));
        }
    }
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

pub fn render_user_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    match state {
        ModalState::Form(form) => {
            let rect = crate::ui::components::centered_rect(60, 9, area);
            let mut lines = Vec::with_capacity(FormField::ALL.len() + 2);
            for field in FormField::ALL {
                let marker = if field == form.focus { "▶" } else { " " };
                let cursor = if field == form.focus { "_" } else { "" };
                lines.push(format!(
                    "{} {:<11} {}{}",
                    marker,
                    format!("{}:", field.label()),
                    form.value(field),
                    cursor
                ));
            }
            lines.push(String::new());
            lines.push("Tab/Up/Down: field  Enter: save  Esc: cancel".to_string());
            let title = match form.editing {
                Some(id) => format!("Edit user #{id}"),
                None => "New user".to_string(),
            };
            let p = Paragraph::new(lines.join("\n")).block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            );
            f.render_widget(Clear, rect);
            f.render_widget(p, rect);
        }
        ModalState::DeleteConfirm { id, selected } => {
            let rect = crate::ui::components::centered_rect(50, 7, area);
            let name = app
                .store
                .get(*id)
                .map(|u| format!("{} {}", u.first_name, u.last_name))
                .unwrap_or_default();
            let yes = if *selected == 0 { "[Delete]" } else { " Delete " };
            let no = if *selected == 1 { "[Cancel]" } else { " Cancel " };
            let body = format!("Delete user #{id} '{name}'?\n\n  {yes}    {no}");
            let p = Paragraph::new(body).block(
                Block::default()
                    .title("Confirm delete")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.error_fg)),
            );
            f.render_widget(Clear, rect);
            f.render_widget(p, rect);
        }
        ModalState::Info { .. } => { /* routed to components */ }
    }
}
