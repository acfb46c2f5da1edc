use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;
use tracing::info;

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState, UserForm};
use crate::loader::BackgroundLoader;
use crate::store::LoadOutcome;
use crate::ui;

/// What the event loop should do after a key press was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    Reload,
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
    loader: &mut BackgroundLoader,
) -> Result<()> {
    request_load(app, loader);

    loop {
        if let Some(outcome) = loader.poll(&mut app.store) {
            apply_load_outcome(app, outcome);
        }

        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match handle_key(app, key) {
                Effect::Quit => break,
                Effect::Reload => request_load(app, loader),
                Effect::None => {}
            }
        }
    }
    info!("quit");
    Ok(())
}

/// Start a background load unless one is already running.
pub fn request_load(app: &mut AppState, loader: &BackgroundLoader) {
    if loader.request(&mut app.store) {
        app.status = Some(format!("loading {} ...", loader.describe()));
    } else {
        app.status = Some("a load is already in progress".to_string());
    }
}

/// Reflect a finished load in the status bar and keep the view in range.
pub fn apply_load_outcome(app: &mut AppState, outcome: LoadOutcome) {
    let status = match outcome {
        LoadOutcome::Loaded { count, dropped: 0 } => format!("loaded {count} users"),
        LoadOutcome::Loaded { count, dropped } => {
            format!("loaded {count} users ({dropped} skipped: duplicate id)")
        }
        LoadOutcome::Failed(e) => {
            if app.modal.is_none() {
                open_modal(
                    app,
                    ModalState::Info {
                        message: format!("Could not load users:\n{e}\n\nPress any key."),
                    },
                );
            }
            format!("load failed: {e}")
        }
        LoadOutcome::AlreadyLoading => "a load is already in progress".to_string(),
        LoadOutcome::Stale => "ignored an outdated load result".to_string(),
    };
    app.status = Some(status);
    app.clamp_view();
}

/// Route a key press according to the current input mode.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Effect {
    match app.input_mode {
        InputMode::Normal => handle_normal(app, key),
        InputMode::Search => handle_search(app, key),
        InputMode::Modal => {
            handle_modal(app, key);
            Effect::None
        }
    }
}

fn handle_normal(app: &mut AppState, key: KeyEvent) -> Effect {
    let Some(action) = app.keymap.resolve(&key) else {
        return Effect::None;
    };
    match action {
        KeyAction::Quit => return Effect::Quit,
        KeyAction::Reload => return Effect::Reload,
        KeyAction::StartSearch => app.input_mode = InputMode::Search,
        KeyAction::NewUser => open_modal(app, ModalState::Form(UserForm::blank())),
        KeyAction::EditSelection => {
            if let Some(form) = app.selected_user().map(UserForm::for_user) {
                open_modal(app, ModalState::Form(form));
            }
        }
        KeyAction::DeleteSelection => {
            if let Some(id) = app.selected_user().map(|u| u.id) {
                open_modal(app, ModalState::DeleteConfirm { id, selected: 1 });
            }
        }
        KeyAction::CycleSortField => {
            let next = app.store.sort_field().next();
            let order = app.store.sort_order();
            app.store.set_sorting(next, order);
            app.selected = 0;
        }
        KeyAction::ToggleSortOrder => {
            let field = app.store.sort_field().clone();
            let order = app.store.sort_order().toggle();
            app.store.set_sorting(field, order);
            app.selected = 0;
        }
        KeyAction::MoveUp => app.selected = app.selected.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected + 1 < app.store.paginated_users().len() {
                app.selected += 1;
            }
        }
        KeyAction::PrevPage => {
            let page = app.store.current_page();
            if page > 1 {
                app.store.set_page(page - 1);
                app.selected = 0;
            }
        }
        KeyAction::NextPage => {
            let page = app.store.current_page();
            if page < app.store.total_pages() {
                app.store.set_page(page + 1);
                app.selected = 0;
            }
        }
        KeyAction::FirstPage => {
            app.store.set_page(1);
            app.selected = 0;
        }
        KeyAction::LastPage => {
            app.store.set_page(app.store.total_pages().max(1));
            app.selected = 0;
        }
        KeyAction::Ignore => {}
    }
    Effect::None
}

fn handle_search(app: &mut AppState, key: KeyEvent) -> Effect {
    // Modified keys are never text; the quit binding (Ctrl+c) still applies.
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return match app.keymap.resolve(&key) {
            Some(KeyAction::Quit) => Effect::Quit,
            _ => Effect::None,
        };
    }
    match key.code {
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.store.set_search_query("");
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            let mut q = app.store.search_query().to_string();
            q.pop();
            app.store.set_search_query(q);
        }
        KeyCode::Char(c) => {
            let q = format!("{}{}", app.store.search_query(), c);
            app.store.set_search_query(q);
        }
        _ => return Effect::None,
    }
    app.selected = 0;
    Effect::None
}

fn handle_modal(app: &mut AppState, key: KeyEvent) {
    let Some(modal) = app.modal.take() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    let next = match modal {
        ModalState::Form(form) => handle_form(app, form, key),
        ModalState::DeleteConfirm { id, selected } => match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                Some(ModalState::DeleteConfirm { id, selected: 1 - selected.min(1) })
            }
            KeyCode::Char('y') => {
                delete_user(app, id);
                None
            }
            KeyCode::Enter => {
                if selected == 0 {
                    delete_user(app, id);
                }
                None
            }
            KeyCode::Esc | KeyCode::Char('n') => None,
            _ => Some(ModalState::DeleteConfirm { id, selected }),
        },
        ModalState::Info { .. } => None,
    };
    match next {
        Some(m) => app.modal = Some(m),
        None => app.input_mode = InputMode::Normal,
    }
}

fn handle_form(app: &mut AppState, mut form: UserForm, key: KeyEvent) -> Option<ModalState> {
    match key.code {
        KeyCode::Esc => return None,
        KeyCode::Enter => {
            submit_form(app, &form);
            return None;
        }
        KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
        KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
        KeyCode::Backspace => {
            form.focused_mut().pop();
        }
        KeyCode::Char(c) => form.focused_mut().push(c),
        _ => {}
    }
    Some(ModalState::Form(form))
}

fn submit_form(app: &mut AppState, form: &UserForm) {
    match form.editing {
        Some(id) => {
            let Some(patch) = app.store.get(id).map(|u| form.to_patch(u)) else {
                app.status = Some(format!("user #{id} no longer exists"));
                return;
            };
            if patch.is_empty() {
                app.status = Some("nothing changed".to_string());
                return;
            }
            app.store.update(id, &patch);
            app.status = Some(format!("updated user #{id}"));
            focus_user(app, id);
        }
        None => match app.store.add(form.to_draft()) {
            Some(id) => {
                app.status = Some(format!("added user #{id}"));
                focus_user(app, id);
            }
            None => app.status = Some("no id left to assign; user not added".to_string()),
        },
    }
}

fn delete_user(app: &mut AppState, id: i64) {
    app.status = Some(match app.store.delete(id) {
        Some(u) => format!("deleted user #{} ({} {})", u.id, u.first_name, u.last_name),
        None => format!("user #{id} no longer exists"),
    });
    app.clamp_view();
}

/// Move page and selection to `id` if it is visible under the current search.
fn focus_user(app: &mut AppState, id: i64) {
    let per_page = app.store.items_per_page();
    let pos = app.store.filtered_users().iter().position(|u| u.id == id);
    match pos {
        Some(pos) => {
            app.store.set_page(pos / per_page + 1);
            app.selected = pos % per_page;
        }
        None => app.clamp_view(),
    }
}

fn open_modal(app: &mut AppState, modal: ModalState) {
    app.modal = Some(modal);
    app.input_mode = InputMode::Modal;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::viewconf::ViewConfig;
    use crate::store::UserDraft;

    fn press(app: &mut AppState, code: KeyCode) -> Effect {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn mk_app(n: usize) -> AppState {
        let mut app = AppState::new(&ViewConfig::default());
        for i in 0..n {
            app.store.add(UserDraft::new(
                format!("First{i}"),
                format!("Last{i}"),
                format!("user{i}@example.com"),
            ));
        }
        app
    }

    #[test]
    fn quit_and_reload_are_effects() {
        let mut app = mk_app(0);
        assert_eq!(press(&mut app, KeyCode::Char('r')), Effect::Reload);
        assert_eq!(press(&mut app, KeyCode::Char('q')), Effect::Quit);
    }

    #[test]
    fn search_typing_filters_live_and_esc_clears() {
        let mut app = mk_app(12);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.store.current_page(), 2);

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Search);
        type_text(&mut app, "first1");
        assert_eq!(app.store.current_page(), 1);
        // First1, First10, First11
        assert_eq!(app.store.filtered_count(), 3);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.store.search_query(), "");
        assert_eq!(app.store.filtered_count(), 12);
    }

    #[test]
    fn ctrl_c_quits_from_search_without_typing() {
        let mut app = mk_app(3);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "fi");
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut app, ctrl_c), Effect::Quit);
        assert_eq!(app.store.search_query(), "fi");

        let ctrl_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut app, ctrl_x), Effect::None);
        assert_eq!(app.store.search_query(), "fi");
    }

    #[test]
    fn next_page_stops_at_last_page() {
        let mut app = mk_app(25);
        for _ in 0..5 {
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(app.store.current_page(), 3);
        assert_eq!(app.store.paginated_users().len(), 5);
        press(&mut app, KeyCode::Home);
        assert_eq!(app.store.current_page(), 1);
    }

    #[test]
    fn new_user_form_adds_record_and_focuses_it() {
        let mut app = mk_app(10);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.input_mode, InputMode::Modal);
        type_text(&mut app, "Zoe");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Quinn");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "zoe@example.com");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.modal.is_none());
        let user = app.store.get(11).expect("new user");
        assert_eq!(user.first_name, "Zoe");
        assert_eq!(user.last_name, "Quinn");
        assert_eq!(app.store.current_page(), 2);
        assert_eq!(app.selected_user().map(|u| u.id), Some(11));
    }

    #[test]
    fn edit_form_patches_selected_user() {
        let mut app = mk_app(3);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "X");
        press(&mut app, KeyCode::Enter);

        let user = app.store.get(2).unwrap();
        assert_eq!(user.first_name, "First1");
        assert_eq!(user.last_name, "LastX");
        assert_eq!(app.status.as_deref(), Some("updated user #2"));
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = mk_app(3);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.records().len(), 3);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.records().len(), 2);
        assert!(app.store.get(1).is_none());
    }

    #[test]
    fn deleting_last_row_of_last_page_steps_back() {
        let mut app = mk_app(11);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.store.current_page(), 2);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.store.current_page(), 1);
        assert_eq!(app.store.total_pages(), 1);
    }

    #[test]
    fn sort_keys_cycle_field_and_order() {
        let mut app = mk_app(3);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.store.sort_field().to_string(), "firstName");
        press(&mut app, KeyCode::Char('o'));
        let ids: Vec<i64> = app.store.paginated_users().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn failed_load_is_reported_in_status() {
        let mut app = mk_app(2);
        let ticket = app.store.begin_load().unwrap();
        let err = serde_json::from_str::<Vec<crate::store::User>>("[").unwrap_err();
        let outcome = app.store.finish_load(ticket, Err(err.into()));
        apply_load_outcome(&mut app, outcome);
        assert!(app.status.as_deref().unwrap_or("").starts_with("load failed"));
        assert!(matches!(app.modal, Some(ModalState::Info { .. })));
        assert_eq!(app.store.records().len(), 2);

        press(&mut app, KeyCode::Char('x'));
        assert!(app.modal.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }
}
