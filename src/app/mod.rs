//! Application state types and entry glue.
//!
//! Defines the enums and structs that model the TUI state around a
//! [`UserStore`], plus helpers to construct defaults and to run the
//! application loop (re-exported as `run`).
//!
pub mod keymap;
pub mod update;
pub mod viewconf;

use ratatui::style::Color;
use std::path::PathBuf;

use crate::store::{User, UserDraft, UserPatch, UserStore};
use keymap::Keymap;
use viewconf::{ThemeName, ViewConfig};

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error_fg: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error_fg: Color::Red,
        }
    }

    /// Catppuccin Mocha palette.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error_fg: Color::Rgb(0xf3, 0x8b, 0xa8),     // red
        }
    }

    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Mocha => Self::mocha(),
        }
    }
}

/// Fields of the add/edit form, in tab order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormField {
    FirstName,
    LastName,
    Email,
}

impl FormField {
    pub const ALL: [FormField; 3] = [FormField::FirstName, FormField::LastName, FormField::Email];

    pub fn label(self) -> &'static str {
        match self {
            FormField::FirstName => "First name",
            FormField::LastName => "Last name",
            FormField::Email => "Email",
        }
    }

    pub fn next(self) -> Self {
        match self {
            FormField::FirstName => FormField::LastName,
            FormField::LastName => FormField::Email,
            FormField::Email => FormField::FirstName,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::FirstName => FormField::Email,
            FormField::LastName => FormField::FirstName,
            FormField::Email => FormField::LastName,
        }
    }
}

/// Text entered in the add/edit dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserForm {
    /// `Some(id)` when editing an existing record, `None` for a new one.
    pub editing: Option<i64>,
    pub focus: FormField,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserForm {
    pub fn blank() -> Self {
        Self {
            editing: None,
            focus: FormField::FirstName,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self {
            editing: Some(user.id),
            focus: FormField::FirstName,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Email => &self.email,
        }
    }

    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Email => &mut self.email,
        }
    }

    pub fn to_draft(&self) -> UserDraft {
        UserDraft::new(
            self.first_name.trim(),
            self.last_name.trim(),
            self.email.trim(),
        )
    }

    /// Patch holding only the fields that differ from `current`.
    pub fn to_patch(&self, current: &User) -> UserPatch {
        let mut patch = UserPatch::default();
        if self.first_name.trim() != current.first_name {
            patch = patch.first_name(self.first_name.trim());
        }
        if self.last_name.trim() != current.last_name {
            patch = patch.last_name(self.last_name.trim());
        }
        if self.email.trim() != current.email {
            patch = patch.email(self.email.trim());
        }
        patch
    }
}

/// Modal dialog states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    Form(UserForm),
    DeleteConfirm {
        id: i64,
        /// 0 = Delete, 1 = Cancel
        selected: usize,
    },
    Info {
        message: String,
    },
}

pub struct AppState {
    pub store: UserStore,
    pub input_mode: InputMode,
    /// Index of the highlighted row within the current page.
    pub selected: usize,
    pub modal: Option<ModalState>,
    pub theme: Theme,
    pub keymap: Keymap,
    /// Last message for the status bar, e.g. the outcome of a load.
    pub status: Option<String>,
    /// Where records come from, shown in the header.
    pub source_label: String,
}

impl AppState {
    /// Create an `AppState` with an empty store shaped by `cfg`.
    pub fn new(cfg: &ViewConfig) -> Self {
        let mut store = UserStore::new();
        store.set_items_per_page(cfg.items_per_page);
        store.set_sorting(cfg.sort_field.clone(), cfg.sort_order);
        let keymap = cfg
            .keybinds
            .as_deref()
            .and_then(Keymap::from_file)
            .unwrap_or_default();
        Self {
            store,
            input_mode: InputMode::Normal,
            selected: 0,
            modal: None,
            theme: Theme::from_name(cfg.theme),
            keymap,
            status: None,
            source_label: cfg.source.clone(),
        }
    }

    /// The highlighted user on the current page.
    pub fn selected_user(&self) -> Option<&User> {
        self.store.paginated_users().get(self.selected).copied()
    }

    /// Keep the page and the selection inside what currently exists.
    pub fn clamp_view(&mut self) {
        let pages = self.store.total_pages().max(1);
        if self.store.current_page() > pages {
            self.store.set_page(pages);
        }
        let len = self.store.paginated_users().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// Find an existing config file under the standard config locations.
///
/// Checks `$XDG_CONFIG_HOME/userlist-manager/<name>` and then
/// `$HOME/.config/userlist-manager/<name>`.
pub fn config_file_read_path(name: &str) -> Option<String> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME")
        && !dir.is_empty()
    {
        candidates.push(PathBuf::from(dir).join("userlist-manager").join(name));
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.is_empty()
    {
        candidates.push(
            PathBuf::from(home)
                .join(".config")
                .join("userlist-manager")
                .join(name),
        );
    }
    candidates
        .into_iter()
        .find(|p| p.exists())
        .map(|p| p.to_string_lossy().into_owned())
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
