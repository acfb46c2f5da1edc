//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Only Normal mode goes through the keymap; search input and modal forms
//! read raw key codes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Semantic keyboard actions that can be bound to key combinations.
///
/// Several keys may map to the same action (e.g. both 'j' and Down move down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Start typing a search query.
    StartSearch,
    /// Open the form for a new user.
    NewUser,
    /// Open the edit form for the selected user.
    EditSelection,
    /// Ask to delete the selected user.
    DeleteSelection,
    /// Sort by the next field (id, first name, last name, email).
    CycleSortField,
    /// Flip ascending/descending.
    ToggleSortOrder,
    /// Load the records from the source again.
    Reload,
    MoveUp,
    MoveDown,
    PrevPage,
    NextPage,
    FirstPage,
    LastPage,
    /// Ignore this key.
    Ignore,
}

const ALL_ACTIONS: [KeyAction; 15] = [
    KeyAction::Quit,
    KeyAction::StartSearch,
    KeyAction::NewUser,
    KeyAction::EditSelection,
    KeyAction::DeleteSelection,
    KeyAction::CycleSortField,
    KeyAction::ToggleSortOrder,
    KeyAction::Reload,
    KeyAction::MoveUp,
    KeyAction::MoveDown,
    KeyAction::PrevPage,
    KeyAction::NextPage,
    KeyAction::FirstPage,
    KeyAction::LastPage,
    KeyAction::Ignore,
];

/// Maps `(KeyModifiers, KeyCode)` pairs to [`KeyAction`]s.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Create a keymap with default keybindings (arrows plus vim-style hjkl).
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::CONTROL, Char('c')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('n')), KeyAction::NewUser);
        bindings.insert((M::NONE, Char('e')), KeyAction::EditSelection);
        bindings.insert((M::NONE, Enter), KeyAction::EditSelection);
        bindings.insert((M::NONE, Delete), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Char('d')), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Char('s')), KeyAction::CycleSortField);
        bindings.insert((M::NONE, Char('o')), KeyAction::ToggleSortOrder);
        bindings.insert((M::NONE, Char('r')), KeyAction::Reload);

        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Left), KeyAction::PrevPage);
        bindings.insert((M::NONE, Right), KeyAction::NextPage);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('h')), KeyAction::PrevPage);
        bindings.insert((M::NONE, Char('l')), KeyAction::NextPage);
        bindings.insert((M::NONE, PageUp), KeyAction::PrevPage);
        bindings.insert((M::NONE, PageDown), KeyAction::NextPage);
        bindings.insert((M::NONE, Home), KeyAction::FirstPage);
        bindings.insert((M::NONE, End), KeyAction::LastPage);

        Self { bindings }
    }

    /// Load a keymap from a configuration file, starting from the defaults.
    ///
    /// The file uses the format `<Action> = <KeySpec>`; lines that don't parse
    /// are skipped.
    ///
    /// # Returns
    ///
    /// `Some(keymap)` if the file exists and is readable; `None` otherwise.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let lhs = parts.next().map(|s| s.trim()).unwrap_or("");
            let rhs = parts.next().map(|s| s.trim()).unwrap_or("");
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
            }
        }
        map
    }

    /// Write every binding to `path`, grouped by action, for reference or editing.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# userlist-manager keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Enter, Esc, Up, Down, Left, Right, PageUp, PageDown, Home, End, Delete, /\n\n");

        for action in ALL_ACTIONS {
            let mut keys: Vec<String> = self
                .bindings
                .iter()
                .filter(|(_, a)| **a == action)
                .map(|((m, c), _)| Self::format_key(*m, *c))
                .collect();
            keys.sort();
            for k in keys {
                let _ = writeln!(&mut buf, "{} = {}", format_action(action), k);
            }
        }

        std::fs::write(path, buf)
    }

    /// Resolve a key event to its action, if bound.
    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// First key bound to `action`, formatted for display in hints.
    pub fn hint(&self, action: KeyAction) -> String {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((m, c), _)| Self::format_key(*m, *c))
            .collect();
        keys.sort_by_key(|k| (k.len(), k.clone()));
        keys.into_iter().next().unwrap_or_else(|| "-".to_string())
    }

    /// Format a key into a spec like "Ctrl+q" or "PageDown".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Home => "Home".to_string(),
            End => "End".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let mut rest = s;
    let mut mods = KeyModifiers::NONE;
    if let Some(after) = s.strip_prefix("Ctrl+") {
        mods |= KeyModifiers::CONTROL;
        rest = after;
    }
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Home" => Home,
        "End" => End,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    ALL_ACTIONS
        .into_iter()
        .find(|a| format_action(*a) == s.trim())
}

pub fn format_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::StartSearch => "StartSearch",
        KeyAction::NewUser => "NewUser",
        KeyAction::EditSelection => "EditSelection",
        KeyAction::DeleteSelection => "DeleteSelection",
        KeyAction::CycleSortField => "CycleSortField",
        KeyAction::ToggleSortOrder => "ToggleSortOrder",
        KeyAction::Reload => "Reload",
        KeyAction::MoveUp => "MoveUp",
        KeyAction::MoveDown => "MoveDown",
        KeyAction::PrevPage => "PrevPage",
        KeyAction::NextPage => "NextPage",
        KeyAction::FirstPage => "FirstPage",
        KeyAction::LastPage => "LastPage",
        KeyAction::Ignore => "Ignore",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(mods: KeyModifiers, code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn defaults_resolve_vim_and_arrow_keys() {
        let km = Keymap::default();
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Char('j'))), Some(KeyAction::MoveDown));
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Right)), Some(KeyAction::NextPage));
        assert_eq!(km.resolve(&key(KeyModifiers::CONTROL, KeyCode::Char('c'))), Some(KeyAction::Quit));
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Char('z'))), None);
    }

    #[test]
    fn parse_overrides_and_skips_garbage() {
        let km = Keymap::parse("Reload = Ctrl+r\nNotAnAction = x\nQuit = TooLong\n");
        assert_eq!(km.resolve(&key(KeyModifiers::CONTROL, KeyCode::Char('r'))), Some(KeyAction::Reload));
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Char('x'))), None);
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Char('q'))), Some(KeyAction::Quit));
    }

    #[test]
    fn hint_prefers_shortest_key() {
        let km = Keymap::default();
        assert_eq!(km.hint(KeyAction::StartSearch), "/");
        assert_eq!(km.hint(KeyAction::DeleteSelection), "d");
    }
}
