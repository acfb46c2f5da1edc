//! View configuration: parse/write `userlist.conf`.
//!
//! This module manages the settings that shape the initial view and can be
//! persisted to a configuration file:
//! - Where seed records are loaded from
//! - Page size and initial sort
//! - Color theme and an optional keybindings file

use crate::store::{DEFAULT_ITEMS_PER_PAGE, SortField, SortOrder, parse_sort_spec};

/// Name of the built-in color theme to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemeName {
    Dark,
    #[default]
    Mocha,
}

impl ThemeName {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeName::Dark => "dark",
            ThemeName::Mocha => "mocha",
        }
    }
}

/// Settings loaded from or saved to `userlist.conf`.
///
/// Command-line flags override whatever this holds.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
    /// Path of the JSON file the records are loaded from.
    pub source: String,
    /// Rows per page; always at least 1.
    pub items_per_page: usize,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub theme: ThemeName,
    /// Optional `keybinds.conf` overriding the default keys.
    pub keybinds: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            source: "userList.json".to_string(),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            sort_field: SortField::Id,
            sort_order: SortOrder::Asc,
            theme: ThemeName::Mocha,
            keybinds: None,
        }
    }
}

impl ViewConfig {
    /// Load the configuration from a file, or create defaults if the file doesn't exist.
    ///
    /// If a bare file name is missing, standard config locations are searched
    /// for it. If still not found, defaults are written to `path` for future
    /// customization.
    pub fn load_or_init(path: &str) -> Self {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if p.components().count() == 1
            && let Some(existing) = crate::app::config_file_read_path(path)
        {
            return Self::from_file(&existing).unwrap_or_default();
        }
        let cfg = Self::default();
        if let Err(e) = cfg.write_file(path) {
            tracing::warn!(path, error = %e, "could not write default config");
        }
        cfg
    }

    /// Load the configuration from a file.
    ///
    /// The file uses the format `<key> = <value>`. Comments (lines starting with
    /// '#') and empty lines are ignored, as are unknown keys and invalid values.
    ///
    /// # Returns
    ///
    /// `Some(config)` if the file exists and is readable; `None` otherwise.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Parse configuration text, starting from defaults.
    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let lhs = parts.next().map(|s| s.trim()).unwrap_or("");
            let rhs = parts.next().map(|s| s.trim()).unwrap_or("");
            if lhs.is_empty() || rhs.is_empty() {
                continue;
            }

            match lhs {
                "source" => cfg.source = rhs.to_string(),
                "items_per_page" => {
                    if let Ok(n) = rhs.parse::<usize>()
                        && n > 0
                    {
                        cfg.items_per_page = n;
                    }
                }
                "sort" => match parse_sort_spec(rhs) {
                    Ok((field, order)) => {
                        cfg.sort_field = field;
                        cfg.sort_order = order;
                    }
                    Err(e) => tracing::warn!(value = rhs, error = %e, "ignoring sort setting"),
                },
                "theme" => {
                    cfg.theme = match rhs.to_ascii_lowercase().as_str() {
                        "dark" => ThemeName::Dark,
                        "mocha" => ThemeName::Mocha,
                        _ => cfg.theme,
                    };
                }
                "keybinds" => cfg.keybinds = Some(rhs.to_string()),
                _ => {}
            }
        }
        cfg
    }

    /// Write the configuration to a file in `<key> = <value>` format.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# userlist-manager configuration\n");
        buf.push_str("# Command-line flags take precedence over these values.\n\n");

        let mut kv = |k: &str, v: &str| {
            let _ = writeln!(&mut buf, "{} = {}", k, v);
        };
        kv("source", &self.source);
        kv("items_per_page", &self.items_per_page.to_string());
        kv("sort", &format!("{}:{}", self.sort_field, self.sort_order));
        kv("theme", self.theme.as_str());
        match &self.keybinds {
            Some(p) => kv("keybinds", p),
            None => kv("# keybinds", "keybinds.conf"),
        }

        std::fs::write(path, buf)
    }
}
