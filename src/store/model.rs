//! Record types held by the store and the field selectors used to sort them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A single user entry in the collection.
///
/// Fields this crate does not interpret are kept in `extra` and written back
/// unchanged when the record is serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Everything a new user needs except its id, which the store assigns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserDraft {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            extra: Map::new(),
        }
    }

    pub(crate) fn into_user(self, id: i64) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            extra: without_builtin_keys(self.extra),
        }
    }
}

/// Partial update: only the fields that are set get merged into the record.
///
/// The id is deliberately absent; ids never change after assignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub extra: Map<String, Value>,
}

impl UserPatch {
    pub fn first_name(mut self, v: impl Into<String>) -> Self {
        self.first_name = Some(v.into());
        self
    }

    pub fn last_name(mut self, v: impl Into<String>) -> Self {
        self.last_name = Some(v.into());
        self
    }

    pub fn email(mut self, v: impl Into<String>) -> Self {
        self.email = Some(v.into());
        self
    }

    /// Set an extra field. Built-in names go to their typed setter and `id`
    /// is ignored.
    pub fn extra(mut self, key: impl Into<String>, v: Value) -> Self {
        let key = key.into();
        match key.as_str() {
            "id" => {}
            "firstName" => self.first_name = Some(value_text(v)),
            "lastName" => self.last_name = Some(value_text(v)),
            "email" => self.email = Some(value_text(v)),
            _ => {
                self.extra.insert(key, v);
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.extra.is_empty()
    }

    pub(crate) fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        for (k, v) in &self.extra {
            if !is_builtin_key(k) {
                user.extra.insert(k.clone(), v.clone());
            }
        }
    }
}

/// Wire names of the typed `User` fields. These never live in `extra`,
/// otherwise serialization would emit the key twice.
const BUILTIN_KEYS: [&str; 4] = ["id", "firstName", "lastName", "email"];

fn is_builtin_key(key: &str) -> bool {
    BUILTIN_KEYS.contains(&key)
}

fn without_builtin_keys(mut extra: Map<String, Value>) -> Map<String, Value> {
    extra.retain(|k, _| !is_builtin_key(k));
    extra
}

fn value_text(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Field the derived views are ordered by.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    Id,
    FirstName,
    LastName,
    Email,
    /// Any other field present on the records.
    Extra(String),
}

impl SortField {
    /// Next built-in field; extra fields cycle back to `Id`.
    pub fn next(&self) -> SortField {
        match self {
            SortField::Id => SortField::FirstName,
            SortField::FirstName => SortField::LastName,
            SortField::LastName => SortField::Email,
            SortField::Email | SortField::Extra(_) => SortField::Id,
        }
    }
}

impl Display for SortField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortField::Id => f.write_str("id"),
            SortField::FirstName => f.write_str("firstName"),
            SortField::LastName => f.write_str("lastName"),
            SortField::Email => f.write_str("email"),
            SortField::Extra(name) => f.write_str(name),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("empty sort field".to_string()),
            "id" => Ok(SortField::Id),
            "firstName" | "first_name" => Ok(SortField::FirstName),
            "lastName" | "last_name" => Ok(SortField::LastName),
            "email" => Ok(SortField::Email),
            other => Ok(SortField::Extra(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

/// Parse `field` or `field:order` as used by the config file and `--sort`.
pub fn parse_sort_spec(spec: &str) -> Result<(SortField, SortOrder), String> {
    let mut parts = spec.splitn(2, ':');
    let field = parts.next().unwrap_or("").parse::<SortField>()?;
    let order = match parts.next() {
        Some(o) => o.parse::<SortOrder>()?,
        None => SortOrder::Asc,
    };
    Ok((field, order))
}
