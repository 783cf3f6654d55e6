use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;

const DEFAULT_PATH: &str = "/";

/// The `sameSite` vocabulary used by browser cookie exports.
#[derive(uniffi::Enum, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SameSite {
    #[default]
    NoRestriction,
    Lax,
    Strict,
    Unspecified,
}

impl From<String> for SameSite {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "no_restriction" | "none" => SameSite::NoRestriction,
            "lax" => SameSite::Lax,
            "strict" => SameSite::Strict,
            _ => SameSite::Unspecified,
        }
    }
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::NoRestriction => f.write_str("None"),
            SameSite::Lax => f.write_str("Lax"),
            SameSite::Strict => f.write_str("Strict"),
            SameSite::Unspecified => f.write_str("Unspecified"),
        }
    }
}

/// One exported browser cookie.
#[derive(uniffi::Record, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub domain: String,
    pub name: String,
    pub value: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// Seconds since the UNIX epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
    /// Date string form of the expiration, used by some exporters instead of
    /// `expirationDate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

fn default_path() -> String {
    DEFAULT_PATH.to_owned()
}

impl CookieRecord {
    /// The host part of the domain, without the leading "." of domain cookies.
    pub fn host(&self) -> &str {
        self.domain.strip_prefix('.').unwrap_or(&self.domain)
    }
}

#[derive(Clone, Copy)]
enum FieldKind {
    Str,
    Bool,
    Number,
}

const REQUIRED_FIELDS: &[&str] = &["domain", "name", "value"];

const OPTIONAL_FIELDS: &[(&str, FieldKind)] = &[
    ("path", FieldKind::Str),
    ("secure", FieldKind::Bool),
    ("httpOnly", FieldKind::Bool),
    ("sameSite", FieldKind::Str),
    ("expirationDate", FieldKind::Number),
    ("expires", FieldKind::Str),
];

/// Validates the shape of a decoded cookie export and converts it into
/// records. Fails on the first offending element.
pub fn validate_value(value: Value) -> Result<Vec<CookieRecord>, ImportError> {
    let Value::Array(elements) = value else {
        return Err(ImportError::Shape);
    };

    if elements.is_empty() {
        return Err(ImportError::Empty);
    }

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| validate_element(index as u32, element))
        .collect()
}

fn validate_element(index: u32, element: Value) -> Result<CookieRecord, ImportError> {
    let schema_error = |field: &str| ImportError::Schema {
        index,
        field: field.to_owned(),
    };

    let Some(object) = element.as_object() else {
        return Err(schema_error("record"));
    };

    for field in REQUIRED_FIELDS {
        if !object.get(*field).is_some_and(Value::is_string) {
            return Err(schema_error(field));
        }
    }

    for (field, kind) in OPTIONAL_FIELDS {
        let Some(value) = object.get(*field) else {
            continue;
        };
        let well_typed = match kind {
            _ if value.is_null() => true,
            FieldKind::Str => value.is_string(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Number => value.is_number(),
        };
        if !well_typed {
            return Err(schema_error(field));
        }
    }

    // Exporters write explicit nulls, serde only defaults absent keys.
    let mut object = object.clone();
    object.retain(|_, value| !value.is_null());

    let mut record: CookieRecord =
        serde_json::from_value(Value::Object(object)).map_err(|_| schema_error("record"))?;

    if record.path.is_empty() {
        record.path = default_path();
    }

    Ok(record)
}
