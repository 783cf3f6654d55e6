use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    cookies::{validate_value, CookieRecord},
    error::RemoteError,
};

/// A stored cookie set as listed to the admin panel.
#[derive(uniffi::Record, Serialize, Clone, Debug, PartialEq)]
pub struct CookieSetRow {
    pub id: i64,
    pub name: Option<String>,
    pub records: Vec<CookieRecord>,
    pub expires_at: Option<String>,
    pub created_at: Option<String>,
}

/// The wire form of a `cookies` row. `cookies_data` is either a JSON array or
/// a string holding one, depending on who wrote the row.
#[derive(Deserialize)]
pub(crate) struct CookieSetWire {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cookies_data: Value,
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl TryFrom<CookieSetWire> for CookieSetRow {
    type Error = RemoteError;

    fn try_from(wire: CookieSetWire) -> Result<Self, Self::Error> {
        let data = match wire.cookies_data {
            Value::String(text) => serde_json::from_str(&text)?,
            other => other,
        };

        let records = validate_value(data).map_err(|e| RemoteError::Decode {
            error: format!("cookie set {}: {e}", wire.id),
        })?;

        Ok(Self {
            id: wire.id,
            name: wire.name,
            records,
            expires_at: wire.expires_at,
            created_at: wire.created_at,
        })
    }
}

#[derive(Serialize)]
pub(crate) struct NewCookieSetWire<'a> {
    pub name: String,
    pub cookies_data: &'a [CookieRecord],
    pub expires_at: Option<String>,
    pub created_at: String,
}

#[derive(uniffi::Record, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub id: i64,
    pub app_name: String,
    pub app_url: String,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(uniffi::Record, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NewAppConfig {
    #[serde(default)]
    pub app_name: Option<String>,
    pub app_url: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(uniffi::Record, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AppConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub(crate) struct NewAppConfigWire {
    pub app_name: String,
    pub app_url: String,
    pub is_active: bool,
    pub created_at: String,
}

/// An admin account without its credential.
#[derive(uniffi::Record, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AdminAccount {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Columns listed to the admin panel, the password hash never leaves the store.
pub(crate) const ADMIN_COLUMNS: &str = "id,username,email,is_active,created_at";

#[derive(Deserialize)]
pub(crate) struct StoredAdminAccount {
    #[serde(flatten)]
    pub account: AdminAccount,
    pub password: String,
}

#[derive(uniffi::Record, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewAdminAccount {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Only the provided fields change. An empty `email` clears it.
#[derive(uniffi::Record, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AdminAccountUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub(crate) struct NewAdminAccountWire {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}
