mod credentials;
mod display;
mod models;

use credentials::{hash_password_off_thread, verify_password_off_thread};
pub use credentials::{hash_password, verify_password};
pub use display::{format_expiration, format_expiration_at, ExpirationInfo, ExpirationStatus};
pub use models::{
    AdminAccount, AdminAccountUpdate, AppConfig, AppConfigUpdate, CookieSetRow, NewAdminAccount,
    NewAppConfig,
};

use std::time::Duration;

use chrono::{Local, SecondsFormat, Utc};
use log::{debug, error};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::{
    cookies::{earliest_expiration, CookieSet},
    error::RemoteError,
};
use models::{
    CookieSetWire, NewAdminAccountWire, NewAppConfigWire, NewCookieSetWire, StoredAdminAccount,
    ADMIN_COLUMNS,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_APP_NAME: &str = "Web App";

#[derive(uniffi::Record, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub cookies: String,
    pub app_config: String,
    pub superusers: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            cookies: "cookies".into(),
            app_config: "app_config".into(),
            superusers: "superusers".into(),
        }
    }
}

impl std::fmt::Debug for TableNames {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.cookies, self.app_config, self.superusers
        )
    }
}

/// Where the shared cookie and configuration tables live.
#[derive(uniffi::Record, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Project base url, `/rest/v1/{table}` is appended.
    pub url: String,
    pub anon_key: String,
    pub tables: TableNames,
}

impl std::fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("tables", &self.tables)
            .finish()
    }
}

fn logged<T>(context: &str, result: Result<T, RemoteError>) -> Result<T, RemoteError> {
    if let Err(e) = &result {
        error!("{context}: {e}");
    }
    result
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// The columns an account update touches, with a new password re-hashed.
async fn account_patch(changes: AdminAccountUpdate) -> Result<Map<String, Value>, RemoteError> {
    let mut patch = Map::new();
    if let Some(username) = changes.username.filter(|u| !u.is_empty()) {
        patch.insert("username".into(), Value::String(username));
    }
    if let Some(password) = changes.password.filter(|p| !p.is_empty()) {
        let hash = hash_password_off_thread(password).await?;
        patch.insert("password".into(), Value::String(hash));
    }
    if let Some(email) = changes.email {
        let email = if email.is_empty() {
            Value::Null
        } else {
            Value::String(email)
        };
        patch.insert("email".into(), email);
    }
    if let Some(is_active) = changes.is_active {
        patch.insert("is_active".into(), Value::Bool(is_active));
    }
    Ok(patch)
}

/// A thin PostgREST client for the shared tables. Every call reports failure
/// as an error, "no rows" is `Ok(None)` or an empty list.
#[derive(Debug, Clone)]
pub struct RemoteBridge {
    client: Client,
    base: String,
    tables: TableNames,
}

impl RemoteBridge {
    pub fn new(settings: &RemoteSettings, timeout: Duration) -> Result<Self, RemoteError> {
        if settings.url.trim().is_empty() || settings.anon_key.trim().is_empty() {
            return Err(RemoteError::NotConfigured);
        }

        let key = HeaderValue::from_str(&settings.anon_key).map_err(|e| RemoteError::Request {
            error: format!("invalid anon key: {e}"),
        })?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", settings.anon_key)).map_err(
            |e| RemoteError::Request {
                error: format!("invalid anon key: {e}"),
            },
        )?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base: settings.url.trim_end_matches('/').to_owned(),
            tables: settings.tables.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base)
    }

    async fn checked(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            code: status.as_u16(),
            message,
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, RemoteError> {
        debug!("GET {table} {query:?}");
        let response = self
            .client
            .get(self.table_url(table))
            .query(query)
            .send()
            .await?;

        Ok(Self::checked(response).await?.json().await?)
    }

    async fn insert<B: Serialize + ?Sized>(&self, table: &str, row: &B) -> Result<(), RemoteError> {
        debug!("POST {table}");
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        Self::checked(response).await.map(drop)
    }

    async fn update<B: Serialize + ?Sized>(
        &self,
        table: &str,
        id: i64,
        changes: &B,
    ) -> Result<(), RemoteError> {
        debug!("PATCH {table} {id}");
        let response = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", eq(id))])
            .header("Prefer", "return=minimal")
            .json(changes)
            .send()
            .await?;

        Self::checked(response).await.map(drop)
    }

    async fn delete(&self, table: &str, id: i64) -> Result<(), RemoteError> {
        debug!("DELETE {table} {id}");
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", eq(id))])
            .send()
            .await?;

        Self::checked(response).await.map(drop)
    }

    async fn cookie_rows(&self, limit: Option<u32>) -> Result<Vec<CookieSetRow>, RemoteError> {
        let mut query = vec![("select", "*".to_owned()), ("order", "created_at.desc".into())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let rows: Vec<CookieSetWire> = self.select(&self.tables.cookies, &query).await?;
        rows.into_iter().map(CookieSetRow::try_from).collect()
    }

    /// The most recently saved cookie set.
    pub async fn fetch_cookies(&self) -> Result<Option<CookieSet>, RemoteError> {
        let latest = self
            .cookie_rows(Some(1))
            .await
            .map(|rows| rows.into_iter().next());

        logged("Error fetching cookies", latest)
            .map(|row| row.map(|row| CookieSet::new(row.records, row.name)))
    }

    pub async fn list_cookie_sets(&self) -> Result<Vec<CookieSetRow>, RemoteError> {
        logged("Error listing cookie sets", self.cookie_rows(None).await)
    }

    /// Stores `set` as a new row. Without a name one is generated from the
    /// local time.
    pub async fn save_cookie_set(
        &self,
        set: &CookieSet,
        name: Option<String>,
    ) -> Result<(), RemoteError> {
        let name = name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| set.name.clone())
            .unwrap_or_else(|| format!("Cookies {}", Local::now().format("%Y-%m-%d %H:%M:%S")));

        let row = NewCookieSetWire {
            name,
            cookies_data: &set.records,
            expires_at: earliest_expiration(&set.records)
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            created_at: now(),
        };

        logged(
            "Error saving cookies",
            self.insert(&self.tables.cookies, &row).await,
        )
    }

    pub async fn delete_cookie_set(&self, id: i64) -> Result<(), RemoteError> {
        logged(
            "Error deleting cookies",
            self.delete(&self.tables.cookies, id).await,
        )
    }

    /// The newest active configuration, if any.
    pub async fn active_app_config(&self) -> Result<Option<AppConfig>, RemoteError> {
        let result = self
            .select::<AppConfig>(
                &self.tables.app_config,
                &[
                    ("select", "*".into()),
                    ("is_active", eq(true)),
                    ("order", "created_at.desc".into()),
                    ("limit", "1".into()),
                ],
            )
            .await
            .map(|rows| rows.into_iter().next());

        logged("Error fetching app config", result)
    }

    pub async fn list_app_configs(&self) -> Result<Vec<AppConfig>, RemoteError> {
        logged(
            "Error listing app configs",
            self.select(
                &self.tables.app_config,
                &[("select", "*".into()), ("order", "created_at.desc".into())],
            )
            .await,
        )
    }

    pub async fn save_app_config(&self, config: NewAppConfig) -> Result<(), RemoteError> {
        let row = NewAppConfigWire {
            app_name: config
                .app_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_APP_NAME.into()),
            app_url: config.app_url,
            is_active: config.is_active.unwrap_or(true),
            created_at: now(),
        };

        logged(
            "Error saving app config",
            self.insert(&self.tables.app_config, &row).await,
        )
    }

    pub async fn update_app_config(
        &self,
        id: i64,
        changes: AppConfigUpdate,
    ) -> Result<(), RemoteError> {
        logged(
            "Error updating app config",
            self.update(&self.tables.app_config, id, &changes).await,
        )
    }

    pub async fn delete_app_config(&self, id: i64) -> Result<(), RemoteError> {
        logged(
            "Error deleting app config",
            self.delete(&self.tables.app_config, id).await,
        )
    }

    /// The active account named `username` if `password` matches its hash.
    pub async fn verify_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AdminAccount>, RemoteError> {
        let result = self
            .select::<StoredAdminAccount>(
                &self.tables.superusers,
                &[
                    ("select", "*".into()),
                    ("username", eq(username)),
                    ("is_active", eq(true)),
                    ("limit", "1".into()),
                ],
            )
            .await;

        let Some(stored) = logged("Error verifying admin", result)?.into_iter().next() else {
            return Ok(None);
        };

        let verified = verify_password_off_thread(password.to_owned(), stored.password).await;
        Ok(verified.then_some(stored.account))
    }

    pub async fn list_admin_accounts(&self) -> Result<Vec<AdminAccount>, RemoteError> {
        logged(
            "Error listing admin accounts",
            self.select(
                &self.tables.superusers,
                &[
                    ("select", ADMIN_COLUMNS.into()),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await,
        )
    }

    pub async fn create_admin_account(&self, account: NewAdminAccount) -> Result<(), RemoteError> {
        let password = logged(
            "Error creating admin account",
            hash_password_off_thread(account.password).await,
        )?;
        let row = NewAdminAccountWire {
            username: account.username,
            password,
            email: account.email.filter(|email| !email.is_empty()),
            is_active: true,
            created_at: now(),
        };

        logged(
            "Error creating admin account",
            self.insert(&self.tables.superusers, &row).await,
        )
    }

    pub async fn update_admin_account(
        &self,
        id: i64,
        changes: AdminAccountUpdate,
    ) -> Result<(), RemoteError> {
        let patch = logged("Error updating admin account", account_patch(changes).await)?;
        if patch.is_empty() {
            return Ok(());
        }

        logged(
            "Error updating admin account",
            self.update(&self.tables.superusers, id, &patch).await,
        )
    }

    pub async fn delete_admin_account(&self, id: i64) -> Result<(), RemoteError> {
        logged(
            "Error deleting admin account",
            self.delete(&self.tables.superusers, id).await,
        )
    }
}
