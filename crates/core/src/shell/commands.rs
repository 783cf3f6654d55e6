use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    error::ShellError,
    remote::{
        AdminAccount, AdminAccountUpdate, AppConfig, AppConfigUpdate, CookieSetRow,
        ExpirationInfo, NewAdminAccount, NewAppConfig,
    },
    session::{ApplyReport, ResetReport},
};

/// Everything the page and the admin panel can ask of the shell. On the JSON
/// boundary a command is its kebab-case name plus an object of arguments.
#[derive(uniffi::Enum, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    /// Wipe the live session and the persisted set, then show the entry page.
    ClearSessionAndReload,
    /// Import the export at `path`, or re-apply the persisted set, then show
    /// the target.
    ImportCookiesAndReload {
        #[serde(default)]
        path: Option<String>,
    },
    PasteCookiesFromClipboard,
    /// Adopt the newest remotely stored cookie set.
    UseRemoteCookies,
    GoToWelcomePage,
    GoToTargetPage,
    GetActiveAppConfig,
    AdminVerify {
        username: String,
        password: String,
    },
    AdminGetAllCookies,
    AdminSaveCookies {
        /// Exported cookie JSON, as text or inline.
        #[serde(deserialize_with = "json_text")]
        cookies: String,
        #[serde(default)]
        name: Option<String>,
    },
    AdminDeleteCookies {
        id: i64,
    },
    AdminFormatExpiration {
        #[serde(default)]
        expires_at: Option<String>,
    },
    AdminGetAllConfigs,
    AdminSaveConfig {
        config: NewAppConfig,
    },
    AdminUpdateConfig {
        id: i64,
        config: AppConfigUpdate,
    },
    AdminDeleteConfig {
        id: i64,
    },
    AdminGetAllUsers,
    AdminCreateUser {
        user: NewAdminAccount,
    },
    AdminUpdateUser {
        id: i64,
        user: AdminAccountUpdate,
    },
    AdminDeleteUser {
        id: i64,
    },
}

pub const COMMAND_NAMES: [&str; 20] = [
    "clear-session-and-reload",
    "import-cookies-and-reload",
    "paste-cookies-from-clipboard",
    "use-remote-cookies",
    "go-to-welcome-page",
    "go-to-target-page",
    "get-active-app-config",
    "admin-verify",
    "admin-get-all-cookies",
    "admin-save-cookies",
    "admin-delete-cookies",
    "admin-format-expiration",
    "admin-get-all-configs",
    "admin-save-config",
    "admin-update-config",
    "admin-delete-config",
    "admin-get-all-users",
    "admin-create-user",
    "admin-update-user",
    "admin-delete-user",
];

fn json_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        other => other.to_string(),
    })
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ClearSessionAndReload => "clear-session-and-reload",
            Command::ImportCookiesAndReload { .. } => "import-cookies-and-reload",
            Command::PasteCookiesFromClipboard => "paste-cookies-from-clipboard",
            Command::UseRemoteCookies => "use-remote-cookies",
            Command::GoToWelcomePage => "go-to-welcome-page",
            Command::GoToTargetPage => "go-to-target-page",
            Command::GetActiveAppConfig => "get-active-app-config",
            Command::AdminVerify { .. } => "admin-verify",
            Command::AdminGetAllCookies => "admin-get-all-cookies",
            Command::AdminSaveCookies { .. } => "admin-save-cookies",
            Command::AdminDeleteCookies { .. } => "admin-delete-cookies",
            Command::AdminFormatExpiration { .. } => "admin-format-expiration",
            Command::AdminGetAllConfigs => "admin-get-all-configs",
            Command::AdminSaveConfig { .. } => "admin-save-config",
            Command::AdminUpdateConfig { .. } => "admin-update-config",
            Command::AdminDeleteConfig { .. } => "admin-delete-config",
            Command::AdminGetAllUsers => "admin-get-all-users",
            Command::AdminCreateUser { .. } => "admin-create-user",
            Command::AdminUpdateUser { .. } => "admin-update-user",
            Command::AdminDeleteUser { .. } => "admin-delete-user",
        }
    }

    /// Resets, imports and remote cookie adoption rewrite the live session and
    /// must not interleave.
    pub fn mutates_session(&self) -> bool {
        matches!(
            self,
            Command::ClearSessionAndReload
                | Command::ImportCookiesAndReload { .. }
                | Command::PasteCookiesFromClipboard
                | Command::UseRemoteCookies
        )
    }

    /// Builds a command from its name and a JSON object of arguments. Empty
    /// text and `null` mean no arguments.
    pub fn from_json(name: &str, args: &str) -> Result<Self, ShellError> {
        if !COMMAND_NAMES.contains(&name) {
            return Err(ShellError::UnknownCommand { name: name.into() });
        }

        let invalid = |error: String| ShellError::InvalidArguments {
            name: name.into(),
            error,
        };

        let args = match args.trim() {
            "" => Value::Null,
            text => serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?,
        };

        let mut fields = match args {
            Value::Null => Map::new(),
            Value::Object(fields) => fields,
            other => return Err(invalid(format!("expected an object, got {other}"))),
        };
        fields.insert("command".into(), Value::String(name.into()));

        serde_json::from_value(Value::Object(fields)).map_err(|e| invalid(e.to_string()))
    }
}

/// What a successful command hands back, flattened next to `success`.
#[derive(uniffi::Enum, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum CommandPayload {
    Imported { count: u32, applied: ApplyReport },
    Reset { reset: ResetReport },
    Config { config: Option<AppConfig> },
    Account { user: Option<AdminAccount> },
    CookieSets { cookies: Vec<CookieSetRow> },
    Configs { configs: Vec<AppConfig> },
    Users { users: Vec<AdminAccount> },
    Expiration { expiration: ExpirationInfo },
}

/// The uniform reply to every command: `{success: true, ..payload}` or
/// `{success: false, error}`.
#[derive(uniffi::Record, Serialize, Clone, Debug, PartialEq)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub payload: Option<CommandPayload>,
}

impl Envelope {
    pub fn success(payload: Option<CommandPayload>) -> Self {
        Self {
            success: true,
            error: None,
            payload,
        }
    }

    pub fn failure(error: &ShellError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            payload: None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| json!({"success": false, "error": e.to_string()}).to_string())
    }
}

impl From<Result<Option<CommandPayload>, ShellError>> for Envelope {
    fn from(result: Result<Option<CommandPayload>, ShellError>) -> Self {
        match result {
            Ok(payload) => Envelope::success(payload),
            Err(e) => Envelope::failure(&e),
        }
    }
}
