use crate::navigation::NavigationError;

/// Reasons a cookie import is rejected. Validation stops at the first failure
/// and nothing is persisted.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ImportError {
    #[error("Invalid JSON - {error}")]
    Parse { error: String },

    #[error("Cookie data is not an array")]
    Shape,

    #[error("Cookie array is empty")]
    Empty,

    #[error("Cookie at index {index} is missing or has an invalid `{field}`")]
    Schema { index: u32, field: String },

    #[error("No cookie matches the required domain(s): {required}")]
    DomainPolicy { required: String },

    #[error(transparent)]
    Store {
        #[from]
        error: StoreError,
    },
}

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum StoreError {
    #[error("Persistent store I/O failure - {error}")]
    Io { error: String },

    #[error("Persistent store callback failed - {error}")]
    Unexpected { error: String },
}

/// A failure reported by the host browser session. Per-cookie failures are
/// absorbed by the session applier, reset failures are recorded in the report.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SessionError {
    #[error("Browser session rejected the operation - {reason}")]
    Rejected { reason: String },

    #[error("Browser session callback failed - {error}")]
    Unexpected { error: String },
}

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RemoteError {
    #[error("No remote store is configured")]
    NotConfigured,

    #[error("Reqwest Error - {error}")]
    Request { error: String },

    #[error("Remote store answered {code} - {message}")]
    Status { code: u16, message: String },

    #[error("Failed to decode remote payload - {error}")]
    Decode { error: String },

    #[error("Credential hashing failed - {error}")]
    Credentials { error: String },
}

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ShellError {
    #[error("Invalid configuration - {reason}")]
    Configuration { reason: String },

    #[error(transparent)]
    Import {
        #[from]
        error: ImportError,
    },

    #[error(transparent)]
    Store {
        #[from]
        error: StoreError,
    },

    #[error(transparent)]
    Remote {
        #[from]
        error: RemoteError,
    },

    #[error(transparent)]
    Navigation {
        #[from]
        error: NavigationError,
    },

    #[error("Clipboard empty")]
    ClipboardEmpty,

    #[error("No cookie set is stored")]
    NoCookies,

    #[error("Session reset incomplete - {failed}")]
    ResetIncomplete { failed: String },

    #[error("Unknown command `{name}`")]
    UnknownCommand { name: String },

    #[error("Invalid arguments for `{name}` - {error}")]
    InvalidArguments { name: String, error: String },
}

// uniffi hands callback-interface panics and foreign exceptions to us through
// this type, it has to be convertible into every error a callback returns.
impl From<uniffi::UnexpectedUniFFICallbackError> for StoreError {
    fn from(value: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Unexpected {
            error: value.reason,
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for SessionError {
    fn from(value: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Unexpected {
            error: value.reason,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io {
            error: value.to_string(),
        }
    }
}

impl From<tempfile::PersistError> for StoreError {
    fn from(value: tempfile::PersistError) -> Self {
        Self::Io {
            error: value.error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse {
            error: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Decode {
                error: value.to_string(),
            };
        }
        Self::Request {
            error: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode {
            error: value.to_string(),
        }
    }
}

impl From<argon2::password_hash::Error> for RemoteError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::Credentials {
            error: value.to_string(),
        }
    }
}
