pub mod callbacks;
pub mod cookies;
mod error;
pub mod navigation;
pub mod overlay;
pub mod persistence;
pub mod remote;
pub mod session;
pub mod shell;

pub use self::{
    callbacks::*,
    cookies::{CookieFile, CookieRecord, CookieSet, DomainPolicy, SameSite},
    error::*,
    navigation::{EntryPoint, NavigationError, Navigator, Surface},
    overlay::{default_rules, render_script, ButtonAction, OverlayButton, PageRule},
    persistence::FileStore,
    remote::{
        format_expiration, AdminAccount, AdminAccountUpdate, AppConfig, AppConfigUpdate,
        CookieSetRow, ExpirationInfo, ExpirationStatus, NewAdminAccount, NewAppConfig,
        RemoteBridge, RemoteSettings, TableNames, DEFAULT_TIMEOUT,
    },
    session::{ApplyReport, LocalBrowserSession, ResetReport, SessionApplier},
    shell::{Command, CommandPayload, Envelope, LogLevel, Shell, ShellBuilder},
};

uniffi::setup_scaffolding!();

/// Classifies a stored `expires_at` timestamp for display.
#[uniffi::export]
fn expiration_info(expires_at: Option<String>) -> ExpirationInfo {
    format_expiration(expires_at.as_deref())
}

/// The stock overlay, for hosts that extend it through
/// [ShellBuilder::set_page_rules].
#[uniffi::export]
fn default_page_rules() -> Vec<PageRule> {
    default_rules()
}
