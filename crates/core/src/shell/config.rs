use std::{path::PathBuf, sync::Arc};

use crate::{
    callbacks::{BrowserSession, NavEventHandler, SecurePersistentStore, SurfaceHost},
    cookies::DomainPolicy,
    overlay::{default_rules, PageRule, DEFAULT_BRIDGE_NAME},
    remote::{RemoteSettings, DEFAULT_TIMEOUT},
};

pub const DEFAULT_ENTRY_PAGE: &str = "welcome.html";

/// A plain desktop Chrome, so hosted pages do not special case embedded views.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";

#[derive(uniffi::Enum, Debug, Clone, Default, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Clone)]
pub struct ShellConfiguration {
    /// The hosted application, required.
    pub target_url: Option<String>,
    /// File name of the bundled welcome page. Pages whose url contains it are
    /// left without overlay.
    pub entry_page: String,
    /// Which domains a cookie import must cover.
    pub domain_policy: DomainPolicy,
    pub page_rules: Vec<PageRule>,
    /// Name of the page global the overlay buttons dispatch commands through.
    pub bridge_name: String,
    pub user_agent: String,
    /// Directory for the file backed store, used when no persistence provider is set.
    pub data_dir: Option<PathBuf>,
    /// Host provided storage for the cookie file.
    pub persistence_provider: Option<Arc<dyn SecurePersistentStore>>,
    /// The live browser session, an in-process cookie jar when absent.
    pub browser_session: Option<Arc<dyn BrowserSession>>,
    /// The window hosting the browser view, required.
    pub surface_host: Option<Arc<dyn SurfaceHost>>,
    /// Observes and may veto surface changes.
    pub navigation_handler: Option<Arc<dyn NavEventHandler>>,
    /// Shared cookie and configuration tables; admin commands fail without it.
    pub remote: Option<RemoteSettings>,
    /// Per request timeout for remote calls in milliseconds.
    pub remote_timeout_ms: u64,
    /// Initial log level - defaults to [LogLevel::Info]
    pub log_level: LogLevel,
}

impl Default for ShellConfiguration {
    fn default() -> Self {
        Self {
            target_url: None,
            entry_page: DEFAULT_ENTRY_PAGE.into(),
            domain_policy: DomainPolicy::default(),
            page_rules: default_rules(),
            bridge_name: DEFAULT_BRIDGE_NAME.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            data_dir: None,
            persistence_provider: None,
            browser_session: None,
            surface_host: None,
            navigation_handler: None,
            remote: None,
            remote_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            log_level: LogLevel::default(),
        }
    }
}

impl std::fmt::Debug for ShellConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellConfiguration")
            .field("target_url", &self.target_url)
            .field("entry_page", &self.entry_page)
            .field("domain_policy", &self.domain_policy)
            .field("page_rules", &self.page_rules.len())
            .field("bridge_name", &self.bridge_name)
            .field("user_agent", &self.user_agent)
            .field("data_dir", &self.data_dir)
            .field(
                "persistence_provider",
                &self.persistence_provider.is_some().then_some("..."),
            )
            .field(
                "browser_session",
                &self.browser_session.is_some().then_some("..."),
            )
            .field("surface_host", &self.surface_host.is_some().then_some("..."))
            .field(
                "navigation_handler",
                &self.navigation_handler.is_some().then_some("..."),
            )
            .field("remote", &self.remote)
            .field("remote_timeout_ms", &self.remote_timeout_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}
