mod commands;
mod config;
mod inner;
mod logging;


use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard, PoisonError},
};

pub use commands::{Command, CommandPayload, Envelope, COMMAND_NAMES};
pub use config::{LogLevel, ShellConfiguration, DEFAULT_ENTRY_PAGE, DEFAULT_USER_AGENT};
use inner::ShellInner;
use log::{debug, warn};

use crate::{
    callbacks::*,
    cookies::DomainPolicy,
    error::ShellError,
    navigation::{EntryPoint, Surface},
    overlay::PageRule,
    remote::RemoteSettings,
};

/// A configuration interface for building a [Shell].
///
/// A target url, a [SurfaceHost] and either a data directory or a
/// [SecurePersistentStore] are required, everything else has a default.
#[derive(uniffi::Object, Default)]
pub struct ShellBuilder {
    config: Mutex<ShellConfiguration>,
}

impl ShellBuilder {
    fn config(&self) -> MutexGuard<'_, ShellConfiguration> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[uniffi::export]
impl ShellBuilder {
    #[uniffi::constructor]
    pub fn new() -> Self {
        Self {
            config: Default::default(),
        }
    }

    /// The hosted application shown once a session exists.
    pub fn set_target_url(&self, url: String) {
        self.config().target_url = Some(url);
    }

    /// File name of the bundled welcome page, `welcome.html` by default.
    pub fn set_entry_page(&self, page: String) {
        self.config().entry_page = page;
    }

    /// By default any well formed export is accepted.
    pub fn set_domain_policy(&self, policy: DomainPolicy) {
        self.config().domain_policy = policy;
    }

    /// Replaces the default overlay rules.
    pub fn set_page_rules(&self, rules: Vec<PageRule>) {
        self.config().page_rules = rules;
    }

    /// Name of the page global overlay buttons dispatch commands through.
    pub fn set_bridge_name(&self, name: String) {
        self.config().bridge_name = name;
    }

    pub fn set_user_agent(&self, user_agent: String) {
        self.config().user_agent = user_agent;
    }

    /// Persist the cookie file under `dir`. Ignored when a persistence
    /// provider is set.
    pub fn set_data_dir(&self, dir: String) {
        self.config().data_dir = Some(PathBuf::from(dir));
    }

    /// Provides the [Shell] with a way to store the cookie file, e.g. in the
    /// platform keychain.
    pub fn set_persistence_provider(&self, provider: Box<dyn SecurePersistentStore>) {
        self.config().persistence_provider = Some(provider.into());
    }

    /// The embedded browser's session. Without one cookies go to an
    /// in-process jar.
    pub fn set_browser_session(&self, session: Box<dyn BrowserSession>) {
        self.config().browser_session = Some(session.into());
    }

    pub fn set_surface_host(&self, host: Box<dyn SurfaceHost>) {
        self.config().surface_host = Some(host.into());
    }

    /// This is an endpoint intended for client developers to instrument navigation.
    /// By default it permits all navigation.
    pub fn set_navigation_handler(&self, handler: Box<dyn NavEventHandler>) {
        self.config().navigation_handler = Some(handler.into());
    }

    /// Enables the admin commands and remote cookie sets.
    pub fn set_remote(&self, settings: RemoteSettings) {
        self.config().remote = Some(settings);
    }

    /// Set the time out for remote store requests in milliseconds.
    ///
    /// By default the timeout is 30 seconds.
    pub fn set_remote_timeout_ms(&self, timeout: u64) {
        self.config().remote_timeout_ms = timeout;
    }

    /// Set the log filter level.
    ///
    /// By Default the log filter is set to [LogLevel::Info]
    pub fn set_log_level(&self, level: LogLevel) {
        self.config().log_level = level;
    }

    /// Returns the current log level setting.
    pub fn log_level(&self) -> LogLevel {
        self.config().log_level
    }

    pub fn build(&self) -> Result<Shell, ShellError> {
        let config = self.config().clone();
        let inner = ShellInner::new(config)?;
        Ok(Shell { inner })
    }
}

/// The privileged side of the boundary: owns the cookie file, the live
/// session and the remote store, and answers commands from the page.
#[derive(uniffi::Object)]
pub struct Shell {
    inner: ShellInner,
}

#[uniffi::export(async_runtime = "tokio")]
impl Shell {
    /// Applies the persisted session and shows the welcome page or the target.
    pub async fn start(&self) -> Result<EntryPoint, ShellError> {
        self.inner.start().await
    }

    /// Runs `command`. Failures are reported in the envelope, never raised.
    pub async fn invoke(&self, command: Command) -> Envelope {
        let name = command.name();
        debug!("Running {name}");

        let result = self.inner.run(command).await;
        if let Err(e) = &result {
            warn!("{name} failed: {e}");
        }
        result.into()
    }

    /// The JSON form of [Shell::invoke]: a command name and an object of
    /// arguments in, an envelope out.
    pub async fn dispatch(&self, name: String, args_json: String) -> String {
        let envelope = match Command::from_json(&name, &args_json) {
            Ok(command) => self.invoke(command).await,
            Err(e) => {
                warn!("Rejected command {name}: {e}");
                Envelope::failure(&e)
            }
        };
        envelope.to_json()
    }

    /// To be called by the host after every page load. Returns whether the
    /// overlay script was injected.
    pub fn page_loaded(&self, url: String) -> bool {
        self.inner.page_loaded(&url)
    }

    pub fn user_agent(&self) -> String {
        self.inner.user_agent()
    }

    pub fn target_url(&self) -> String {
        self.inner.target_url()
    }

    /// Where the shell would start given the persisted cookie file.
    pub fn entry_point(&self) -> EntryPoint {
        self.inner.entry_point()
    }

    pub fn current_surface(&self) -> Option<Surface> {
        self.inner.current().map(|entry| entry.surface)
    }

    /// Every surface shown so far, oldest first.
    pub fn history(&self) -> Vec<NavHistoryEntry> {
        self.inner.entries()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        logging::set_log_level(level)
    }
}
