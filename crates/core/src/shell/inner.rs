use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use log::{debug, error, info, warn};
use reqwest::Url;

use super::{
    commands::{Command, CommandPayload},
    config::ShellConfiguration,
    logging::init_log,
};
use crate::{
    callbacks::{BrowserSession, HistoryId, NavHistoryEntry, SecurePersistentStore, SurfaceHost},
    cookies::{CookieFile, CookieSet},
    error::{RemoteError, ShellError, StoreError},
    navigation::{EntryPoint, NavigationError, Navigator, Surface},
    overlay::{render_script, PageRule},
    persistence::FileStore,
    remote::{format_expiration, RemoteBridge},
    session::{decide_entry_point, LocalBrowserSession, SessionApplier},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn configuration(reason: impl Into<String>) -> ShellError {
    ShellError::Configuration {
        reason: reason.into(),
    }
}

pub(crate) struct ShellInner {
    /// Replaced by the active remote app config on start.
    target_url: Mutex<String>,
    entry_page: String,
    page_rules: Vec<PageRule>,
    bridge_name: String,
    user_agent: String,
    cookies: CookieFile,
    applier: SessionApplier,
    surfaces: Arc<dyn SurfaceHost>,
    navigator: Mutex<Navigator>,
    remote: Option<RemoteBridge>,
    /// Held by commands that rewrite the live session.
    session_gate: tokio::sync::Mutex<()>,
}

impl ShellInner {
    pub fn new(config: ShellConfiguration) -> Result<Self, ShellError> {
        init_log(config.log_level);
        debug!("Building shell from {config:?}");

        let target_url = config
            .target_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| configuration("a target url is required"))?;
        Url::parse(&target_url)
            .map_err(|e| configuration(format!("invalid target url {target_url}: {e}")))?;

        if config.entry_page.trim().is_empty() {
            return Err(configuration("the entry page name must not be empty"));
        }

        let store: Arc<dyn SecurePersistentStore> =
            match (config.persistence_provider, config.data_dir) {
                (Some(provider), _) => provider,
                (None, Some(dir)) => Arc::new(FileStore::new(dir)),
                (None, None) => {
                    return Err(configuration(
                        "a persistence provider or a data directory is required",
                    ))
                }
            };

        let browser: Arc<dyn BrowserSession> = match config.browser_session {
            Some(browser) => browser,
            None => Arc::new(LocalBrowserSession::new()),
        };

        let surfaces = config
            .surface_host
            .ok_or_else(|| configuration("a surface host is required"))?;

        let timeout = Duration::from_millis(config.remote_timeout_ms);
        let remote = config
            .remote
            .map(|settings| RemoteBridge::new(&settings, timeout))
            .transpose()
            .map_err(|e| configuration(format!("remote store: {e}")))?;

        let mut navigator = Navigator::default();
        if let Some(handler) = config.navigation_handler {
            navigator.set_event_handler(handler);
        }

        Ok(Self {
            target_url: Mutex::new(target_url),
            entry_page: config.entry_page,
            page_rules: config.page_rules,
            bridge_name: config.bridge_name,
            user_agent: config.user_agent,
            cookies: CookieFile::new(store, config.domain_policy),
            applier: SessionApplier::new(browser),
            surfaces,
            navigator: Mutex::new(navigator),
            remote,
            session_gate: tokio::sync::Mutex::new(()),
        })
    }

    pub fn target_url(&self) -> String {
        lock(&self.target_url).clone()
    }

    pub fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    pub fn entry_point(&self) -> EntryPoint {
        decide_entry_point(&self.cookies)
    }

    pub fn current(&self) -> Option<NavHistoryEntry> {
        lock(&self.navigator).current()
    }

    pub fn entries(&self) -> Vec<NavHistoryEntry> {
        lock(&self.navigator).entries()
    }

    fn target_surface(&self) -> Surface {
        Surface::Target {
            url: self.target_url(),
        }
    }

    fn remote(&self) -> Result<&RemoteBridge, RemoteError> {
        self.remote.as_ref().ok_or(RemoteError::NotConfigured)
    }

    /// Records the surface change and asks the host to display it.
    fn show(&self, surface: Surface) -> Result<HistoryId, NavigationError> {
        let id = lock(&self.navigator).navigate(surface.clone())?;
        debug!("Showing {surface:?} as entry {id}");
        self.surfaces.show(surface);
        Ok(id)
    }

    async fn refresh_target_url(&self) {
        let Some(remote) = &self.remote else {
            return;
        };

        match remote.active_app_config().await {
            Ok(Some(config)) if !config.app_url.trim().is_empty() => {
                info!("Using target url of app config {}", config.id);
                *lock(&self.target_url) = config.app_url;
            }
            Ok(_) => debug!("No active app config, keeping the configured target url"),
            Err(e) => warn!("Keeping the configured target url: {e}"),
        }
    }

    /// Picks up the remote target url, re-applies the persisted set and shows
    /// the entry point it implies.
    pub async fn start(&self) -> Result<EntryPoint, ShellError> {
        self.refresh_target_url().await;

        let _gate = self.session_gate.lock().await;
        if self.cookies.has_valid_cookie_set() {
            match self.cookies.load() {
                Ok(Some(set)) => {
                    self.applier.apply(&set);
                }
                Ok(None) => {}
                Err(e) => error!("Persisted cookies could not be applied: {e}"),
            }
        }

        let entry = self.entry_point();
        let surface = match entry {
            EntryPoint::Welcome => Surface::Entry,
            EntryPoint::Target => self.target_surface(),
        };
        self.show(surface)?;

        info!("Started on {entry:?}");
        Ok(entry)
    }

    /// Evaluates the overlay script unless `url` is the entry page. Returns
    /// whether the script was handed to the host.
    pub fn page_loaded(&self, url: &str) -> bool {
        if url.contains(&self.entry_page) {
            return false;
        }

        match render_script(&self.page_rules, &self.target_url(), &self.bridge_name) {
            Ok(script) => {
                self.surfaces.execute_script(script);
                true
            }
            Err(e) => {
                error!("Failed to render the page overlay: {e}");
                false
            }
        }
    }

    fn apply_and_show_target(&self, set: CookieSet) -> Result<Option<CommandPayload>, ShellError> {
        let applied = self.applier.apply(&set);
        self.show(self.target_surface())?;

        Ok(Some(CommandPayload::Imported {
            count: set.len() as u32,
            applied,
        }))
    }

    pub async fn run(&self, command: Command) -> Result<Option<CommandPayload>, ShellError> {
        let _gate = if command.mutates_session() {
            Some(self.session_gate.lock().await)
        } else {
            None
        };

        match command {
            Command::ClearSessionAndReload => {
                let reset = self
                    .applier
                    .reset_and_navigate_to_entry(&self.cookies, || {
                        self.show(Surface::Entry).map(drop)
                    });

                if !reset.is_complete() {
                    return Err(ShellError::ResetIncomplete {
                        failed: reset.failures().join(", "),
                    });
                }
                Ok(Some(CommandPayload::Reset { reset }))
            }
            Command::ImportCookiesAndReload { path } => {
                let set = match path {
                    Some(path) => {
                        let raw = tokio::fs::read_to_string(&path)
                            .await
                            .map_err(StoreError::from)?;
                        self.cookies.import_from_source(&raw)?
                    }
                    None => self.cookies.load()?.ok_or(ShellError::NoCookies)?,
                };
                self.apply_and_show_target(set)
            }
            Command::PasteCookiesFromClipboard => {
                let text = self
                    .surfaces
                    .read_clipboard()
                    .filter(|text| !text.trim().is_empty())
                    .ok_or(ShellError::ClipboardEmpty)?;

                let set = self.cookies.import_from_source(&text)?;
                self.apply_and_show_target(set)
            }
            Command::UseRemoteCookies => {
                let remote_set = self
                    .remote()?
                    .fetch_cookies()
                    .await?
                    .ok_or(ShellError::NoCookies)?;

                let set = self.cookies.import_records(remote_set.records)?;
                self.apply_and_show_target(set)
            }
            Command::GoToWelcomePage => {
                self.show(Surface::Entry)?;
                Ok(None)
            }
            Command::GoToTargetPage => {
                self.show(self.target_surface())?;
                Ok(None)
            }
            Command::GetActiveAppConfig => {
                let config = self.remote()?.active_app_config().await?;
                Ok(Some(CommandPayload::Config { config }))
            }
            Command::AdminVerify { username, password } => {
                let user = self.remote()?.verify_admin(&username, &password).await?;
                Ok(Some(CommandPayload::Account { user }))
            }
            Command::AdminGetAllCookies => {
                let cookies = self.remote()?.list_cookie_sets().await?;
                Ok(Some(CommandPayload::CookieSets { cookies }))
            }
            Command::AdminSaveCookies { cookies, name } => {
                let set = CookieSet::parse(&cookies)?;
                self.remote()?.save_cookie_set(&set, name).await?;
                Ok(None)
            }
            Command::AdminDeleteCookies { id } => {
                self.remote()?.delete_cookie_set(id).await?;
                Ok(None)
            }
            Command::AdminFormatExpiration { expires_at } => {
                let expiration = format_expiration(expires_at.as_deref());
                Ok(Some(CommandPayload::Expiration { expiration }))
            }
            Command::AdminGetAllConfigs => {
                let configs = self.remote()?.list_app_configs().await?;
                Ok(Some(CommandPayload::Configs { configs }))
            }
            Command::AdminSaveConfig { config } => {
                self.remote()?.save_app_config(config).await?;
                Ok(None)
            }
            Command::AdminUpdateConfig { id, config } => {
                self.remote()?.update_app_config(id, config).await?;
                Ok(None)
            }
            Command::AdminDeleteConfig { id } => {
                self.remote()?.delete_app_config(id).await?;
                Ok(None)
            }
            Command::AdminGetAllUsers => {
                let users = self.remote()?.list_admin_accounts().await?;
                Ok(Some(CommandPayload::Users { users }))
            }
            Command::AdminCreateUser { user } => {
                self.remote()?.create_admin_account(user).await?;
                Ok(None)
            }
            Command::AdminUpdateUser { id, user } => {
                self.remote()?.update_admin_account(id, user).await?;
                Ok(None)
            }
            Command::AdminDeleteUser { id } => {
                self.remote()?.delete_admin_account(id).await?;
                Ok(None)
            }
        }
    }
}
