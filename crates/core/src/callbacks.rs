use crate::{
    error::{SessionError, StoreError},
    navigation::Surface,
};

/// Provides secure persistent storage for session data like cookies.
/// Implementations should handle platform-specific storage (e.g. NSUserDefaults on iOS)
/// and ensure data is stored securely as some of it may be session tokens.
///
/// `set` must replace the previous value wholesale; a reader never observes a
/// partially written entry.
#[uniffi::export(callback_interface)]
pub trait SecurePersistentStore: Send + Sync {
    /// Removes the entry for the given key, succeeds if the key is absent.
    fn remove_entry(&self, key: String) -> Result<(), StoreError>;

    /// Gets the value for the given key, or None if not found
    fn get(&self, key: String) -> Option<Vec<u8>>;

    /// Sets the value for the given key
    fn set(&self, key: String, value: Vec<u8>) -> Result<(), StoreError>;
}

/// A cookie in the shape embedded browsers expect when writing to their
/// session store.
#[derive(uniffi::Record, Clone, Debug, PartialEq)]
pub struct BrowserCookie {
    /// The url the cookie is associated with, `https://{domain}{path}`.
    pub url: String,
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: crate::cookies::SameSite,
    /// Seconds since the UNIX epoch, session cookie when absent.
    pub expiration_date: Option<f64>,
}

/// The live session of the embedded browser view. The shell is its only
/// mutator.
#[uniffi::export(callback_interface)]
pub trait BrowserSession: Send + Sync {
    /// Inserts or replaces a single cookie.
    fn set_cookie(&self, cookie: BrowserCookie) -> Result<(), SessionError>;

    /// Drops cookies, local and session storage, IndexedDB and any other
    /// structured on-device caches.
    fn clear_storage_data(&self) -> Result<(), SessionError>;

    /// Drops the HTTP cache.
    fn clear_cache(&self) -> Result<(), SessionError>;
}

/// The window hosting the browser view.
#[uniffi::export(callback_interface)]
pub trait SurfaceHost: Send + Sync {
    /// Load either the bundled entry page or a remote url into the view.
    fn show(&self, surface: Surface);

    /// Evaluate `script` in the currently loaded page.
    fn execute_script(&self, script: String);

    /// Current clipboard text, None when the clipboard holds no text.
    fn read_clipboard(&self) -> Option<String>;
}

#[uniffi::export(callback_interface)]
pub trait NavEventHandler: Send + Sync {
    /// This callback instruments every surface change before the host is asked
    /// to display it. Returning [HandlerResponse::PreventDefault] cancels it.
    fn handle_event(&self, event: NavEvent) -> HandlerResponse;
}

/// Unique id in the history stack
pub type HistoryId = u64;

/// User emitted response from [NavEventHandler::handle_event].
/// Determines whether or not the default navigation action is taken.
#[derive(uniffi::Enum, Clone, Debug, PartialEq, Default)]
pub enum HandlerResponse {
    #[default]
    /// Return this to proceed as normal.
    Default,
    /// Return this to cancel the navigation before it occurs.
    PreventDefault,
}

#[derive(uniffi::Enum, Clone, Debug, PartialEq)]
pub enum NavEventType {
    /// Pushing a new surface onto the history stack
    Push,
    /// Showing the current surface again
    Reload,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq)]
pub struct NavHistoryEntry {
    /// Unique id for this piece of nav entry state.
    pub id: HistoryId,
    /// What the view displays.
    pub surface: Surface,
}

impl NavHistoryEntry {
    /// Create a new navigation history entry
    pub fn new(id: HistoryId, surface: Surface) -> Self {
        Self { id, surface }
    }
}

/// An event emitted when the shell switches surfaces.
#[derive(uniffi::Record, Clone, Debug, PartialEq)]
pub struct NavEvent {
    /// The type of event being emitted.
    pub event: NavEventType,
    /// The previous surface, if there was one.
    pub from: Option<NavHistoryEntry>,
    /// Destination.
    pub to: NavHistoryEntry,
}
