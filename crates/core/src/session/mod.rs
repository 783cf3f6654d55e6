mod local;

use std::sync::Arc;

pub use local::LocalBrowserSession;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::{
    callbacks::{BrowserCookie, BrowserSession},
    cookies::{CookieFile, CookieRecord, CookieSet},
    navigation::{EntryPoint, NavigationError},
};

/// Outcome of mirroring a cookie set into the live session.
#[derive(uniffi::Record, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub attempted: u32,
    pub succeeded: u32,
}

/// Which steps of a session reset went through.
#[derive(uniffi::Record, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub storage_cleared: bool,
    pub cache_cleared: bool,
    pub cookie_file_removed: bool,
    pub navigated: bool,
}

impl ResetReport {
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    /// Names of the steps that failed.
    pub fn failures(&self) -> Vec<&'static str> {
        [
            (self.storage_cleared, "storage"),
            (self.cache_cleared, "cache"),
            (self.cookie_file_removed, "cookie file"),
            (self.navigated, "navigation"),
        ]
        .into_iter()
        .filter_map(|(ok, step)| (!ok).then_some(step))
        .collect()
    }
}

/// `https://{domain without leading dot}{path}`, the url a cookie is scoped to.
pub fn cookie_url(record: &CookieRecord) -> String {
    let path = if record.path.is_empty() {
        "/"
    } else {
        record.path.as_str()
    };
    let separator = if path.starts_with('/') { "" } else { "/" };
    format!("https://{}{separator}{path}", record.host())
}

impl From<&CookieRecord> for BrowserCookie {
    fn from(record: &CookieRecord) -> Self {
        BrowserCookie {
            url: cookie_url(record),
            name: record.name.clone(),
            value: record.value.clone(),
            domain: record.domain.clone(),
            path: record.path.clone(),
            secure: record.secure,
            http_only: record.http_only,
            same_site: record.same_site.unwrap_or_default(),
            expiration_date: record.expiration_date.filter(|secs| *secs > 0.0),
        }
    }
}

/// WELCOME iff no valid cookie set is persisted.
pub fn decide_entry_point(cookies: &CookieFile) -> EntryPoint {
    if cookies.has_valid_cookie_set() {
        EntryPoint::Target
    } else {
        EntryPoint::Welcome
    }
}

/// Mirrors persisted cookie sets into the embedded browser's live session.
/// Never persists anything itself.
pub struct SessionApplier {
    browser: Arc<dyn BrowserSession>,
}

impl SessionApplier {
    pub fn new(browser: Arc<dyn BrowserSession>) -> Self {
        Self { browser }
    }

    /// Upserts every record, best effort. A failing record is logged and
    /// skipped, the remaining records are still applied.
    pub fn apply(&self, set: &CookieSet) -> ApplyReport {
        info!("Importing {} cookies...", set.len());

        let mut report = ApplyReport::default();
        for record in &set.records {
            report.attempted += 1;
            match self.browser.set_cookie(record.into()) {
                Ok(()) => report.succeeded += 1,
                Err(e) => warn!("Failed to set cookie {}: {e}", record.name),
            }
        }

        info!(
            "Applied {}/{} cookies to the live session",
            report.succeeded, report.attempted
        );
        report
    }

    /// Clears live storage, the HTTP cache and the persisted set, then calls
    /// `show_entry`. Every step runs regardless of earlier failures.
    pub fn reset_and_navigate_to_entry<F>(&self, cookies: &CookieFile, show_entry: F) -> ResetReport
    where
        F: FnOnce() -> Result<(), NavigationError>,
    {
        let mut report = ResetReport::default();

        match self.browser.clear_storage_data() {
            Ok(()) => report.storage_cleared = true,
            Err(e) => error!("Failed to clear storage data: {e}"),
        }

        match self.browser.clear_cache() {
            Ok(()) => report.cache_cleared = true,
            Err(e) => error!("Failed to clear HTTP cache: {e}"),
        }

        match cookies.clear() {
            Ok(()) => report.cookie_file_removed = true,
            Err(e) => error!("Failed to delete persisted cookies: {e}"),
        }

        match show_entry() {
            Ok(()) => report.navigated = true,
            Err(e) => warn!("Entry navigation did not happen: {e}"),
        }

        debug!("Session reset finished: {report:?}");
        report
    }
}

#[cfg(test)]
mod tests;
