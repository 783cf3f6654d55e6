use std::sync::Arc;

use chrono::DateTime;
use log::{debug, error};
use reqwest::{cookie::CookieStore, header::HeaderValue, Url};

use crate::{
    callbacks::{BrowserCookie, BrowserSession},
    cookies::SameSite,
    error::SessionError,
};

/// An in-process browser session backed by a cookie jar, for hosts that do
/// not bring their own (headless runs, tests). Can be handed to a reqwest
/// client as its cookie provider.
pub struct LocalBrowserSession {
    store: Arc<reqwest_cookie_store::CookieStoreMutex>,
}

impl Default for LocalBrowserSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBrowserSession {
    pub fn new() -> Self {
        Self::with_store(reqwest_cookie_store::CookieStore::default())
    }

    fn with_store(store: reqwest_cookie_store::CookieStore) -> Self {
        Self {
            store: Arc::new(reqwest_cookie_store::CookieStoreMutex::new(store)),
        }
    }

    /// A session whose jar starts out as a previous [Self::snapshot].
    pub fn from_snapshot(snapshot: &[u8]) -> Result<Self, SessionError> {
        let store = cookie_store::serde::json::load_all(snapshot).map_err(|e| {
            error!("Failed to load cookie jar snapshot: {e}");
            SessionError::Unexpected {
                error: e.to_string(),
            }
        })?;
        Ok(Self::with_store(store))
    }

    /// Serializes the jar as JSON, session cookies included.
    pub fn snapshot(&self) -> Result<Vec<u8>, SessionError> {
        let store = self.store.lock().map_err(|e| SessionError::Unexpected {
            error: e.to_string(),
        })?;

        let mut buffer = Vec::new();
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&store, &mut buffer)
            .map_err(|e| SessionError::Unexpected {
                error: e.to_string(),
            })?;
        Ok(buffer)
    }

    /// The shared jar, suitable for `reqwest::ClientBuilder::cookie_provider`.
    pub fn jar(&self) -> Arc<reqwest_cookie_store::CookieStoreMutex> {
        self.store.clone()
    }

    /// The `Cookie` header a request to `url` would carry.
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        self.cookies(&url)
            .and_then(|header| header.to_str().ok().map(str::to_owned))
    }

    pub fn cookie_count(&self) -> usize {
        self.store
            .lock()
            .map(|store| store.iter_any().count())
            .unwrap_or_default()
    }
}

/// Renders `cookie` as a `Set-Cookie` header value.
fn set_cookie_header(cookie: &BrowserCookie) -> String {
    let mut header = format!(
        "{}={}; Domain={}; Path={}",
        cookie.name, cookie.value, cookie.domain, cookie.path
    );

    if cookie.secure {
        header.push_str("; Secure");
    }
    if cookie.http_only {
        header.push_str("; HttpOnly");
    }
    if cookie.same_site != SameSite::Unspecified {
        header.push_str(&format!("; SameSite={}", cookie.same_site));
    }

    let expires = cookie
        .expiration_date
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0));
    if let Some(expires) = expires {
        header.push_str(&format!(
            "; Expires={}",
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        ));
    }

    header
}

impl BrowserSession for LocalBrowserSession {
    fn set_cookie(&self, cookie: BrowserCookie) -> Result<(), SessionError> {
        let url = Url::parse(&cookie.url).map_err(|e| SessionError::Rejected {
            reason: format!("invalid cookie url {}: {e}", cookie.url),
        })?;
        let header = set_cookie_header(&cookie);

        let mut store = self.store.lock().map_err(|e| SessionError::Unexpected {
            error: e.to_string(),
        })?;

        store
            .parse(&header, &url)
            .map_err(|e| SessionError::Rejected {
                reason: e.to_string(),
            })?;

        debug!("Stored cookie {} for {url}", cookie.name);
        Ok(())
    }

    fn clear_storage_data(&self) -> Result<(), SessionError> {
        let mut store = self.store.lock().map_err(|e| {
            error!("Cookie jar lock poisoned: {e}");
            SessionError::Unexpected {
                error: e.to_string(),
            }
        })?;
        *store = reqwest_cookie_store::CookieStore::default();
        Ok(())
    }

    fn clear_cache(&self) -> Result<(), SessionError> {
        // Nothing is cached besides cookies.
        Ok(())
    }
}

impl CookieStore for LocalBrowserSession {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        CookieStore::set_cookies(self.store.as_ref(), cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        CookieStore::cookies(self.store.as_ref(), url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, domain: &str) -> BrowserCookie {
        BrowserCookie {
            url: format!("https://{}/", domain.trim_start_matches('.')),
            name: name.into(),
            value: "abc".into(),
            domain: domain.into(),
            path: "/".into(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            expiration_date: Some(253_402_300_799.0),
        }
    }

    #[test]
    fn header_carries_every_attribute() {
        assert_eq!(
            set_cookie_header(&cookie("sid", ".example.com")),
            "sid=abc; Domain=.example.com; Path=/; Secure; HttpOnly; SameSite=Lax; \
             Expires=Fri, 31 Dec 9999 23:59:59 GMT"
        );
    }

    #[test]
    fn stored_cookies_are_sent_back() {
        let session = LocalBrowserSession::new();
        session.set_cookie(cookie("sid", ".example.com")).unwrap();

        assert_eq!(session.cookie_count(), 1);
        assert_eq!(
            session.cookie_header("https://www.example.com/page").as_deref(),
            Some("sid=abc")
        );
        assert_eq!(session.cookie_header("https://other.org/"), None);
    }

    #[test]
    fn clearing_empties_the_jar() {
        let session = LocalBrowserSession::new();
        session.set_cookie(cookie("a", "example.com")).unwrap();
        session.set_cookie(cookie("b", "example.com")).unwrap();
        assert_eq!(session.cookie_count(), 2);

        session.clear_storage_data().unwrap();
        session.clear_cache().unwrap();
        assert_eq!(session.cookie_count(), 0);
    }

    #[test]
    fn snapshots_restore_the_jar() {
        let session = LocalBrowserSession::new();
        session.set_cookie(cookie("sid", ".example.com")).unwrap();
        let mut transient = cookie("tmp", "example.com");
        transient.expiration_date = None;
        session.set_cookie(transient).unwrap();

        let restored = LocalBrowserSession::from_snapshot(&session.snapshot().unwrap()).unwrap();

        assert_eq!(restored.cookie_count(), 2);
        let header = restored.cookie_header("https://example.com/").unwrap();
        assert!(header.contains("sid=abc"));
        assert!(header.contains("tmp=abc"));
    }

    #[test]
    fn garbage_snapshots_are_rejected() {
        assert!(matches!(
            LocalBrowserSession::from_snapshot(b"not a jar"),
            Err(SessionError::Unexpected { .. })
        ));
    }

    #[test]
    fn unparseable_urls_are_rejected() {
        let session = LocalBrowserSession::new();
        let mut bad = cookie("sid", "example.com");
        bad.url = "https://".into();

        assert!(matches!(
            session.set_cookie(bad),
            Err(SessionError::Rejected { .. })
        ));
    }
}
