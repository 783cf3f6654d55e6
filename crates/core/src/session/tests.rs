use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;
use crate::{
    callbacks::SecurePersistentStore,
    cookies::{CookieFile, DomainPolicy},
    error::{SessionError, StoreError},
    persistence::FileStore,
};

/// Records every call, fails the operations it is told to.
#[derive(Default)]
struct FlakySession {
    cookies: Mutex<Vec<BrowserCookie>>,
    reject_names: Vec<String>,
    fail_storage: bool,
    fail_cache: bool,
    clear_calls: AtomicUsize,
}

impl BrowserSession for FlakySession {
    fn set_cookie(&self, cookie: BrowserCookie) -> Result<(), SessionError> {
        if self.reject_names.contains(&cookie.name) {
            return Err(SessionError::Rejected {
                reason: "rejected by test".into(),
            });
        }
        self.cookies.lock().unwrap().push(cookie);
        Ok(())
    }

    fn clear_storage_data(&self) -> Result<(), SessionError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_storage {
            return Err(SessionError::Unexpected {
                error: "storage".into(),
            });
        }
        self.cookies.lock().unwrap().clear();
        Ok(())
    }

    fn clear_cache(&self) -> Result<(), SessionError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_cache {
            return Err(SessionError::Unexpected {
                error: "cache".into(),
            });
        }
        Ok(())
    }
}

/// A store that can never delete, and optionally never write either.
#[derive(Default)]
struct StickyStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    read_only: bool,
}

impl SecurePersistentStore for StickyStore {
    fn remove_entry(&self, _key: String) -> Result<(), StoreError> {
        Err(StoreError::Io {
            error: "device busy".into(),
        })
    }

    fn get(&self, key: String) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(&key).cloned()
    }

    fn set(&self, key: String, value: Vec<u8>) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Io {
                error: "read-only".into(),
            });
        }
        self.entries.lock().unwrap().insert(key, value);
        Ok(())
    }
}

fn cookie_file() -> (TempDir, CookieFile) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    (dir, CookieFile::new(store, DomainPolicy::Lenient))
}

#[test]
fn url_strips_leading_dot() {
    let set = CookieSet::parse(r#"[{"domain":".example.com","name":"sid","value":"abc"}]"#)
        .unwrap();
    assert_eq!(cookie_url(&set.records[0]), "https://example.com/");
}

#[test]
fn url_keeps_custom_paths() {
    let set = CookieSet::parse(
        r#"[{"domain":"example.com","name":"sid","value":"abc","path":"/app"},
            {"domain":"example.com","name":"x","value":"y","path":"api"}]"#,
    )
    .unwrap();
    assert_eq!(cookie_url(&set.records[0]), "https://example.com/app");
    assert_eq!(cookie_url(&set.records[1]), "https://example.com/api");
}

#[test]
fn apply_is_best_effort() {
    let browser = Arc::new(FlakySession {
        reject_names: vec!["b".into()],
        ..Default::default()
    });
    let applier = SessionApplier::new(browser.clone());

    let set = CookieSet::parse(
        r#"[{"domain":"example.com","name":"a","value":"1"},
            {"domain":"example.com","name":"b","value":"2"},
            {"domain":"example.com","name":"c","value":"3","sameSite":"strict"}]"#,
    )
    .unwrap();

    let report = applier.apply(&set);
    assert_eq!(
        report,
        ApplyReport {
            attempted: 3,
            succeeded: 2
        }
    );

    let stored = browser.cookies.lock().unwrap();
    let names: Vec<_> = stored.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "c"]);
    assert_eq!(stored[0].same_site, crate::cookies::SameSite::NoRestriction);
    assert_eq!(stored[1].same_site, crate::cookies::SameSite::Strict);
}

#[test]
fn reset_runs_every_step_despite_failures() {
    let (_dir, cookies) = cookie_file();
    cookies
        .import_from_source(r#"[{"domain":"example.com","name":"a","value":"1"}]"#)
        .unwrap();

    let browser = Arc::new(FlakySession {
        fail_storage: true,
        fail_cache: true,
        ..Default::default()
    });
    let applier = SessionApplier::new(browser.clone());

    let navigated = AtomicUsize::new(0);
    let report = applier.reset_and_navigate_to_entry(&cookies, || {
        navigated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(browser.clear_calls.load(Ordering::SeqCst), 2);
    assert_eq!(navigated.load(Ordering::SeqCst), 1);
    assert!(!cookies.has_valid_cookie_set());
    assert_eq!(report.failures(), vec!["storage", "cache"]);
    assert!(report.cookie_file_removed);
    assert!(report.navigated);
}

#[test]
fn reset_invalidates_a_set_it_cannot_delete() {
    let store = Arc::new(StickyStore::default());
    let cookies = CookieFile::new(store.clone(), DomainPolicy::Lenient);
    cookies
        .import_from_source(r#"[{"domain":"example.com","name":"a","value":"1"}]"#)
        .unwrap();
    let applier = SessionApplier::new(Arc::new(FlakySession::default()));

    let report = applier.reset_and_navigate_to_entry(&cookies, || Ok(()));

    assert!(report.is_complete());
    assert!(!cookies.has_valid_cookie_set());
    assert_eq!(decide_entry_point(&cookies), EntryPoint::Welcome);
}

#[test]
fn reset_reports_a_cookie_file_it_cannot_touch() {
    let store = Arc::new(StickyStore {
        read_only: true,
        ..Default::default()
    });
    let cookies = CookieFile::new(store, DomainPolicy::Lenient);
    let applier = SessionApplier::new(Arc::new(FlakySession::default()));

    let report = applier.reset_and_navigate_to_entry(&cookies, || Ok(()));

    assert_eq!(report.failures(), vec!["cookie file"]);
    assert!(report.navigated);
    assert!(!cookies.has_valid_cookie_set());
}

#[test]
fn reset_without_persisted_set_is_complete() {
    let (_dir, cookies) = cookie_file();
    let applier = SessionApplier::new(Arc::new(FlakySession::default()));

    let report = applier.reset_and_navigate_to_entry(&cookies, || Ok(()));
    assert!(report.is_complete());
    assert_eq!(decide_entry_point(&cookies), EntryPoint::Welcome);
}

#[test]
fn entry_point_follows_the_cookie_file() {
    let (_dir, cookies) = cookie_file();
    assert_eq!(decide_entry_point(&cookies), EntryPoint::Welcome);

    cookies
        .import_from_source(r#"[{"domain":"example.com","name":"a","value":"1"}]"#)
        .unwrap();
    assert_eq!(decide_entry_point(&cookies), EntryPoint::Target);
}

#[test]
fn local_session_receives_applied_cookies() {
    let browser = Arc::new(LocalBrowserSession::new());
    let applier = SessionApplier::new(browser.clone());
    let set = CookieSet::parse(
        r#"[{"domain":".example.com","name":"sid","value":"abc","secure":true}]"#,
    )
    .unwrap();

    assert_eq!(applier.apply(&set).succeeded, 1);
    assert_eq!(
        browser.cookie_header("https://example.com/").as_deref(),
        Some("sid=abc")
    );
}
