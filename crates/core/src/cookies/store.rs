use std::sync::Arc;

use log::{debug, info, warn};

use super::{CookieRecord, CookieSet, DomainPolicy};
use crate::{
    callbacks::SecurePersistentStore,
    error::{ImportError, StoreError},
};

pub const COOKIE_STORE_KEY: &str = "cookies.json";

/// Owns the persisted cookie set. Every import replaces the previous set
/// wholesale, a rejected import leaves it untouched.
pub struct CookieFile {
    store: Arc<dyn SecurePersistentStore>,
    policy: DomainPolicy,
}

impl CookieFile {
    pub fn new(store: Arc<dyn SecurePersistentStore>, policy: DomainPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// True iff a persisted set exists, decodes as JSON and is a non-empty array.
    pub fn has_valid_cookie_set(&self) -> bool {
        let Some(bytes) = self.store.get(COOKIE_STORE_KEY.to_owned()) else {
            return false;
        };

        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) => value.as_array().is_some_and(|records| !records.is_empty()),
            Err(e) => {
                warn!("Persisted cookie set is unreadable: {e}");
                false
            }
        }
    }

    /// Validates `raw` as a cookie export and persists it.
    pub fn import_from_source(&self, raw: &str) -> Result<CookieSet, ImportError> {
        let set = CookieSet::parse(raw)?;
        self.import_records(set.records)
    }

    /// Applies the domain policy to already decoded records and persists them.
    pub fn import_records(&self, records: Vec<CookieRecord>) -> Result<CookieSet, ImportError> {
        if records.is_empty() {
            return Err(ImportError::Empty);
        }

        self.policy.check(&records)?;

        let set = CookieSet::new(records, None);
        let buffer = serde_json::to_vec_pretty(&set.records)?;
        self.store.set(COOKIE_STORE_KEY.to_owned(), buffer)?;

        info!("Saved {} cookies to {COOKIE_STORE_KEY}", set.len());
        Ok(set)
    }

    /// Reads the persisted set back, None when nothing is stored.
    pub fn load(&self) -> Result<Option<CookieSet>, ImportError> {
        let Some(bytes) = self.store.get(COOKIE_STORE_KEY.to_owned()) else {
            debug!("No persisted cookie set");
            return Ok(None);
        };

        let raw = String::from_utf8_lossy(&bytes);
        CookieSet::parse(&raw).map(Some)
    }

    /// Deletes the persisted set. Deleting an absent set is not an error.
    ///
    /// When the entry cannot be removed it is overwritten with an empty array
    /// instead, so the set is invalid either way. Fails only if both do.
    pub fn clear(&self) -> Result<(), StoreError> {
        let Err(e) = self.store.remove_entry(COOKIE_STORE_KEY.to_owned()) else {
            return Ok(());
        };

        warn!("Failed to remove {COOKIE_STORE_KEY}, invalidating it instead: {e}");
        self.store.set(COOKIE_STORE_KEY.to_owned(), b"[]".to_vec())
    }
}
