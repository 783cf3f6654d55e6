mod expiration;
mod record;
mod store;

pub use expiration::{earliest_expiration, parse_timestamp, record_expiration};
pub use record::{validate_value, CookieRecord, SameSite};
pub use store::{CookieFile, COOKIE_STORE_KEY};

use chrono::SecondsFormat;

use crate::error::ImportError;

/// Which cookie domains an import has to cover.
#[derive(uniffi::Enum, Clone, Debug, Default, PartialEq)]
pub enum DomainPolicy {
    /// Any non-empty, well formed export is accepted.
    #[default]
    Lenient,
    /// At least one record must belong to one of `suffixes`, e.g. `google.com`
    /// accepts `.google.com`, `accounts.google.com` and `google.com`.
    RequireSuffix { suffixes: Vec<String> },
}

impl DomainPolicy {
    pub fn check(&self, records: &[CookieRecord]) -> Result<(), ImportError> {
        let DomainPolicy::RequireSuffix { suffixes } = self else {
            return Ok(());
        };

        let admitted = records.iter().any(|record| {
            let host = record.host().to_ascii_lowercase();
            suffixes.iter().any(|suffix| domain_matches(&host, suffix))
        });

        if admitted {
            Ok(())
        } else {
            Err(ImportError::DomainPolicy {
                required: suffixes.join(", "),
            })
        }
    }
}

fn domain_matches(host: &str, suffix: &str) -> bool {
    let suffix = suffix.trim_start_matches('.').to_ascii_lowercase();
    host == suffix
        || host
            .strip_suffix(suffix.as_str())
            .is_some_and(|rest| rest.ends_with('.'))
}

/// The complete collection of cookies currently persisted or being imported.
#[derive(uniffi::Record, Clone, Debug, PartialEq)]
pub struct CookieSet {
    pub name: Option<String>,
    pub records: Vec<CookieRecord>,
    /// RFC 3339 timestamp of the first record to expire.
    pub earliest_expiration: Option<String>,
}

impl CookieSet {
    pub fn new(records: Vec<CookieRecord>, name: Option<String>) -> Self {
        let earliest_expiration = earliest_expiration(&records)
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true));

        Self {
            name,
            records,
            earliest_expiration,
        }
    }

    /// Parses and validates raw exported text. Shape and schema checks only,
    /// the domain policy is applied when the set is imported.
    pub fn parse(raw: &str) -> Result<Self, ImportError> {
        let value: serde_json::Value = serde_json::from_str(raw.trim())?;
        Ok(Self::new(validate_value(value)?, None))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(domains: &[&str]) -> Vec<CookieRecord> {
        domains
            .iter()
            .map(|domain| CookieRecord {
                domain: domain.to_string(),
                name: "a".into(),
                value: "b".into(),
                path: "/".into(),
                secure: false,
                http_only: false,
                same_site: None,
                expiration_date: None,
                expires: None,
            })
            .collect()
    }

    fn strict() -> DomainPolicy {
        DomainPolicy::RequireSuffix {
            suffixes: vec!["google.com".into()],
        }
    }

    #[test]
    fn lenient_accepts_anything() {
        assert!(DomainPolicy::Lenient.check(&set(&["other.org"])).is_ok());
    }

    #[test]
    fn strict_requires_one_matching_domain() {
        assert!(strict().check(&set(&["other.org", ".google.com"])).is_ok());
        assert!(strict().check(&set(&["accounts.Google.com"])).is_ok());
        assert!(strict().check(&set(&["google.com"])).is_ok());
        assert!(matches!(
            strict().check(&set(&["other.org"])),
            Err(ImportError::DomainPolicy { .. })
        ));
    }

    #[test]
    fn suffix_must_end_on_a_label_boundary() {
        assert!(strict().check(&set(&["notgoogle.com"])).is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            CookieSet::parse("not json"),
            Err(ImportError::Parse { .. })
        ));
        assert!(matches!(CookieSet::parse("   "), Err(ImportError::Parse { .. })));
    }

    #[test]
    fn parse_computes_earliest_expiration() {
        let set = CookieSet::parse(
            r#"[{"domain":"a.com","name":"x","value":"1","expirationDate":1800000000},
                {"domain":"a.com","name":"y","value":"2"}]"#,
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.earliest_expiration.as_deref(),
            Some("2027-01-15T08:00:00.000Z")
        );
    }
}
