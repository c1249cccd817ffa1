use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Temporary AWS credentials handed back to the caller
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .finish()
    }
}

/// Credential cache entry, keyed by profile name in the durable cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCredential {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub expire_time: DateTime<Utc>,
}

impl CachedCredential {
    pub fn new(credentials: Credentials, expire_time: DateTime<Utc>) -> Self {
        Self {
            credentials,
            expire_time,
        }
    }

    /// Usable strictly before the expiry instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expire_time
    }

    pub fn expires_in_minutes(&self, now: DateTime<Utc>) -> i64 {
        (self.expire_time - now).num_minutes().max(0)
    }
}

/// Token written by `aws sso login` into the SSO cache directory
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoToken {
    #[serde(default)]
    pub start_url: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    pub access_token: String,

    #[serde(deserialize_with = "deserialize_token_expiry")]
    pub expires_at: DateTime<Utc>,
}

impl SsoToken {
    pub fn matches(&self, start_url: &str, region: &str) -> bool {
        self.start_url.as_deref() == Some(start_url) && self.region.as_deref() == Some(region)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Parse an SSO token expiry.
///
/// AWS CLI v2 writes RFC 3339 (`2024-05-01T10:00:00Z`); v1 and some SDKs
/// write a literal `UTC` suffix instead (`2024-05-01T10:00:00UTC`).
pub fn parse_token_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = raw.strip_suffix("UTC")?;
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
}

fn deserialize_token_expiry<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_token_expiry(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised expiresAt '{}'", raw)))
}

/// Named profile that assumes a role (or requests a session token) via STS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardProfile {
    pub role_arn: Option<String>,
    pub source_profile: Option<String>,
    pub mfa_serial: Option<String>,
    pub region: Option<String>,
    pub external_id: Option<String>,
    pub role_session_name: Option<String>,
    pub duration_seconds: Option<i32>,
}

/// Named profile backed by an IAM Identity Center (SSO) session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoProfile {
    pub start_url: String,
    pub region: String,
    pub role_name: String,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAttributes {
    Standard(StandardProfile),
    Sso(SsoProfile),
}

impl ProfileAttributes {
    pub fn is_sso(&self) -> bool {
        matches!(self, ProfileAttributes::Sso(_))
    }
}

/// How credentials for one account are obtained
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Account id to strategy mapping, read once and passed explicitly
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountMapping(BTreeMap<String, StrategyDescriptor>);

impl AccountMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: impl Into<String>, strategy: StrategyDescriptor) {
        self.0.insert(identity.into(), strategy);
    }

    pub fn strategy(&self, identity: &str) -> Option<&StrategyDescriptor> {
        self.0.get(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StrategyDescriptor)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, StrategyDescriptor)> for AccountMapping {
    fn from_iter<I: IntoIterator<Item = (K, StrategyDescriptor)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
