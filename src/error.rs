use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No credential strategy configured for account {identity}")]
    NoStrategyConfigured { identity: String },

    #[error("Profile not found: {profile}")]
    ProfileNotFound { profile: String },

    #[error("SSO token cache directory not found at {}", path.display())]
    SsoCacheMissing { path: PathBuf },

    #[error("No valid SSO token for {start_url} ({region}) - run `aws sso login`")]
    SsoNotLoggedIn { start_url: String, region: String },

    #[error("Profile {profile} is pinned to account {pinned}, not {requested}")]
    AccountMismatch {
        profile: String,
        pinned: String,
        requested: String,
    },

    #[error("SSO token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("MFA prompt cancelled for profile {profile}")]
    MfaPromptCancelled { profile: String },

    #[error("Credential acquisition failed: {0}")]
    CredentialAcquisitionFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
