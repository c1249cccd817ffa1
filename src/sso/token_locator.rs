use crate::clock::Clock;
use crate::error::{ResolveError, Result};
use crate::models::SsoToken;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Client registrations written by botocore share the directory with tokens
const CLIENT_REGISTRATION_PREFIX: &str = "botocore-client-";

/// Reads tokens left by `aws sso login` in ~/.aws/sso/cache/
///
/// The directory is owned by the AWS CLI; nothing here ever writes to it.
pub struct SsoTokenLocator {
    cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl SsoTokenLocator {
    pub fn new(clock: Arc<dyn Clock>) -> Result<Self> {
        let cache_dir = dirs::home_dir()
            .ok_or_else(|| ResolveError::ConfigError("Could not determine home directory".to_string()))?
            .join(".aws")
            .join("sso")
            .join("cache");

        Ok(Self::at(cache_dir, clock))
    }

    pub fn at(cache_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            clock,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Find an unexpired token issued for `start_url` in `region`.
    ///
    /// When several files match, the token that stays valid longest wins;
    /// ties go to the lexically first file name.
    pub fn find_valid_token(&self, start_url: &str, region: &str) -> Result<SsoToken> {
        if !self.cache_dir.is_dir() {
            return Err(ResolveError::SsoCacheMissing {
                path: self.cache_dir.clone(),
            });
        }

        let now = self.clock.now();
        let mut best: Option<SsoToken> = None;

        for path in self.candidate_files()? {
            let token = match read_token(&path) {
                Ok(token) => token,
                Err(e) => {
                    // Other tools keep non-token JSON here (sso-session client registrations)
                    tracing::debug!("Skipping {}: not an SSO token ({})", path.display(), e);
                    continue;
                }
            };

            if !token.matches(start_url, region) {
                continue;
            }

            if !token.is_valid_at(now) {
                tracing::debug!(
                    "SSO token {} expired at {}",
                    path.display(),
                    token.expires_at
                );
                continue;
            }

            let better = best
                .as_ref()
                .map_or(true, |current| token.expires_at > current.expires_at);
            if better {
                tracing::debug!("Selected SSO token {}", path.display());
                best = Some(token);
            }
        }

        best.ok_or_else(|| ResolveError::SsoNotLoggedIn {
            start_url: start_url.to_string(),
            region: region.to_string(),
        })
    }

    /// JSON files directly inside the cache directory, sorted by name
    fn candidate_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();

            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let is_registration = path
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|name| name.starts_with(CLIENT_REGISTRATION_PREFIX));
            if is_registration {
                continue;
            }

            files.push(path);
        }

        files.sort();
        Ok(files)
    }
}

fn read_token(path: &Path) -> Result<SsoToken> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
