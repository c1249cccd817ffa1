// Configuration management
use crate::credentials::CredentialCache;
use crate::error::{ResolveError, Result};
use crate::models::AccountMapping;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Account id -> strategy
    #[serde(default)]
    pub accounts: AccountMapping,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sso: SsoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SsoConfig {
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Get the config directory path
    ///
    /// Priority:
    /// 1. XDG_CONFIG_HOME/crossacct (if env var is set)
    /// 2. ~/.config/crossacct (if ~/.config exists)
    /// 3. ~/.crossacct (fallback on Unix)
    /// 4. Platform default on Windows
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("crossacct"));
        }

        #[cfg(unix)]
        {
            if let Some(home_dir) = dirs::home_dir() {
                let xdg_config = home_dir.join(".config");

                if xdg_config.exists() {
                    return Ok(xdg_config.join("crossacct"));
                }

                return Ok(home_dir.join(".crossacct"));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                return Ok(config_dir.join("crossacct"));
            }
        }

        Err(ResolveError::ConfigError(
            "Could not determine config directory".to_string(),
        ))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from `path` (or the default location), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file_path()?,
        };

        let mut config = Self::load_file(&config_path)?;

        if let Ok(cache_path) = std::env::var("CROSSACCT_CACHE_PATH") {
            tracing::debug!("Using CROSSACCT_CACHE_PATH from environment: {}", cache_path);
            config.cache.path = Some(PathBuf::from(cache_path));
        }

        if let Ok(cache_dir) = std::env::var("CROSSACCT_SSO_CACHE_DIR") {
            tracing::debug!("Using CROSSACCT_SSO_CACHE_DIR from environment: {}", cache_dir);
            config.sso.cache_dir = Some(PathBuf::from(cache_dir));
        }

        Ok(config)
    }

    /// Credential cache at the configured path, or the platform default
    pub fn credential_cache(&self) -> Result<CredentialCache> {
        match &self.cache.path {
            Some(path) => Ok(CredentialCache::at(path)),
            None => CredentialCache::new(),
        }
    }

    fn load_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Config::default());
        }

        tracing::debug!("Loading config from: {}", config_path.display());
        let contents = fs::read_to_string(config_path)
            .map_err(|e| ResolveError::ConfigError(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| ResolveError::ConfigError(format!("Failed to parse config file: {}", e)))
    }

    /// Create a sample config file with comments
    pub fn create_sample(path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file_path()?,
        };

        if config_path.exists() {
            return Err(ResolveError::ConfigError(format!(
                "Config file already exists at: {}",
                config_path.display()
            )));
        }

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
                fs::create_dir_all(config_dir).map_err(|e| {
                    ResolveError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let sample_config = r#"# crossacct configuration
# Location priority:
#   1. $XDG_CONFIG_HOME/crossacct/config.toml (if XDG_CONFIG_HOME is set)
#   2. ~/.config/crossacct/config.toml (if ~/.config exists)
#   3. ~/.crossacct/config.toml (fallback)
#
# Environment overrides:
#   CROSSACCT_CACHE_PATH     credential cache file
#   CROSSACCT_SSO_CACHE_DIR  AWS SSO token cache directory

# One table per target account; `profile` names a profile in ~/.aws/config
# [accounts."111111111111"]
# profile = "dev"

[cache]
# Where resolved credentials are cached (default: platform cache dir)
# path = "/home/me/.cache/crossacct/credentials.json"

[sso]
# Where `aws sso login` keeps its tokens (default: ~/.aws/sso/cache)
# cache_dir = "/home/me/.aws/sso/cache"
"#;

        fs::write(&config_path, sample_config)
            .map_err(|e| ResolveError::ConfigError(format!("Failed to write sample config: {}", e)))?;

        tracing::info!("Created sample config at: {}", config_path.display());
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_file(&dir.path().join("config.toml")).unwrap();

        assert!(config.accounts.is_empty());
        assert!(config.cache.path.is_none());
        assert!(config.sso.cache_dir.is_none());
    }

    #[test]
    fn test_parse_accounts_and_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[accounts."111111111111"]
profile = "dev"

[accounts."222222222222"]
profile = "sso-prod"

[cache]
path = "/tmp/creds.json"
"#,
        )
        .unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(
            config
                .accounts
                .strategy("222222222222")
                .and_then(|s| s.profile.as_deref()),
            Some("sso-prod")
        );
        assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/creds.json")));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[accounts\nprofile = ").unwrap();

        let err = Config::load_file(&path).unwrap_err();
        assert!(matches!(err, ResolveError::ConfigError(_)));
    }

    #[test]
    fn test_sample_config_parses_and_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_sample(Some(&path)).unwrap();
        let config = Config::load_file(&path).unwrap();
        assert!(config.accounts.is_empty());

        assert!(Config::create_sample(Some(&path)).is_err());
    }
}
