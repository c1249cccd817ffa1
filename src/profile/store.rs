use crate::error::{ResolveError, Result};
use crate::models::{ProfileAttributes, SsoProfile, StandardProfile};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only lookup of named profiles
#[cfg_attr(test, mockall::automock)]
pub trait ProfileStore: Send + Sync {
    fn profile(&self, name: &str) -> Result<Option<ProfileAttributes>>;
}

type Section = HashMap<String, String>;

/// Profiles from the AWS shared config file (~/.aws/config)
pub struct AwsConfigProfileStore {
    path: PathBuf,
}

impl AwsConfigProfileStore {
    /// Honours AWS_CONFIG_FILE like the AWS CLI does
    pub fn new() -> Result<Self> {
        if let Ok(path) = std::env::var("AWS_CONFIG_FILE") {
            return Ok(Self::at(path));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            ResolveError::ConfigError("Could not determine home directory".to_string())
        })?;

        Ok(Self::at(home.join(".aws").join("config")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_sections(&self) -> Result<HashMap<String, Section>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| ResolveError::ConfigError(format!("Failed to read AWS config file: {}", e)))?;

        Ok(parse_sections(&content))
    }
}

impl ProfileStore for AwsConfigProfileStore {
    fn profile(&self, name: &str) -> Result<Option<ProfileAttributes>> {
        let sections = self.read_sections()?;

        let section_name = if name == "default" {
            "default".to_string()
        } else {
            format!("profile {}", name)
        };

        // [default] may also be written as [profile default]
        let section = sections
            .get(&section_name)
            .or_else(|| (name == "default").then(|| sections.get("profile default")).flatten());

        match section {
            Some(section) => build_attributes(name, section, &sections).map(Some),
            None => Ok(None),
        }
    }
}

fn build_attributes(
    name: &str,
    section: &Section,
    sections: &HashMap<String, Section>,
) -> Result<ProfileAttributes> {
    let session = match section.get("sso_session") {
        Some(session_name) => Some(
            sections
                .get(&format!("sso-session {}", session_name))
                .ok_or_else(|| {
                    ResolveError::ConfigError(format!(
                        "Profile {} references missing sso-session {}",
                        name, session_name
                    ))
                })?,
        ),
        None => None,
    };

    let lookup = |key: &str| -> Option<String> {
        section
            .get(key)
            .or_else(|| session.and_then(|s| s.get(key)))
            .cloned()
    };

    if let Some(start_url) = lookup("sso_start_url") {
        let require = |key: &str| {
            lookup(key).ok_or_else(|| {
                ResolveError::ConfigError(format!("SSO profile {} is missing {}", name, key))
            })
        };

        return Ok(ProfileAttributes::Sso(SsoProfile {
            start_url,
            region: require("sso_region")?,
            role_name: require("sso_role_name")?,
            account_id: section.get("sso_account_id").cloned(),
        }));
    }

    let duration_seconds = match section.get("duration_seconds") {
        Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
            ResolveError::ConfigError(format!(
                "Profile {} has invalid duration_seconds '{}'",
                name, raw
            ))
        })?),
        None => None,
    };

    Ok(ProfileAttributes::Standard(StandardProfile {
        role_arn: section.get("role_arn").cloned(),
        source_profile: section.get("source_profile").cloned(),
        mfa_serial: section.get("mfa_serial").cloned(),
        region: section.get("region").cloned(),
        external_id: section.get("external_id").cloned(),
        role_session_name: section.get("role_session_name").cloned(),
        duration_seconds,
    }))
}

/// Split an INI-style file into `section name -> key/value` maps
fn parse_sections(content: &str) -> HashMap<String, Section> {
    let mut sections: HashMap<String, Section> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        // Indented lines continue a nested value (e.g. `s3 =`); not needed here
        if line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let name = trimmed[1..trimmed.len() - 1]
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            sections.entry(name.clone()).or_default();
            current = Some(name);
        } else if let (Some(section), Some(eq_pos)) = (&current, trimmed.find('=')) {
            let key = trimmed[..eq_pos].trim().to_string();
            let value = trimmed[eq_pos + 1..].trim().to_string();
            if let Some(data) = sections.get_mut(section) {
                data.insert(key, value);
            }
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
# Shared config
[default]
region = us-east-1

[profile dev]
role_arn = arn:aws:iam::111111111111:role/Deployer
source_profile = default
mfa_serial = arn:aws:iam::999999999999:mfa/alice
duration_seconds = 1800
s3 =
    max_concurrent_requests = 20

[profile legacy-sso]
sso_start_url = https://legacy.awsapps.com/start
sso_region = us-east-1
sso_account_id = 222222222222
sso_role_name = ReadOnly

[profile modern-sso]
sso_session = corp
sso_account_id = 333333333333
sso_role_name = Admin

[profile broken-sso]
sso_start_url = https://legacy.awsapps.com/start
sso_region = us-east-1

[sso-session corp]
sso_start_url = https://corp.awsapps.com/start
sso_region = eu-west-1
sso_registration_scopes = sso:account:access
"#;

    fn store() -> (TempDir, AwsConfigProfileStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, CONFIG).unwrap();
        (dir, AwsConfigProfileStore::at(path))
    }

    #[test]
    fn test_standard_profile_with_mfa() {
        let (_dir, store) = store();

        let attrs = store.profile("dev").unwrap().unwrap();
        let ProfileAttributes::Standard(profile) = attrs else {
            panic!("expected a standard profile");
        };

        assert_eq!(
            profile.role_arn.as_deref(),
            Some("arn:aws:iam::111111111111:role/Deployer")
        );
        assert_eq!(profile.source_profile.as_deref(), Some("default"));
        assert_eq!(
            profile.mfa_serial.as_deref(),
            Some("arn:aws:iam::999999999999:mfa/alice")
        );
        assert_eq!(profile.duration_seconds, Some(1800));
    }

    #[test]
    fn test_default_profile() {
        let (_dir, store) = store();

        let attrs = store.profile("default").unwrap().unwrap();
        assert_eq!(
            attrs,
            ProfileAttributes::Standard(StandardProfile {
                region: Some("us-east-1".to_string()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_legacy_sso_profile() {
        let (_dir, store) = store();

        let attrs = store.profile("legacy-sso").unwrap().unwrap();
        assert_eq!(
            attrs,
            ProfileAttributes::Sso(SsoProfile {
                start_url: "https://legacy.awsapps.com/start".to_string(),
                region: "us-east-1".to_string(),
                role_name: "ReadOnly".to_string(),
                account_id: Some("222222222222".to_string()),
            })
        );
    }

    #[test]
    fn test_sso_session_profile() {
        let (_dir, store) = store();

        let attrs = store.profile("modern-sso").unwrap().unwrap();
        let ProfileAttributes::Sso(profile) = attrs else {
            panic!("expected an SSO profile");
        };
        assert_eq!(profile.start_url, "https://corp.awsapps.com/start");
        assert_eq!(profile.region, "eu-west-1");
        assert_eq!(profile.role_name, "Admin");
    }

    #[test]
    fn test_incomplete_sso_profile_is_config_error() {
        let (_dir, store) = store();

        let err = store.profile("broken-sso").unwrap_err();
        assert!(matches!(err, ResolveError::ConfigError(msg) if msg.contains("sso_role_name")));
    }

    #[test]
    fn test_unknown_profile_and_missing_file() {
        let (dir, store) = store();
        assert!(store.profile("nope").unwrap().is_none());

        let missing = AwsConfigProfileStore::at(dir.path().join("absent"));
        assert!(missing.profile("dev").unwrap().is_none());
    }
}
