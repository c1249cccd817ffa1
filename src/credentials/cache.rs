use crate::error::{ResolveError, Result};
use crate::models::CachedCredential;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

const CACHE_FILE_NAME: &str = "credentials.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheDocument {
    #[serde(default)]
    credential_cache: BTreeMap<String, CachedCredential>,
}

/// Durable credential cache, one JSON document keyed by profile name
pub struct CredentialCache {
    path: PathBuf,
    // Serialises load-edit-store so writers for different profiles don't drop each other's entries
    write_lock: Mutex<()>,
}

impl CredentialCache {
    /// Cache in the platform cache directory (~/.cache/crossacct on Linux)
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
            .ok_or_else(|| ResolveError::CacheError("Could not determine cache directory".to_string()))?
            .join("crossacct");

        Ok(Self::at(cache_dir.join(CACHE_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether any record (valid or not) exists for the profile
    pub fn has(&self, profile: &str) -> Result<bool> {
        Ok(self.load()?.credential_cache.contains_key(profile))
    }

    pub fn get(&self, profile: &str) -> Result<Option<CachedCredential>> {
        Ok(self.load()?.credential_cache.remove(profile))
    }

    /// Store a record, replacing any previous one for the profile
    pub fn put(&self, profile: &str, record: &CachedCredential) -> Result<()> {
        let _guard = self.lock();

        let mut doc = self.load()?;
        doc.credential_cache
            .insert(profile.to_string(), record.clone());
        self.store(&doc)?;

        tracing::debug!(
            "Cached credentials for profile {} until {}",
            profile,
            record.expire_time
        );
        Ok(())
    }

    pub fn remove(&self, profile: &str) -> Result<bool> {
        let _guard = self.lock();

        let mut doc = self.load()?;
        let removed = doc.credential_cache.remove(profile).is_some();
        if removed {
            self.store(&doc)?;
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock();

        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| ResolveError::CacheError(format!("Failed to remove cache file: {}", e)))?;
        }
        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<(String, CachedCredential)>> {
        Ok(self.load()?.credential_cache.into_iter().collect())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self) -> Result<CacheDocument> {
        if !self.path.exists() {
            return Ok(CacheDocument::default());
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| ResolveError::CacheError(format!("Failed to read cache file: {}", e)))?;

        match serde_json::from_str(&contents) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                // Replaced wholesale on the next successful put
                tracing::warn!(
                    "Ignoring unreadable credential cache {}: {}",
                    self.path.display(),
                    e
                );
                Ok(CacheDocument::default())
            }
        }
    }

    /// Write the whole document to a fresh owner-only temp file and rename it into place
    fn store(&self, doc: &CacheDocument) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(doc)?;

        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| ResolveError::CacheError(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ResolveError::CacheError(format!("Failed to write cache file: {}", e)))?;
        tmp.persist(&self.path)
            .map_err(|e| ResolveError::CacheError(format!("Failed to write cache file: {}", e.error)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credentials;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn record(key: &str) -> CachedCredential {
        CachedCredential::new(
            Credentials {
                access_key_id: key.to_string(),
                secret_access_key: "secret".to_string(),
                session_token: "token".to_string(),
            },
            Utc::now() + Duration::hours(1),
        )
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::at(dir.path().join("credentials.json"));

        assert!(!cache.has("dev").unwrap());
        assert!(cache.get("dev").unwrap().is_none());
        assert!(cache.entries().unwrap().is_empty());
    }

    #[test]
    fn test_put_then_get_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let stored = record("AKIA1");

        CredentialCache::at(&path).put("dev", &stored).unwrap();

        let reopened = CredentialCache::at(&path);
        assert!(reopened.has("dev").unwrap());
        assert_eq!(reopened.get("dev").unwrap(), Some(stored));
    }

    #[test]
    fn test_put_overwrites_and_keeps_other_profiles() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::at(dir.path().join("credentials.json"));

        cache.put("dev", &record("AKIA1")).unwrap();
        cache.put("prod", &record("AKIA2")).unwrap();
        cache.put("dev", &record("AKIA3")).unwrap();

        assert_eq!(cache.get("dev").unwrap().unwrap().credentials.access_key_id, "AKIA3");
        assert_eq!(cache.get("prod").unwrap().unwrap().credentials.access_key_id, "AKIA2");
        assert_eq!(cache.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_document_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        let cache = CredentialCache::at(&path);
        cache.put("dev", &record("AKIA1")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &raw["credentialCache"]["dev"];
        assert_eq!(entry["accessKeyId"], "AKIA1");
        assert!(entry["expireTime"].is_string());

        // No temporary files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        CredentialCache::at(&path).put("dev", &record("AKIA1")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_treated_as_empty_and_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = CredentialCache::at(&path);
        assert!(cache.get("dev").unwrap().is_none());

        cache.put("dev", &record("AKIA1")).unwrap();
        assert!(cache.has("dev").unwrap());
    }

    #[test]
    fn test_remove_and_clear() {
        let dir = TempDir::new().unwrap();
        let cache = CredentialCache::at(dir.path().join("credentials.json"));
        cache.put("dev", &record("AKIA1")).unwrap();
        cache.put("prod", &record("AKIA2")).unwrap();

        assert!(cache.remove("dev").unwrap());
        assert!(!cache.remove("dev").unwrap());
        assert!(cache.has("prod").unwrap());

        cache.clear().unwrap();
        assert!(!cache.has("prod").unwrap());
    }

    #[test]
    fn test_concurrent_puts_keep_every_profile() {
        let dir = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(CredentialCache::at(dir.path().join("credentials.json")));

        for round in 0..10 {
            let writers: Vec<_> = (0..8)
                .map(|i| {
                    let cache = cache.clone();
                    std::thread::spawn(move || {
                        let profile = format!("p{}-{}", round, i);
                        cache.put(&profile, &record(&profile))
                    })
                })
                .collect();

            for writer in writers {
                writer.join().unwrap().unwrap();
            }

            for i in 0..8 {
                let profile = format!("p{}-{}", round, i);
                let cached = cache.get(&profile).unwrap();
                assert_eq!(cached.map(|c| c.credentials.access_key_id), Some(profile));
            }
        }

        assert_eq!(cache.entries().unwrap().len(), 80);
        // Only the cache file remains; no stray temp files
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
