use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per profile name.
///
/// Held across the check-resolve-write sequence so that concurrent
/// resolutions of the same profile prompt and call out only once.
#[derive(Default)]
pub struct ProfileLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ProfileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, profile: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(profile.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_profile_is_exclusive() {
        let locks = Arc::new(ProfileLocks::new());
        let guard = locks.acquire("dev").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("dev").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_profiles_do_not_block() {
        let locks = ProfileLocks::new();
        let _dev = locks.acquire("dev").await;

        tokio::time::timeout(Duration::from_secs(1), locks.acquire("prod"))
            .await
            .expect("prod lock should be free");
    }
}
