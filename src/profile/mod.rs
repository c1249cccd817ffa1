// Named-profile credential resolution (STS with optional MFA, or SSO)
mod acquire;
mod prompt;
mod store;

pub use acquire::{AcquireRequest, RoleAssumer, StsRoleAssumer};
pub use prompt::{MfaPrompt, MfaRequest, TerminalPrompt};
pub use store::{AwsConfigProfileStore, ProfileStore};

#[cfg(test)]
pub use acquire::MockRoleAssumer;
#[cfg(test)]
pub use prompt::MockMfaPrompt;
#[cfg(test)]
pub use store::MockProfileStore;

use crate::clock::Clock;
use crate::credentials::{CredentialCache, ProfileLocks};
use crate::error::{ResolveError, Result};
use crate::models::{CachedCredential, ProfileAttributes, StandardProfile};
use crate::sso::{RoleCredentialsExchange, SsoCredentialResolver, SsoTokenLocator};
use std::sync::Arc;

/// Resolves credentials for a named profile, serving from the cache while valid
pub struct ProfileCredentialResolver {
    store: Arc<dyn ProfileStore>,
    assumer: Arc<dyn RoleAssumer>,
    prompt: Arc<dyn MfaPrompt>,
    locator: SsoTokenLocator,
    sso: SsoCredentialResolver,
    cache: Arc<CredentialCache>,
    locks: ProfileLocks,
    clock: Arc<dyn Clock>,
}

impl ProfileCredentialResolver {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        assumer: Arc<dyn RoleAssumer>,
        prompt: Arc<dyn MfaPrompt>,
        exchange: Arc<dyn RoleCredentialsExchange>,
        locator: SsoTokenLocator,
        cache: Arc<CredentialCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            assumer,
            prompt,
            locator,
            sso: SsoCredentialResolver::new(exchange, cache.clone()),
            cache,
            locks: ProfileLocks::new(),
            clock,
        }
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    /// Resolve credentials for `profile_name`, returning the record as cached
    /// so callers see the same expiry the cache holds
    pub async fn resolve_with_profile(
        &self,
        profile_name: &str,
        target_identity: &str,
    ) -> Result<CachedCredential> {
        let _guard = self.locks.acquire(profile_name).await;

        if let Some(cached) = self.cache.get(profile_name)? {
            let now = self.clock.now();
            if cached.is_valid_at(now) {
                tracing::debug!(
                    "Using cached credentials for profile {} ({}m left)",
                    profile_name,
                    cached.expires_in_minutes(now)
                );
                return Ok(cached);
            }
            tracing::debug!(
                "Cached credentials for profile {} expired at {}",
                profile_name,
                cached.expire_time
            );
        }

        let attributes = self
            .store
            .profile(profile_name)?
            .ok_or_else(|| ResolveError::ProfileNotFound {
                profile: profile_name.to_string(),
            })?;

        match attributes {
            ProfileAttributes::Sso(profile) => {
                let token = self
                    .locator
                    .find_valid_token(&profile.start_url, &profile.region)?;
                self.sso
                    .resolve_with_sso(profile_name, &profile, &token, target_identity)
                    .await
            }
            ProfileAttributes::Standard(profile) => {
                self.resolve_standard(profile_name, profile, target_identity)
                    .await
            }
        }
    }

    async fn resolve_standard(
        &self,
        profile_name: &str,
        profile: StandardProfile,
        target_identity: &str,
    ) -> Result<CachedCredential> {
        let mfa_code = match profile.mfa_serial.clone() {
            Some(mfa_serial) => Some(
                self.prompt
                    .request_token(MfaRequest {
                        profile: profile_name.to_string(),
                        mfa_serial,
                    })
                    .await?,
            ),
            None => None,
        };

        let record = self
            .assumer
            .acquire(AcquireRequest {
                profile_name: profile_name.to_string(),
                target_identity: target_identity.to_string(),
                profile,
                mfa_code,
            })
            .await?;

        self.cache.put(profile_name, &record)?;

        tracing::info!(
            "Resolved credentials for profile {} ({})",
            profile_name,
            record.credentials.access_key_id
        );
        Ok(record)
    }
}
