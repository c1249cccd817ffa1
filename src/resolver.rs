// Entry point: account id -> configured strategy -> credentials
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::credentials::CredentialCache;
use crate::error::{ResolveError, Result};
use crate::models::{AccountMapping, CachedCredential};
use crate::profile::{AwsConfigProfileStore, ProfileCredentialResolver, StsRoleAssumer, TerminalPrompt};
use crate::sso::{SsoPortalExchange, SsoTokenLocator};
use std::sync::Arc;

/// Resolves credentials for target accounts.
///
/// The account mapping is passed to every call rather than held here, so
/// [`can_provide`] and `resolve` never depend on each other's side effects.
pub struct CredentialResolver {
    profiles: ProfileCredentialResolver,
}

impl CredentialResolver {
    pub fn new(profiles: ProfileCredentialResolver) -> Self {
        Self { profiles }
    }

    /// Wire the real collaborators: ~/.aws/config, STS, the SSO portal and a
    /// terminal MFA prompt
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let cache = config.credential_cache()?;

        let locator = match &config.sso.cache_dir {
            Some(dir) => SsoTokenLocator::at(dir, clock.clone()),
            None => SsoTokenLocator::new(clock.clone())?,
        };

        tracing::debug!(
            "Credential cache at {}, SSO tokens from {}",
            cache.path().display(),
            locator.cache_dir().display()
        );

        Ok(Self::new(ProfileCredentialResolver::new(
            Arc::new(AwsConfigProfileStore::new()?),
            Arc::new(StsRoleAssumer::new()),
            Arc::new(TerminalPrompt::new()),
            Arc::new(SsoPortalExchange::new()),
            locator,
            Arc::new(cache),
            clock,
        )))
    }

    pub fn cache(&self) -> &CredentialCache {
        self.profiles.cache()
    }

    /// Resolve credentials for `identity`, with the expiry they are cached under
    pub async fn resolve(
        &self,
        mapping: &AccountMapping,
        identity: &str,
    ) -> Result<CachedCredential> {
        let profile = strategy_profile(mapping, identity)?;

        tracing::debug!("Resolving account {} via profile {}", identity, profile);
        self.profiles.resolve_with_profile(profile, identity).await
    }
}

/// Whether `identity` has a usable strategy in `mapping`.
///
/// Only the mapping is consulted; no profile, cache or SDK state is touched.
pub fn can_provide(mapping: &AccountMapping, identity: &str) -> bool {
    strategy_profile(mapping, identity).is_ok()
}

fn strategy_profile<'a>(mapping: &'a AccountMapping, identity: &str) -> Result<&'a str> {
    mapping
        .strategy(identity)
        .and_then(|strategy| strategy.profile.as_deref())
        .ok_or_else(|| ResolveError::NoStrategyConfigured {
            identity: identity.to_string(),
        })
}
