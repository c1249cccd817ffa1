// IAM Identity Center (SSO) credential resolution
mod exchange;
mod token_locator;

pub use exchange::{ExchangeRequest, ExchangedCredentials, RoleCredentialsExchange, SsoPortalExchange};
pub use token_locator::SsoTokenLocator;

#[cfg(test)]
pub use exchange::MockRoleCredentialsExchange;

use crate::credentials::CredentialCache;
use crate::error::{ResolveError, Result};
use crate::models::{CachedCredential, SsoProfile, SsoToken};
use std::sync::Arc;

/// Exchanges a cached SSO token for role credentials and caches the result
pub struct SsoCredentialResolver {
    exchange: Arc<dyn RoleCredentialsExchange>,
    cache: Arc<CredentialCache>,
}

impl SsoCredentialResolver {
    pub fn new(exchange: Arc<dyn RoleCredentialsExchange>, cache: Arc<CredentialCache>) -> Self {
        Self { exchange, cache }
    }

    /// Resolve role credentials for `profile_name` in `target_identity`.
    ///
    /// A profile pinned to another account via `sso_account_id` is rejected
    /// before any exchange. The cached record expires at the earlier of the
    /// token expiry and the portal-reported expiry.
    pub async fn resolve_with_sso(
        &self,
        profile_name: &str,
        profile: &SsoProfile,
        token: &SsoToken,
        target_identity: &str,
    ) -> Result<CachedCredential> {
        if let Some(pinned) = profile.account_id.as_deref() {
            if pinned != target_identity {
                return Err(ResolveError::AccountMismatch {
                    profile: profile_name.to_string(),
                    pinned: pinned.to_string(),
                    requested: target_identity.to_string(),
                });
            }
        }

        let exchanged = self
            .exchange
            .get_role_credentials(ExchangeRequest {
                region: profile.region.clone(),
                role_name: profile.role_name.clone(),
                account_id: target_identity.to_string(),
                access_token: token.access_token.clone(),
            })
            .await?;

        let expire_time = match exchanged.expiration {
            Some(expiration) => expiration.min(token.expires_at),
            None => token.expires_at,
        };

        let record = CachedCredential::new(exchanged.credentials, expire_time);
        self.cache.put(profile_name, &record)?;

        tracing::info!(
            "Resolved SSO credentials for profile {} ({})",
            profile_name,
            record.credentials.access_key_id
        );
        Ok(record)
    }
}
