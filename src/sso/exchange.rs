use crate::error::{ResolveError, Result};
use crate::models::Credentials;
use async_trait::async_trait;
use aws_sdk_sso::Client as SsoClient;
use chrono::{DateTime, TimeZone, Utc};

/// GetRoleCredentials input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub region: String,
    pub role_name: String,
    pub account_id: String,
    pub access_token: String,
}

/// Role credentials returned by the SSO portal
#[derive(Debug, Clone)]
pub struct ExchangedCredentials {
    pub credentials: Credentials,
    pub expiration: Option<DateTime<Utc>>,
}

/// Trades an SSO access token for role credentials
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleCredentialsExchange: Send + Sync {
    async fn get_role_credentials(&self, request: ExchangeRequest) -> Result<ExchangedCredentials>;
}

/// AWS SSO portal (`sso:GetRoleCredentials`)
#[derive(Debug, Default)]
pub struct SsoPortalExchange;

impl SsoPortalExchange {
    pub fn new() -> Self {
        Self
    }

    async fn client(region: &str) -> SsoClient {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        SsoClient::new(&config)
    }
}

#[async_trait]
impl RoleCredentialsExchange for SsoPortalExchange {
    async fn get_role_credentials(&self, request: ExchangeRequest) -> Result<ExchangedCredentials> {
        tracing::debug!(
            "Requesting role credentials for {} in account {}",
            request.role_name,
            request.account_id
        );

        let client = Self::client(&request.region).await;
        let response = client
            .get_role_credentials()
            .access_token(&request.access_token)
            .account_id(&request.account_id)
            .role_name(&request.role_name)
            .send()
            .await
            .map_err(|e| {
                ResolveError::TokenExchangeFailed(format!("Failed to get role credentials: {}", e))
            })?;

        let role_creds = response.role_credentials().ok_or_else(|| {
            ResolveError::TokenExchangeFailed("No role_credentials in response".to_string())
        })?;

        let access_key_id = role_creds
            .access_key_id()
            .ok_or_else(|| missing_field("access_key_id"))?
            .to_string();

        let secret_access_key = role_creds
            .secret_access_key()
            .ok_or_else(|| missing_field("secret_access_key"))?
            .to_string();

        let session_token = role_creds
            .session_token()
            .ok_or_else(|| missing_field("session_token"))?
            .to_string();

        Ok(ExchangedCredentials {
            credentials: Credentials {
                access_key_id,
                secret_access_key,
                session_token,
            },
            expiration: expiration_from_millis(role_creds.expiration()),
        })
    }
}

fn missing_field(name: &str) -> ResolveError {
    ResolveError::TokenExchangeFailed(format!("No {} in credentials", name))
}

/// The portal reports expiry as epoch milliseconds, 0 when absent
fn expiration_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_from_millis() {
        assert_eq!(expiration_from_millis(0), None);
        assert_eq!(
            expiration_from_millis(1_714_557_600_000),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).single()
        );
    }
}
