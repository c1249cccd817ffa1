use crate::error::{ResolveError, Result};
use crate::models::{CachedCredential, Credentials, StandardProfile};
use async_trait::async_trait;
use aws_sdk_sts::Client as StsClient;
use aws_smithy_types::DateTime as SmithyDateTime;
use aws_types::SdkConfig;
use chrono::{DateTime, TimeZone, Utc};

const DEFAULT_DURATION_SECONDS: i32 = 3600;

/// Input for one STS acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireRequest {
    pub profile_name: String,
    pub target_identity: String,
    pub profile: StandardProfile,
    pub mfa_code: Option<String>,
}

impl AcquireRequest {
    fn session_name(&self) -> String {
        self.profile
            .role_session_name
            .clone()
            .unwrap_or_else(|| format!("crossacct-{}", self.target_identity))
    }

    fn duration_seconds(&self) -> i32 {
        self.profile
            .duration_seconds
            .unwrap_or(DEFAULT_DURATION_SECONDS)
    }
}

/// Obtains temporary credentials for a non-SSO profile
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn acquire(&self, request: AcquireRequest) -> Result<CachedCredential>;
}

/// STS AssumeRole / GetSessionToken.
///
/// Base credentials come from the SDK's own profile chain, so any
/// `source_profile` recursion happens there.
#[derive(Debug, Default)]
pub struct StsRoleAssumer;

impl StsRoleAssumer {
    pub fn new() -> Self {
        Self
    }

    async fn sdk_config(profile_name: Option<&str>, region: Option<&str>) -> SdkConfig {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(name) = profile_name {
            loader = loader.profile_name(name);
        }
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }

        loader.load().await
    }

    async fn assume_role(&self, request: &AcquireRequest, role_arn: &str) -> Result<CachedCredential> {
        let profile = &request.profile;
        let config = Self::sdk_config(profile.source_profile.as_deref(), profile.region.as_deref()).await;
        let client = StsClient::new(&config);

        tracing::debug!(
            "Assuming {} for profile {} (mfa: {})",
            role_arn,
            request.profile_name,
            request.mfa_code.is_some()
        );

        let response = client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(request.session_name())
            .duration_seconds(request.duration_seconds())
            .set_external_id(profile.external_id.clone())
            .set_serial_number(request.mfa_code.as_ref().and(profile.mfa_serial.clone()))
            .set_token_code(request.mfa_code.clone())
            .send()
            .await
            .map_err(|e| {
                ResolveError::CredentialAcquisitionFailed(format!("AssumeRole failed: {}", e))
            })?;

        let creds = response.credentials().ok_or_else(|| {
            ResolveError::CredentialAcquisitionFailed("No credentials in AssumeRole response".to_string())
        })?;

        into_cached(
            creds.access_key_id(),
            creds.secret_access_key(),
            creds.session_token(),
            creds.expiration(),
        )
    }

    async fn session_token(&self, request: &AcquireRequest) -> Result<CachedCredential> {
        let profile = &request.profile;
        let config = Self::sdk_config(Some(&request.profile_name), profile.region.as_deref()).await;
        let client = StsClient::new(&config);

        tracing::debug!(
            "Requesting session token for profile {} (mfa: {})",
            request.profile_name,
            request.mfa_code.is_some()
        );

        let response = client
            .get_session_token()
            .duration_seconds(request.duration_seconds())
            .set_serial_number(request.mfa_code.as_ref().and(profile.mfa_serial.clone()))
            .set_token_code(request.mfa_code.clone())
            .send()
            .await
            .map_err(|e| {
                ResolveError::CredentialAcquisitionFailed(format!("GetSessionToken failed: {}", e))
            })?;

        let creds = response.credentials().ok_or_else(|| {
            ResolveError::CredentialAcquisitionFailed(
                "No credentials in GetSessionToken response".to_string(),
            )
        })?;

        into_cached(
            creds.access_key_id(),
            creds.secret_access_key(),
            creds.session_token(),
            creds.expiration(),
        )
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn acquire(&self, request: AcquireRequest) -> Result<CachedCredential> {
        match request.profile.role_arn.clone() {
            Some(role_arn) => self.assume_role(&request, &role_arn).await,
            None => self.session_token(&request).await,
        }
    }
}

fn into_cached(
    access_key_id: &str,
    secret_access_key: &str,
    session_token: &str,
    expiration: &SmithyDateTime,
) -> Result<CachedCredential> {
    let expire_time = to_chrono(expiration).ok_or_else(|| {
        ResolveError::CredentialAcquisitionFailed(format!("Invalid expiration timestamp: {:?}", expiration))
    })?;

    Ok(CachedCredential::new(
        Credentials {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: session_token.to_string(),
        },
        expire_time,
    ))
}

fn to_chrono(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(dt.secs(), dt.subsec_nanos()).single()
}
