use crate::cli::OutputFormat;
use chrono::{DateTime, Utc};
use crossacct::config::Config;
use crossacct::{CachedCredential, CredentialResolver, Result};
use serde::Serialize;
use std::path::PathBuf;

/// `credential_process` output understood by the AWS SDKs and CLI
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ProcessOutput<'a> {
    version: u8,
    access_key_id: &'a str,
    secret_access_key: &'a str,
    session_token: &'a str,
    expiration: DateTime<Utc>,
}

impl<'a> ProcessOutput<'a> {
    fn new(record: &'a CachedCredential) -> Self {
        Self {
            version: 1,
            access_key_id: &record.credentials.access_key_id,
            secret_access_key: &record.credentials.secret_access_key,
            session_token: &record.credentials.session_token,
            expiration: record.expire_time,
        }
    }
}

pub async fn execute(
    config_path: Option<PathBuf>,
    account_id: String,
    format: OutputFormat,
) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    let resolver = CredentialResolver::from_config(&config)?;

    let record = resolver.resolve(&config.accounts, &account_id).await?;

    match format {
        OutputFormat::Json => {
            let output = ProcessOutput::new(&record);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Env => {
            let creds = &record.credentials;
            println!("export AWS_ACCESS_KEY_ID=\"{}\"", creds.access_key_id);
            println!(
                "export AWS_SECRET_ACCESS_KEY=\"{}\"",
                creds.secret_access_key
            );
            println!("export AWS_SESSION_TOKEN=\"{}\"", creds.session_token);
            println!(
                "# Credentials expire at: {}",
                record.expire_time.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crossacct::Credentials;

    #[test]
    fn test_process_output_shape() {
        let expiry = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let record = CachedCredential::new(
            Credentials {
                access_key_id: "ASIA1".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: "token".to_string(),
            },
            expiry,
        );

        let json = serde_json::to_value(ProcessOutput::new(&record)).unwrap();
        assert_eq!(json["Version"], 1);
        assert_eq!(json["AccessKeyId"], "ASIA1");
        assert_eq!(json["SecretAccessKey"], "secret");
        assert_eq!(json["SessionToken"], "token");
        assert_eq!(json["Expiration"], "2024-05-01T10:00:00Z");
    }
}
