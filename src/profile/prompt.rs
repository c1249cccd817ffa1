use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};

/// What the user is asked to authorise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaRequest {
    pub profile: String,
    pub mfa_serial: String,
}

/// Asks a human for a one-time MFA code
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MfaPrompt: Send + Sync {
    async fn request_token(&self, request: MfaRequest) -> Result<String>;
}

/// Prompts on stderr and reads the code from stdin
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MfaPrompt for TerminalPrompt {
    async fn request_token(&self, request: MfaRequest) -> Result<String> {
        let MfaRequest {
            profile,
            mfa_serial,
        } = request;

        let input = tokio::task::spawn_blocking({
            let profile = profile.clone();
            move || -> io::Result<Option<String>> {
                eprint!("MFA code for {} (profile {}): ", mfa_serial, profile);
                io::stderr().flush()?;

                let mut line = String::new();
                let read = io::stdin().lock().read_line(&mut line)?;
                Ok((read > 0).then_some(line))
            }
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;

        match input.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Ok(code.to_string()),
            _ => {
                tracing::debug!("No MFA code entered for profile {}", profile);
                Err(ResolveError::MfaPromptCancelled { profile })
            }
        }
    }
}
