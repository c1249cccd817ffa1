use crate::cli::CacheCommand;
use chrono::Utc;
use crossacct::config::Config;
use crossacct::Result;
use std::path::PathBuf;

pub fn execute(config_path: Option<PathBuf>, command: CacheCommand) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    let cache = config.credential_cache()?;

    match command {
        CacheCommand::List => {
            let entries = cache.entries()?;
            if entries.is_empty() {
                println!("Credential cache is empty ({})", cache.path().display());
                return Ok(());
            }

            let now = Utc::now();
            println!("{:<24} {:<22} STATUS", "PROFILE", "ACCESS KEY");
            for (profile, cached) in entries {
                let status = if cached.is_valid_at(now) {
                    format!("valid ({}m left)", cached.expires_in_minutes(now))
                } else {
                    "EXPIRED".to_string()
                };
                println!(
                    "{:<24} {:<22} {}",
                    profile, cached.credentials.access_key_id, status
                );
            }
        }
        CacheCommand::Clear { profile: Some(profile) } => {
            if cache.remove(&profile)? {
                eprintln!("✓ Removed cached credentials for {}", profile);
            } else {
                eprintln!("No cached credentials for {}", profile);
            }
        }
        CacheCommand::Clear { profile: None } => {
            cache.clear()?;
            eprintln!("✓ Cleared {}", cache.path().display());
        }
    }

    Ok(())
}
