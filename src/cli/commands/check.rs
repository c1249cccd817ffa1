use crossacct::config::Config;
use crossacct::{can_provide, Result};
use std::path::{Path, PathBuf};

pub fn execute(config_path: Option<PathBuf>, account_id: String) -> Result<()> {
    if is_configured(config_path.as_deref(), &account_id)? {
        println!("Account {} is configured", account_id);
        Ok(())
    } else {
        println!("No strategy configured for account {}", account_id);
        std::process::exit(1);
    }
}

// Only the account mapping matters; AWS config, caches and SDK clients stay untouched
fn is_configured(config_path: Option<&Path>, account_id: &str) -> Result<bool> {
    let config = Config::load(config_path)?;
    Ok(can_provide(&config.accounts, account_id))
}
