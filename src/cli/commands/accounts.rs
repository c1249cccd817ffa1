use crossacct::config::Config;
use crossacct::Result;
use std::path::PathBuf;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;

    if config.accounts.is_empty() {
        println!("No accounts configured");
        println!("\nTo create a sample config file, run:");
        println!("  crossacct config init");
        return Ok(());
    }

    println!("{:<14} PROFILE", "ACCOUNT");
    for (account_id, strategy) in config.accounts.iter() {
        println!(
            "{:<14} {}",
            account_id,
            strategy.profile.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
