use crate::cli::ConfigCommand;
use crossacct::config::Config;
use crossacct::Result;
use std::path::PathBuf;

pub fn execute(config_path: Option<PathBuf>, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init => {
            let path = Config::create_sample(config_path.as_deref())?;
            println!("Created sample config file at: {}", path.display());
            println!("\nAdd one table per target account:");
            println!("  [accounts.\"111111111111\"]");
            println!("  profile = \"dev\"");
        }
        ConfigCommand::Path => {
            let path = match config_path {
                Some(path) => path,
                None => Config::config_file_path()?,
            };
            println!("Config file path: {}", path.display());

            if path.exists() {
                println!("Status: File exists");

                match Config::load(Some(&path)) {
                    Ok(config) => {
                        println!("Valid: Yes");
                        println!("Accounts: {}", config.accounts.iter().count());
                    }
                    Err(e) => {
                        println!("Valid: No");
                        println!("Error: {}", e);
                    }
                }
            } else {
                println!("Status: File does not exist");
                println!("\nTo create a sample config file, run:");
                println!("  crossacct config init");
            }
        }
    }

    Ok(())
}
