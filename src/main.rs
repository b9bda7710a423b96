use clap::Parser;
use insysdb_cli::cli::dispatcher::Dispatcher;
use insysdb_cli::cli::main_types::Cli;
use insysdb_cli::storage::cache::FileCacheStore;
use insysdb_cli::storage::config::{Config, Profile};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load Config
    let config_path = cli
        .config_dir
        .as_ref()
        .map(|dir| PathBuf::from(dir).join("config.toml"));

    let mut config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    // Determine the profile to use
    let profile_name = cli
        .profile
        .or(config.default_profile.clone())
        .unwrap_or_else(|| "default".to_string());

    // Create a default profile if it doesn't exist
    if config.get_profile(&profile_name).is_none() {
        if cli.verbose {
            println!("Creating default profile: {}", profile_name);
        }

        config.set_profile(profile_name.clone(), Profile::default());

        if config.default_profile.is_none() {
            config.default_profile = Some(profile_name.clone());
        }

        if let Err(err) = config.save(config_path) {
            if cli.verbose {
                println!("Warning: Failed to save config: {}", err);
            }
        }
    }

    if cli.verbose {
        println!("Verbose mode is enabled");
        println!("Using profile: {}", profile_name);

        if let Some(config_dir) = &cli.config_dir {
            println!("Using config directory: {}", config_dir);
        }
    }

    let profile = config
        .get_profile(&profile_name)
        .cloned()
        .unwrap_or_default();

    // Token and dictionary caches live in the platform temp directory
    let cache = Arc::new(FileCacheStore::new());

    let dispatcher = Dispatcher::new(
        profile_name,
        profile,
        cli.credentials,
        cache,
        cli.verbose,
    );

    // Execute the command
    if let Err(e) = dispatcher.dispatch(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
