//! Message Authentication Facility - Entry Point
//!
//! Small operational CLI around the registry: inspect the available plugins,
//! validate a configuration file, and show the bindings a configuration
//! produces.

// Force-link maf-providers so linkme plugin registrations are included
extern crate maf_providers;

use clap::{Parser, Subcommand};

use maf::config::ConfigLoader;
use maf::core::plugin;
use maf::{build_registry, init_logging};

/// Command line interface for the Message Authentication Facility
#[derive(Parser, Debug)]
#[command(name = "maf")]
#[command(about = "Message Authentication Facility - pluggable auth module stacks")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered module and provider plugins
    Plugins,
    /// Load the configuration and print the effective values
    Config,
    /// Build the registry from configuration and print its bindings
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let config = loader.load()?;
    init_logging(&config.logging)?;

    match cli.command {
        Command::Plugins => {
            println!("modules:");
            for (name, description) in plugin::list_modules() {
                println!("  {name} - {description}");
            }
            println!("providers:");
            for (name, description) in plugin::list_providers() {
                println!("  {name} - {description}");
            }
        }
        Command::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Command::Check => {
            let registry = build_registry(&config)?;
            let mut ids = registry.binding_ids();
            ids.sort();
            if ids.is_empty() {
                println!("no bindings registered");
            }
            for id in ids {
                match maf::key::RegistrationKey::decode(&id) {
                    Ok(key) => println!("{id}  ({key})"),
                    Err(_) => println!("{id}"),
                }
            }
        }
    }

    Ok(())
}
