//! Configuration view and validation commands — `scour config`.

use anyhow::Result;
use scour::scour_config::{CONFIG_FILE_NAME, ScourToml};
use std::path::Path;

use crate::ConfigCommands;

pub fn cmd_config(config_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Scour Configuration");
            println!("===================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                print_toml(&ScourToml::load(&config_path)?);
            } else {
                println!("No {} found at {}", CONFIG_FILE_NAME, config_path.display());
                println!();
                println!("Using default configuration:");
                print_toml(&ScourToml::default());
                println!("Run 'scour config init' to create a {} file.", CONFIG_FILE_NAME);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE_NAME);
                return Ok(());
            }

            let toml = ScourToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            let toml = ScourToml::default();
            toml.save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [source] url, remote");
            println!("  - [filter] max_blob_size_mb, strip_extensions, strip_paths");
            println!("  - [run] auto_confirm, rewrite_only, workspace_root");
            println!("  - [tools] git_cmd, python_cmd");
            println!();
        }
    }

    Ok(())
}

fn print_toml(toml: &ScourToml) {
    println!("[source]");
    match &toml.source.url {
        Some(url) => println!("  url = \"{}\"", url),
        None => println!("  url = (unset)"),
    }
    println!("  remote = \"{}\"", toml.source.remote);
    println!();
    println!("[filter]");
    println!("  max_blob_size_mb = {}", toml.filter.max_blob_size_mb);
    println!("  strip_extensions = {:?}", toml.filter.strip_extensions);
    println!("  strip_paths = {:?}", toml.filter.strip_paths);
    println!();
    println!("[run]");
    println!("  auto_confirm = {}", toml.run.auto_confirm);
    println!("  rewrite_only = {}", toml.run.rewrite_only);
    if toml.run.workspace_root.is_empty() {
        println!("  workspace_root = (system temp dir)");
    } else {
        println!("  workspace_root = \"{}\"", toml.run.workspace_root);
    }
    println!();
    println!("[tools]");
    println!("  git_cmd = \"{}\"", toml.tools.git_cmd);
    println!("  python_cmd = \"{}\"", toml.tools.python_cmd);
    println!();
}
