//! Rewrite-command preview — `scour preview`.
//!
//! Builds the filter command from the resolved criteria and prints it
//! without creating a workspace or touching anything. What this prints is
//! exactly what `scour run` would execute.

use anyhow::Result;
use scour::filter;
use scour::scour_config::{CliOverrides, ScourConfig, ScourToml};
use std::path::Path;

pub fn cmd_preview(config_dir: &Path, cli: &CliOverrides) -> Result<()> {
    let toml = ScourToml::load_or_default(config_dir)?;

    // Preview does not need a source URL; substitute a placeholder so the
    // criteria can still be resolved from file + flags.
    let mut cli = cli.clone();
    if cli.source_url.is_none() && toml.source.url.is_none() {
        cli.source_url = Some("<unset>".to_string());
    }
    let config = ScourConfig::resolve(&toml, &cli)?;

    let command = filter::build_command(&config.criteria);
    if config.criteria.is_trivial() {
        eprintln!("warning: removal criteria are empty; this command strips nothing");
    }
    println!("{}", command.preview);
    Ok(())
}
