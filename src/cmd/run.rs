//! Pipeline execution — `scour run`.
//!
//! Wires the resolved configuration to the real subprocess runner and the
//! terminal prompter, runs the pipeline, and maps the outcome to the
//! process exit contract: zero on publish, rewrite-only completion, or
//! operator decline; non-zero on any fatal stage failure. Every fatal stop
//! prints the backup bundle location (when one exists) as the recovery
//! path.

use anyhow::Result;
use scour::exec::SystemRunner;
use scour::gates::TerminalPrompter;
use scour::pipeline::{Pipeline, PipelineOutcome};
use scour::scour_config::{CliOverrides, ScourConfig, ScourToml};
use scour::ui::PipelineUI;
use std::path::Path;

pub async fn cmd_run(config_dir: &Path, cli: &CliOverrides, verbose: bool) -> Result<()> {
    let toml = ScourToml::load_or_default(config_dir)?;
    let config = ScourConfig::resolve(&toml, cli)?;

    let runner = SystemRunner;
    let mut prompter = TerminalPrompter;
    let ui = PipelineUI::new(verbose);

    let result = Pipeline::new(&config, &runner, &mut prompter, &ui)
        .run()
        .await;

    match result {
        Ok(PipelineOutcome::Published { workspace, bundle }) => {
            println!(
                "Workspace kept for inspection: {} (bundle: {})",
                workspace.display(),
                bundle
                    .map(|b| b.path.display().to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            Ok(())
        }
        Ok(PipelineOutcome::RewriteCompleted { workspace, bundle }) => {
            println!(
                "Rewritten mirror kept at {}; publish it later with 'git push --mirror {}' \
                 from inside the mirror (bundle: {})",
                workspace.display(),
                config.remote,
                bundle
                    .map(|b| b.path.display().to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            Ok(())
        }
        Ok(PipelineOutcome::Declined { workspace, .. }) => {
            // A decline is a clean halt, not an error.
            println!("Workspace kept at {}", workspace.display());
            Ok(())
        }
        Err(failure) => {
            ui.recovery_hint(failure.bundle.as_ref());
            if let Some(workspace) = &failure.workspace {
                eprintln!("Workspace kept at {}", workspace.display());
            }
            Err(anyhow::Error::new(failure.error)
                .context("pipeline halted; no destructive step beyond the failed stage ran"))
        }
    }
}
