//! Terminal UI for the scour pipeline.
//!
//! One stage line per pipeline step, an `indicatif` spinner across the long
//! subprocess waits (clone, bundle, rewrite, push), and a verbatim preview
//! block for the rewrite command. Styling via `console`; everything degrades
//! to plain lines on a dumb terminal.

use crate::backup::BackupBundle;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct PipelineUI {
    verbose: bool,
}

impl PipelineUI {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Opening banner: what will be rewritten and where the work happens.
    pub fn banner(&self, source_url: &str, workspace: &std::path::Path) {
        println!();
        println!("{}", style("scour — history rewrite").bold());
        println!("  source:    {}", style(source_url).cyan());
        println!("  workspace: {}", workspace.display());
        println!();
    }

    /// Announce a stage and return a ticking spinner for its duration.
    ///
    /// The caller finishes the spinner with [`Self::stage_done`] or lets a
    /// failure path drop it (the bar clears itself on drop).
    pub fn stage(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .expect("spinner template is a valid static string"),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    pub fn stage_done(&self, spinner: ProgressBar, message: &str) {
        spinner.finish_and_clear();
        println!("  {} {}", style("✓").green(), message);
    }

    pub fn warn(&self, message: &str) {
        println!("  {} {}", style("⚠").yellow().bold(), message);
    }

    /// The strong warning for a lost backup. Deliberately loud: continuing
    /// past this point without a bundle leaves no rollback mechanism.
    pub fn backup_failure(&self, detail: &str) {
        println!();
        println!(
            "  {} {}",
            style("⚠ NO BACKUP BUNDLE").yellow().bold(),
            style(detail).yellow()
        );
        println!(
            "  {}",
            style("If you proceed, the rewrite and publish cannot be rolled back.").yellow()
        );
        println!();
    }

    /// Show the rewrite command exactly as it will be executed.
    pub fn preview(&self, preview: &str) {
        println!();
        println!("  {}", style("rewrite command (runs verbatim):").bold());
        println!("    {}", style(preview).cyan());
        println!();
    }

    pub fn declined(&self, checkpoint: &str) {
        println!();
        println!(
            "{} {}",
            style("Halted:").bold(),
            format!("operator declined at the {} checkpoint. Nothing was published.", checkpoint)
        );
    }

    pub fn verification(&self, summary: &str) {
        println!("  {} references verified: {}", style("✓").green(), summary);
    }

    pub fn success(&self, message: &str) {
        println!();
        println!("{} {}", style("Done:").green().bold(), message);
    }

    /// Fatal-stop epilogue: name the recovery path, per the error contract.
    pub fn recovery_hint(&self, bundle: Option<&BackupBundle>) {
        match bundle {
            Some(bundle) => {
                println!();
                println!(
                    "{} the backup bundle at {} ({} bytes, sha256 {}) is the recovery path.",
                    style("Recovery:").bold(),
                    style(bundle.path.display()).cyan(),
                    bundle.bytes,
                    &bundle.sha256[..12.min(bundle.sha256.len())]
                );
            }
            None => {
                println!();
                println!(
                    "{} no backup bundle was created for this run.",
                    style("Recovery:").bold()
                );
            }
        }
    }

    pub fn detail(&self, message: &str) {
        if self.verbose {
            println!("    {}", style(message).dim());
        }
    }
}
