//! The history-rewrite pipeline.
//!
//! Strictly linear: Workspace → Backup → Filter Spec → Rewrite →
//! GC/compact → Verify → Confirmation → Publish. Each stage's success is a
//! precondition for the next; a fatal failure halts the run where it was
//! detected, and the backup bundle is the only recovery mechanism. The two
//! destructive transitions (rewrite, publish) sit behind the confirmation
//! gate; declining either halts cleanly with nothing further executed.

use crate::backup::{self, BackupBundle};
use crate::errors::{PipelineError, Stage};
use crate::exec::CommandRunner;
use crate::filter::{self, FilterCommand};
use crate::gates::{CheckpointKind, ConfirmationGate, Prompter};
use crate::publish;
use crate::report::{ReportWriter, StageStatus};
use crate::rewrite::{self, RewriteExecutor};
use crate::scour_config::ScourConfig;
use crate::ui::PipelineUI;
use crate::verify;
use crate::workspace;
use std::path::{Path, PathBuf};

/// Terminal value of a run that did not fail.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Remote history replaced.
    Published {
        workspace: PathBuf,
        bundle: Option<BackupBundle>,
    },
    /// Rewrite-only mode: mirror rewritten and verified, nothing published.
    RewriteCompleted {
        workspace: PathBuf,
        bundle: Option<BackupBundle>,
    },
    /// Operator declined a checkpoint. Clean halt, zero exit.
    Declined {
        checkpoint: CheckpointKind,
        workspace: PathBuf,
        bundle: Option<BackupBundle>,
    },
}

/// A fatal stop, paired with whatever recovery context exists at that point.
#[derive(Debug)]
pub struct PipelineFailure {
    pub error: PipelineError,
    pub workspace: Option<PathBuf>,
    pub bundle: Option<BackupBundle>,
}

impl PipelineFailure {
    fn early(error: PipelineError) -> Self {
        Self {
            error,
            workspace: None,
            bundle: None,
        }
    }
}

pub struct Pipeline<'a> {
    config: &'a ScourConfig,
    runner: &'a dyn CommandRunner,
    prompter: &'a mut dyn Prompter,
    ui: &'a PipelineUI,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a ScourConfig,
        runner: &'a dyn CommandRunner,
        prompter: &'a mut dyn Prompter,
        ui: &'a PipelineUI,
    ) -> Self {
        Self {
            config,
            runner,
            prompter,
            ui,
        }
    }

    pub async fn run(mut self) -> Result<PipelineOutcome, PipelineFailure> {
        let git = self.config.git_cmd.clone();

        // Environment + workspace. Nothing destructive yet, so there is no
        // report to write into until the workspace exists.
        workspace::ensure_git(self.runner, &git)
            .await
            .map_err(PipelineFailure::early)?;
        let ws = workspace::create_workspace(&self.config.workspace_root)
            .map_err(PipelineFailure::early)?;
        self.ui.banner(&self.config.source_url, &ws);

        let mut report = ReportWriter::new(&ws, &self.config.source_url);
        let fail = |error: PipelineError, bundle: &Option<BackupBundle>| PipelineFailure {
            error,
            workspace: Some(ws.clone()),
            bundle: bundle.clone(),
        };
        let none: Option<BackupBundle> = None;

        report
            .stage_started(Stage::Workspace)
            .map_err(|e| fail(report_error(&ws, e), &none))?;
        report
            .stage_finished(Stage::Workspace, StageStatus::Succeeded, None)
            .map_err(|e| fail(report_error(&ws, e), &none))?;

        // Mirror clone.
        report
            .stage_started(Stage::Clone)
            .map_err(|e| fail(report_error(&ws, e), &none))?;
        let spinner = self.ui.stage("mirroring source repository...");
        let mirror = match workspace::clone_mirror(self.runner, &git, &self.config.source_url, &ws)
            .await
        {
            Ok(mirror) => mirror,
            Err(error) => {
                drop(spinner);
                let _ = report.stage_finished(
                    Stage::Clone,
                    StageStatus::Failed,
                    Some(error.to_string()),
                );
                let _ = report.finish("failed: clone");
                return Err(fail(error, &none));
            }
        };
        self.ui.stage_done(spinner, "mirror clone complete");
        report
            .stage_finished(Stage::Clone, StageStatus::Succeeded, None)
            .map_err(|e| fail(report_error(&ws, e), &none))?;

        // Backup bundle — before anything touches the mirror. A failure is
        // non-fatal but never silent: the rewrite checkpoint below is the
        // consent point for continuing without a rollback path.
        report
            .stage_started(Stage::Backup)
            .map_err(|e| fail(report_error(&ws, e), &none))?;
        let spinner = self.ui.stage("writing backup bundle...");
        let bundle = match backup::create_backup_bundle(self.runner, &git, &mirror, &ws).await {
            Ok(bundle) => {
                self.ui.stage_done(
                    spinner,
                    &format!(
                        "backup bundle at {} ({} bytes)",
                        bundle.path.display(),
                        bundle.bytes
                    ),
                );
                report
                    .set_bundle(&bundle)
                    .map_err(|e| fail(report_error(&ws, e), &none))?;
                report
                    .stage_finished(Stage::Backup, StageStatus::Succeeded, None)
                    .map_err(|e| fail(report_error(&ws, e), &none))?;
                Some(bundle)
            }
            Err(failure) => {
                drop(spinner);
                self.ui.backup_failure(&failure.detail);
                report
                    .stage_finished(Stage::Backup, StageStatus::Warned, Some(failure.detail))
                    .map_err(|e| fail(report_error(&ws, e), &none))?;
                None
            }
        };

        // Filter specification: built once, previewed verbatim, executed
        // verbatim.
        report
            .stage_started(Stage::FilterSpec)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        let command: FilterCommand = filter::build_command(&self.config.criteria);
        if self.config.criteria.is_trivial() {
            self.ui
                .warn("removal criteria are empty; this rewrite will strip nothing");
        }
        self.ui.preview(&command.preview);
        report
            .set_preview(&command.preview)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        report
            .stage_finished(Stage::FilterSpec, StageStatus::Succeeded, None)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;

        // Rewrite checkpoint.
        let mut gate = ConfirmationGate::new(self.config.auto_confirm);
        let state = gate
            .resolve(CheckpointKind::Rewrite, self.prompter)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        report
            .set_confirmations(gate.rewrite, gate.publish)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        if !state.permits() {
            self.ui.declined("rewrite");
            let _ = report.finish("declined: rewrite checkpoint");
            return Ok(PipelineOutcome::Declined {
                checkpoint: CheckpointKind::Rewrite,
                workspace: ws,
                bundle,
            });
        }

        // Rewrite.
        report
            .stage_started(Stage::Rewrite)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        let executor = RewriteExecutor::new(&git, &self.config.python_cmd);
        let spinner = self.ui.stage("rewriting history...");
        match executor.execute(self.runner, &mirror, &command.args).await {
            Ok(result) => {
                self.ui
                    .stage_done(spinner, &format!("history rewritten via {}", result.strategy));
                report
                    .stage_finished(
                        Stage::Rewrite,
                        StageStatus::Succeeded,
                        Some(result.strategy),
                    )
                    .map_err(|e| fail(report_error(&ws, e), &bundle))?;
            }
            Err(error) => {
                drop(spinner);
                if let PipelineError::RewriteUnavailable { attempts } = &error {
                    for attempt in attempts {
                        self.ui
                            .warn(&format!("{}: {}", attempt.strategy, attempt.reason));
                    }
                }
                let _ = report.stage_finished(
                    Stage::Rewrite,
                    StageStatus::Failed,
                    Some(error.to_string()),
                );
                let _ = report.finish("failed: rewrite");
                return Err(fail(error, &bundle));
            }
        }

        // Compact. Failure is a warning: the rewritten refs are already
        // correct, the mirror is just bigger than it needs to be.
        report
            .stage_started(Stage::Compact)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        let spinner = self.ui.stage("compacting repository...");
        match rewrite::compact_repository(self.runner, &git, &mirror).await {
            Ok(()) => {
                self.ui.stage_done(spinner, "repository compacted");
                report
                    .stage_finished(Stage::Compact, StageStatus::Succeeded, None)
                    .map_err(|e| fail(report_error(&ws, e), &bundle))?;
            }
            Err(detail) => {
                drop(spinner);
                self.ui.warn(&format!("compaction failed: {}", detail));
                report
                    .stage_finished(Stage::Compact, StageStatus::Warned, Some(detail))
                    .map_err(|e| fail(report_error(&ws, e), &bundle))?;
            }
        }

        // Verify. The empty-reference check is the hard safety rail before
        // any push can happen.
        report
            .stage_started(Stage::Verify)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        let verification =
            match verify::verify(&mirror, &self.config.remote, &self.config.source_url) {
                Ok(verification) => verification,
                Err(error) => {
                    let _ = report.stage_finished(
                        Stage::Verify,
                        StageStatus::Failed,
                        Some(error.to_string()),
                    );
                    let _ = report.finish("failed: verify");
                    return Err(fail(error, &bundle));
                }
            };
        self.ui.verification(&verification.reference_summary());
        for warning in &verification.warnings {
            self.ui.warn(warning);
        }
        let verify_status = if verification.warnings.is_empty() {
            StageStatus::Succeeded
        } else {
            StageStatus::Warned
        };
        report
            .stage_finished(
                Stage::Verify,
                verify_status,
                Some(verification.reference_summary()),
            )
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;

        // Rewrite-only mode stops here, before the publish checkpoint is
        // ever reached — even under --yes.
        if self.config.rewrite_only {
            self.ui.success(
                "rewrite complete (rewrite-only mode); nothing was pushed to the remote",
            );
            let _ = report.finish("rewrite-only: completed without publish");
            return Ok(PipelineOutcome::RewriteCompleted {
                workspace: ws,
                bundle,
            });
        }

        // Publish checkpoint.
        let state = gate
            .resolve(CheckpointKind::Publish, self.prompter)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        report
            .set_confirmations(gate.rewrite, gate.publish)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        if !state.permits() {
            self.ui.declined("publish");
            let _ = report.finish("declined: publish checkpoint");
            return Ok(PipelineOutcome::Declined {
                checkpoint: CheckpointKind::Publish,
                workspace: ws,
                bundle,
            });
        }

        // Publish.
        report
            .stage_started(Stage::Publish)
            .map_err(|e| fail(report_error(&ws, e), &bundle))?;
        let spinner = self.ui.stage("force-replacing remote references...");
        match publish::publish(self.runner, &git, &mirror, &self.config.remote).await {
            Ok(outcome) => {
                self.ui
                    .stage_done(spinner, &format!("remote '{}' replaced", outcome.remote));
                report
                    .stage_finished(Stage::Publish, StageStatus::Succeeded, None)
                    .map_err(|e| fail(report_error(&ws, e), &bundle))?;
            }
            Err(error) => {
                drop(spinner);
                let _ = report.stage_finished(
                    Stage::Publish,
                    StageStatus::Failed,
                    Some(error.to_string()),
                );
                let _ = report.finish("failed: publish");
                return Err(fail(error, &bundle));
            }
        }

        self.ui
            .success("remote history replaced with the rewritten references");
        let _ = report.finish("published");
        Ok(PipelineOutcome::Published {
            workspace: ws,
            bundle,
        })
    }
}

/// A run report that cannot be written is a workspace problem: the audit
/// trail is part of the contract, not best-effort output.
fn report_error(workspace: &Path, e: anyhow::Error) -> PipelineError {
    PipelineError::Workspace {
        path: workspace.to_path_buf(),
        source: std::io::Error::other(format!("{e:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;
    use crate::filter::RemovalCriteria;
    use crate::gates::ConfirmState;
    use crate::report::{REPORT_FILE_NAME, RunReport};
    use anyhow::Result;
    use git2::{Repository, Signature};
    use tempfile::TempDir;

    struct ScriptedPrompter {
        answers: Vec<String>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().rev().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn read_line(&mut self, _prompt: &str) -> Result<String> {
            self.answers
                .pop()
                .ok_or_else(|| anyhow::anyhow!("prompter asked more questions than scripted"))
        }
    }

    fn commit_into(repo: &Repository) {
        let sig = Signature::now("test", "test@test.com").unwrap();
        let tree_id = {
            let mut index = repo.index().unwrap();
            let workdir = repo.workdir().unwrap();
            std::fs::write(workdir.join("kept.txt"), "contents").unwrap();
            index.add_path(Path::new("kept.txt")).unwrap();
            index.write().unwrap();
            index.write_tree().unwrap()
        };
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();
    }

    /// Runner whose `clone --mirror` rule materializes a repository at the
    /// clone target and whose `bundle create` rule writes the bundle file —
    /// the files a real git would have produced.
    fn scripted_runner(populated_mirror: bool, bundle_succeeds: bool) -> RecordingRunner {
        let runner = RecordingRunner::new();
        runner.push_rule_with_effect(RecordingRunner::ok_with("clone --mirror"), move |call| {
            let target = call.args.last().unwrap();
            let repo = Repository::init(target).unwrap();
            if populated_mirror {
                commit_into(&repo);
            }
        });
        if bundle_succeeds {
            runner.push_rule_with_effect(RecordingRunner::ok_with("bundle create"), |call| {
                std::fs::write(&call.args[2], b"bundle-bytes").unwrap();
            });
        } else {
            runner.push_rule(RecordingRunner::fail_with(
                "bundle create",
                128,
                "fatal: could not write bundle",
            ));
        }
        runner
    }

    fn test_config(root: &Path, auto_confirm: bool, rewrite_only: bool) -> ScourConfig {
        ScourConfig {
            source_url: "https://example.com/repo.git".to_string(),
            remote: "origin".to_string(),
            criteria: RemovalCriteria {
                paths: vec![],
                extensions: vec!["db".to_string()],
                max_blob_size_mb: 10,
            },
            auto_confirm,
            rewrite_only,
            workspace_root: root.to_path_buf(),
            git_cmd: "git".to_string(),
            python_cmd: "python3".to_string(),
        }
    }

    fn load_report(workspace: &Path) -> RunReport {
        let content = std::fs::read_to_string(workspace.join(REPORT_FILE_NAME)).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[tokio::test]
    async fn full_publish_run_under_auto_confirm() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, true);
        let config = test_config(root.path(), true, false);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&[]);

        let outcome = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap();

        let workspace = match outcome {
            PipelineOutcome::Published { workspace, bundle } => {
                assert!(bundle.is_some());
                workspace
            }
            other => panic!("expected Published, got {other:?}"),
        };

        assert!(runner.invoked("push --mirror origin"));
        let report = load_report(&workspace);
        assert_eq!(report.outcome.as_deref(), Some("published"));
        assert_eq!(report.rewrite_confirmation, ConfirmState::AutoConfirmed);
        assert_eq!(report.publish_confirmation, ConfirmState::AutoConfirmed);
    }

    #[tokio::test]
    async fn bundle_is_created_before_the_rewrite_runs() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, true);
        let config = test_config(root.path(), true, true);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&[]);

        Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap();

        let lines = runner.command_lines();
        let bundle_idx = lines.iter().position(|l| l.contains("bundle create")).unwrap();
        let rewrite_idx = lines.iter().position(|l| l.contains("filter-repo")).unwrap();
        assert!(
            bundle_idx < rewrite_idx,
            "bundle must precede rewrite: {lines:?}"
        );
    }

    #[tokio::test]
    async fn declining_the_rewrite_checkpoint_halts_before_any_rewrite() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, true);
        let config = test_config(root.path(), false, false);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&["no thanks"]);

        let outcome = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap();

        let workspace = match outcome {
            PipelineOutcome::Declined {
                checkpoint: CheckpointKind::Rewrite,
                workspace,
                ..
            } => workspace,
            other => panic!("expected rewrite decline, got {other:?}"),
        };

        assert!(!runner.invoked("filter-repo"), "rewrite must not run");
        assert!(!runner.invoked("push --mirror"), "publish must not run");
        let report = load_report(&workspace);
        assert_eq!(report.rewrite_confirmation, ConfirmState::Declined);
        assert_eq!(report.publish_confirmation, ConfirmState::NotAsked);
    }

    #[tokio::test]
    async fn declining_the_publish_checkpoint_halts_after_verification() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, true);
        let config = test_config(root.path(), false, false);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&["rewrite", "push it I guess"]);

        let outcome = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap();

        match outcome {
            PipelineOutcome::Declined {
                checkpoint: CheckpointKind::Publish,
                ..
            } => {}
            other => panic!("expected publish decline, got {other:?}"),
        }

        assert!(runner.invoked("filter-repo"), "rewrite was confirmed");
        assert!(!runner.invoked("push --mirror"), "publish must not run");
    }

    #[tokio::test]
    async fn rewrite_only_skips_the_publish_checkpoint_even_under_auto_confirm() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, true);
        let config = test_config(root.path(), true, true);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&[]);

        let outcome = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap();

        let workspace = match outcome {
            PipelineOutcome::RewriteCompleted { workspace, .. } => workspace,
            other => panic!("expected RewriteCompleted, got {other:?}"),
        };

        assert!(!runner.invoked("push --mirror"), "publish must never run");
        let report = load_report(&workspace);
        assert_eq!(report.publish_confirmation, ConfirmState::NotAsked);
        assert_eq!(
            report.outcome.as_deref(),
            Some("rewrite-only: completed without publish")
        );
    }

    #[tokio::test]
    async fn empty_reference_set_halts_before_any_push() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(false, true); // mirror with zero refs
        let config = test_config(root.path(), true, false);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&[]);

        let failure = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(failure.error, PipelineError::EmptyHistory { .. }));
        assert!(!runner.invoked("push --mirror"), "push must never be attempted");
        let report = load_report(failure.workspace.as_ref().unwrap());
        assert_eq!(report.publish_confirmation, ConfirmState::NotAsked);
        assert_eq!(report.outcome.as_deref(), Some("failed: verify"));
        assert!(failure.bundle.is_some(), "bundle still reported for recovery");
    }

    #[tokio::test]
    async fn exhausted_rewrite_strategies_halt_the_pipeline() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, true);
        runner.push_rule(RecordingRunner::fail_with(
            "git filter-repo",
            1,
            "git: 'filter-repo' is not a git command.",
        ));
        runner.push_rule(RecordingRunner::fail_with(
            "python3 -m git_filter_repo",
            1,
            "No module named git_filter_repo",
        ));
        let config = test_config(root.path(), true, false);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&[]);

        let failure = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap_err();

        match &failure.error {
            PipelineError::RewriteUnavailable { attempts } => assert_eq!(attempts.len(), 2),
            other => panic!("expected RewriteUnavailable, got {other:?}"),
        }
        assert!(!runner.invoked("reflog expire"), "no gc after failed rewrite");
        assert!(!runner.invoked("push --mirror"), "no publish after failed rewrite");
    }

    #[tokio::test]
    async fn backup_failure_requires_consent_and_decline_halts() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, false); // bundle creation fails
        let config = test_config(root.path(), false, false);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&["absolutely not"]);

        let outcome = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap();

        let workspace = match outcome {
            PipelineOutcome::Declined {
                checkpoint: CheckpointKind::Rewrite,
                workspace,
                bundle,
            } => {
                assert!(bundle.is_none());
                workspace
            }
            other => panic!("expected decline, got {other:?}"),
        };

        assert!(!runner.invoked("filter-repo"));
        let report = load_report(&workspace);
        let backup_record = report
            .stages
            .iter()
            .find(|r| r.stage == Stage::Backup)
            .unwrap();
        assert_eq!(backup_record.status, crate::report::StageStatus::Warned);
    }

    #[tokio::test]
    async fn backup_failure_with_consent_continues() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, false);
        let config = test_config(root.path(), false, true);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&["rewrite"]);

        let outcome = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap();

        match outcome {
            PipelineOutcome::RewriteCompleted { bundle, .. } => assert!(bundle.is_none()),
            other => panic!("expected RewriteCompleted, got {other:?}"),
        }
        assert!(runner.invoked("filter-repo"));
    }

    #[tokio::test]
    async fn clone_failure_aborts_with_no_further_stages() {
        let root = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        runner.push_rule(RecordingRunner::fail_with(
            "clone --mirror",
            128,
            "fatal: unable to access 'https://example.com/repo.git/': Could not resolve host",
        ));
        let config = test_config(root.path(), true, false);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&[]);

        let failure = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(failure.error, PipelineError::Clone { .. }));
        assert!(!runner.invoked("bundle create"));
        assert!(!runner.invoked("filter-repo"));
    }

    #[tokio::test]
    async fn rewrite_command_matches_the_recorded_preview() {
        let root = TempDir::new().unwrap();
        let runner = scripted_runner(true, true);
        let config = test_config(root.path(), true, true);
        let ui = PipelineUI::new(false);
        let mut prompter = ScriptedPrompter::new(&[]);

        let outcome = Pipeline::new(&config, &runner, &mut prompter, &ui)
            .run()
            .await
            .unwrap();
        let workspace = match outcome {
            PipelineOutcome::RewriteCompleted { workspace, .. } => workspace,
            other => panic!("unexpected {other:?}"),
        };

        let report = load_report(&workspace);
        let preview = report.rewrite_preview.unwrap();
        let executed = runner
            .command_lines()
            .into_iter()
            .find(|l| l.contains("filter-repo"))
            .unwrap();
        // The executed argv is exactly the previewed argv.
        let previewed_args = preview.strip_prefix("git filter-repo ").unwrap().to_string();
        assert!(executed.ends_with(&previewed_args), "{executed} vs {preview}");
    }
}
