//! Rewrite executor.
//!
//! Runs the filter command against the mirror through an ordered list of
//! interchangeable invocation strategies: the native `git filter-repo`
//! subcommand first, then the module form `python3 -m git_filter_repo`.
//! Both forms feed the same argv into the engine's own argument parser.
//! Only when every strategy has failed does the pipeline stop with
//! `RewriteUnavailable` — it must never silently skip the rewrite and go on
//! to publish history that still contains the excluded content.
//!
//! Running the same command twice against an already-rewritten mirror is a
//! safe no-op: the matched content is already absent.

use crate::errors::{PipelineError, StrategyFailure};
use crate::exec::{CmdOutput, CommandRunner, ExecError};
use async_trait::async_trait;
use std::path::Path;

/// One way of invoking the history-rewriting engine.
#[async_trait]
pub trait InvocationStrategy: Send + Sync {
    /// Human-readable form shown in logs and failure reports.
    fn describe(&self) -> String;

    /// Try the rewrite. A missing binary and a non-zero exit are both
    /// failures; the executor moves on to the next strategy either way.
    async fn attempt(
        &self,
        runner: &dyn CommandRunner,
        mirror: &Path,
        args: &[String],
    ) -> Result<CmdOutput, StrategyFailure>;
}

/// `git filter-repo <args>` — filter-repo installed as a git subcommand.
pub struct NativeSubcommand {
    pub git_cmd: String,
}

#[async_trait]
impl InvocationStrategy for NativeSubcommand {
    fn describe(&self) -> String {
        format!("{} filter-repo", self.git_cmd)
    }

    async fn attempt(
        &self,
        runner: &dyn CommandRunner,
        mirror: &Path,
        args: &[String],
    ) -> Result<CmdOutput, StrategyFailure> {
        let mut full_args = vec!["filter-repo".to_string()];
        full_args.extend_from_slice(args);
        run_strategy(self.describe(), runner, &self.git_cmd, &full_args, mirror).await
    }
}

/// `python3 -m git_filter_repo <args>` — the engine invoked as a module,
/// for installations where the git subcommand shim is absent.
pub struct PythonModule {
    pub python_cmd: String,
}

#[async_trait]
impl InvocationStrategy for PythonModule {
    fn describe(&self) -> String {
        format!("{} -m git_filter_repo", self.python_cmd)
    }

    async fn attempt(
        &self,
        runner: &dyn CommandRunner,
        mirror: &Path,
        args: &[String],
    ) -> Result<CmdOutput, StrategyFailure> {
        let mut full_args = vec!["-m".to_string(), "git_filter_repo".to_string()];
        full_args.extend_from_slice(args);
        run_strategy(self.describe(), runner, &self.python_cmd, &full_args, mirror).await
    }
}

async fn run_strategy(
    describe: String,
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
    mirror: &Path,
) -> Result<CmdOutput, StrategyFailure> {
    match runner.run(program, args, Some(mirror)).await {
        Ok(output) if output.success() => Ok(output),
        Ok(output) => Err(StrategyFailure {
            strategy: describe,
            reason: format!("exit code {}: {}", output.exit_code, output.diagnostic()),
        }),
        Err(ExecError::NotFound { program }) => Err(StrategyFailure {
            strategy: describe,
            reason: format!("{} is not installed or not on PATH", program),
        }),
        Err(e) => Err(StrategyFailure {
            strategy: describe,
            reason: e.to_string(),
        }),
    }
}

/// Result of a successful rewrite: which strategy ran and what it printed.
#[derive(Debug, Clone)]
pub struct RewriteResult {
    pub strategy: String,
    pub output: CmdOutput,
}

/// Tries each strategy in order until one succeeds.
pub struct RewriteExecutor {
    strategies: Vec<Box<dyn InvocationStrategy>>,
}

impl RewriteExecutor {
    /// The default strategy order: native subcommand, then python module.
    pub fn new(git_cmd: &str, python_cmd: &str) -> Self {
        Self {
            strategies: vec![
                Box::new(NativeSubcommand {
                    git_cmd: git_cmd.to_string(),
                }),
                Box::new(PythonModule {
                    python_cmd: python_cmd.to_string(),
                }),
            ],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn InvocationStrategy>>) -> Self {
        Self { strategies }
    }

    /// Execute the rewrite with the previewed argv, verbatim.
    pub async fn execute(
        &self,
        runner: &dyn CommandRunner,
        mirror: &Path,
        args: &[String],
    ) -> Result<RewriteResult, PipelineError> {
        let mut attempts = Vec::new();
        for strategy in &self.strategies {
            match strategy.attempt(runner, mirror, args).await {
                Ok(output) => {
                    tracing::info!(strategy = %strategy.describe(), "history rewrite complete");
                    return Ok(RewriteResult {
                        strategy: strategy.describe(),
                        output,
                    });
                }
                Err(failure) => {
                    tracing::warn!(
                        strategy = %failure.strategy,
                        reason = %failure.reason,
                        "rewrite strategy failed"
                    );
                    attempts.push(failure);
                }
            }
        }
        Err(PipelineError::RewriteUnavailable { attempts })
    }
}

/// Compact the rewritten mirror: expire reflogs, then aggressively gc.
///
/// Stripped objects stay reachable through reflogs until both steps run.
/// Failures here are reported as warnings, not fatal errors — the rewritten
/// history itself is already correct.
pub async fn compact_repository(
    runner: &dyn CommandRunner,
    git_cmd: &str,
    mirror: &Path,
) -> Result<(), String> {
    let steps: [Vec<String>; 2] = [
        vec![
            "reflog".to_string(),
            "expire".to_string(),
            "--expire=now".to_string(),
            "--all".to_string(),
        ],
        vec![
            "gc".to_string(),
            "--prune=now".to_string(),
            "--aggressive".to_string(),
        ],
    ];

    for args in &steps {
        let output = runner
            .run(git_cmd, args, Some(mirror))
            .await
            .map_err(|e| e.to_string())?;
        if !output.success() {
            return Err(format!(
                "git {} exited with code {}: {}",
                args.first().map(String::as_str).unwrap_or(""),
                output.exit_code,
                output.diagnostic()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;
    use std::path::PathBuf;

    fn mirror() -> PathBuf {
        PathBuf::from("/tmp/scour-test/mirror.git")
    }

    fn filter_args() -> Vec<String> {
        vec!["--path-glob=*.db".to_string(), "--invert-paths".to_string(), "--force".to_string()]
    }

    #[tokio::test]
    async fn native_strategy_success_stops_the_chain() {
        let runner = RecordingRunner::new();
        let executor = RewriteExecutor::new("git", "python3");

        let result = executor
            .execute(&runner, &mirror(), &filter_args())
            .await
            .unwrap();

        assert_eq!(result.strategy, "git filter-repo");
        assert!(runner.invoked("git filter-repo --path-glob=*.db"));
        assert!(
            !runner.invoked("git_filter_repo"),
            "module form must not run after a native success"
        );
    }

    #[tokio::test]
    async fn falls_back_to_module_form_when_subcommand_is_absent() {
        let runner = RecordingRunner::new();
        // `git filter-repo` without the shim installed exits 1 with this message.
        runner.push_rule(RecordingRunner::fail_with(
            "git filter-repo",
            1,
            "git: 'filter-repo' is not a git command.",
        ));
        let executor = RewriteExecutor::new("git", "python3");

        let result = executor
            .execute(&runner, &mirror(), &filter_args())
            .await
            .unwrap();

        assert_eq!(result.strategy, "python3 -m git_filter_repo");
        let lines = runner.command_lines();
        assert!(lines[0].starts_with("git filter-repo"));
        assert!(lines[1].starts_with("python3 -m git_filter_repo"));
    }

    #[tokio::test]
    async fn module_form_receives_the_identical_argv() {
        let runner = RecordingRunner::new();
        runner.push_rule(RecordingRunner::missing_program("git filter-repo", "git"));
        let executor = RewriteExecutor::new("git", "python3");
        let args = filter_args();

        executor.execute(&runner, &mirror(), &args).await.unwrap();

        let calls = runner.calls.lock().unwrap();
        let module_call = calls.last().unwrap();
        assert_eq!(module_call.program, "python3");
        assert_eq!(&module_call.args[..2], ["-m", "git_filter_repo"]);
        assert_eq!(&module_call.args[2..], args.as_slice());
    }

    #[tokio::test]
    async fn both_strategies_failing_is_rewrite_unavailable() {
        let runner = RecordingRunner::new();
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
        let executor = RewriteExecutor::new("git", "python3");

        let err = executor
            .execute(&runner, &mirror(), &filter_args())
            .await
            .unwrap_err();

        match err {
            PipelineError::RewriteUnavailable { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].strategy, "git filter-repo");
                assert_eq!(attempts[1].strategy, "python3 -m git_filter_repo");
                assert!(attempts[1].reason.contains("No module named"));
            }
            other => panic!("expected RewriteUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn strategies_run_inside_the_mirror() {
        let runner = RecordingRunner::new();
        let executor = RewriteExecutor::new("git", "python3");
        executor
            .execute(&runner, &mirror(), &filter_args())
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].cwd.as_deref(), Some(mirror().as_path()));
    }

    #[tokio::test]
    async fn compact_runs_reflog_expire_then_gc() {
        let runner = RecordingRunner::new();
        compact_repository(&runner, "git", &mirror()).await.unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("reflog expire --expire=now --all"));
        assert!(lines[1].contains("gc --prune=now --aggressive"));
    }

    #[tokio::test]
    async fn compact_failure_surfaces_the_step() {
        let runner = RecordingRunner::new();
        runner.push_rule(RecordingRunner::fail_with("gc --prune=now", 2, "gc failed"));
        let err = compact_repository(&runner, "git", &mirror()).await.unwrap_err();
        assert!(err.contains("git gc"));
        assert!(err.contains("gc failed"));
    }
}
