//! Subprocess execution seam.
//!
//! Every external invocation (clone, bundle, rewrite, gc, push) goes through
//! the [`CommandRunner`] trait so the pipeline can be driven in tests without
//! a real `git` on the PATH. [`SystemRunner`] is the production
//! implementation, backed by `tokio::process`.

use async_trait::async_trait;
use std::path::Path;
#[cfg(test)]
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Captured result of a finished subprocess.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The most useful diagnostic line for an operator: stderr if non-empty,
    /// stdout otherwise, trimmed either way.
    pub fn diagnostic(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        text.to_string()
    }
}

/// Failure to even run a command (as opposed to the command exiting non-zero).
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be found on the execution path.
    #[error("{program} is not installed or not on PATH")]
    NotFound { program: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, optionally in `cwd`, waiting for exit and
    /// capturing both output streams.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CmdOutput, ExecError>;
}

/// Production runner: spawns the real subprocess and waits for it.
///
/// No timeout is imposed. Clones and rewrites of large repositories can
/// legitimately run for a long time, and the operator can interrupt the
/// process themselves.
#[derive(Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CmdOutput, ExecError> {
        tracing::debug!(program, ?args, ?cwd, "spawning subprocess");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ExecError::NotFound {
                    program: program.to_string(),
                }
            } else {
                ExecError::Spawn {
                    program: program.to_string(),
                    source,
                }
            }
        })?;

        let result = CmdOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        tracing::debug!(program, exit = result.exit_code, "subprocess finished");
        Ok(result)
    }
}

/// Render an invocation the way an operator would type it.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program.to_string());
    for arg in args {
        if arg.contains(char::is_whitespace) {
            parts.push(format!("'{}'", arg));
        } else {
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

/// One recorded invocation, kept by [`RecordingRunner`] for assertions.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

/// Test double: replays scripted responses and records every invocation.
///
/// Responses are matched by substring against the rendered command line, in
/// registration order; the first match wins. Unmatched commands succeed with
/// empty output. An optional side effect runs on match, which lets tests
/// create the files a real subprocess would have produced (a bundle, a
/// mirror directory).
#[cfg(test)]
pub struct RecordingRunner {
    rules: std::sync::Mutex<Vec<FakeRule>>,
    pub calls: std::sync::Mutex<Vec<RecordedCall>>,
}

#[cfg(test)]
pub struct FakeRule {
    pub pattern: String,
    pub response: Result<CmdOutput, String>,
    pub side_effect: Option<Box<dyn Fn(&RecordedCall) + Send>>,
}

#[cfg(test)]
impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            rules: std::sync::Mutex::new(Vec::new()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn ok_with(pattern: &str) -> FakeRule {
        FakeRule {
            pattern: pattern.to_string(),
            response: Ok(CmdOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            }),
            side_effect: None,
        }
    }

    pub fn fail_with(pattern: &str, exit_code: i32, stderr: &str) -> FakeRule {
        FakeRule {
            pattern: pattern.to_string(),
            response: Ok(CmdOutput {
                exit_code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
            side_effect: None,
        }
    }

    pub fn missing_program(pattern: &str, program: &str) -> FakeRule {
        FakeRule {
            pattern: pattern.to_string(),
            response: Err(program.to_string()),
            side_effect: None,
        }
    }

    pub fn push_rule(&self, rule: FakeRule) {
        self.rules.lock().unwrap().push(rule);
    }

    pub fn push_rule_with_effect<F>(&self, mut rule: FakeRule, effect: F)
    where
        F: Fn(&RecordedCall) + Send + 'static,
    {
        rule.side_effect = Some(Box::new(effect));
        self.rules.lock().unwrap().push(rule);
    }

    /// Rendered command lines, in invocation order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| display_command(&c.program, &c.args))
            .collect()
    }

    pub fn invoked(&self, needle: &str) -> bool {
        self.command_lines().iter().any(|l| l.contains(needle))
    }
}

#[cfg(test)]
#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<CmdOutput, ExecError> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.map(Path::to_path_buf),
        };
        self.calls.lock().unwrap().push(call.clone());

        let line = display_command(program, args);
        let rules = self.rules.lock().unwrap();
        for rule in rules.iter() {
            if line.contains(&rule.pattern) {
                if let Some(effect) = &rule.side_effect {
                    effect(&call);
                }
                return match &rule.response {
                    Ok(output) => Ok(output.clone()),
                    Err(program) => Err(ExecError::NotFound {
                        program: program.clone(),
                    }),
                };
            }
        }
        Ok(CmdOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
