//! Typed error hierarchy for the scour pipeline.
//!
//! One top-level enum, `PipelineError`, covers every fatal stop. Non-fatal
//! conditions (a failed backup bundle, remote reconfiguration trouble,
//! gc/compact failure) are not errors here — they are warnings recorded in
//! the run report, because the pipeline is allowed to continue past them.

use std::path::PathBuf;
use thiserror::Error;

/// The stages of the pipeline, in execution order.
///
/// Used to label report records and error messages. Ordering is load-bearing:
/// a stage never starts before the previous one reported success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Workspace,
    Clone,
    Backup,
    FilterSpec,
    Rewrite,
    Compact,
    Verify,
    Confirm,
    Publish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Workspace => "workspace",
            Stage::Clone => "clone",
            Stage::Backup => "backup",
            Stage::FilterSpec => "filter-spec",
            Stage::Rewrite => "rewrite",
            Stage::Compact => "compact",
            Stage::Verify => "verify",
            Stage::Confirm => "confirm",
            Stage::Publish => "publish",
        };
        write!(f, "{}", name)
    }
}

/// Classification of a failed mirror clone, derived from the git stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneFailureKind {
    Authentication,
    Network,
    Other,
}

impl std::fmt::Display for CloneFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloneFailureKind::Authentication => write!(f, "authentication"),
            CloneFailureKind::Network => write!(f, "network"),
            CloneFailureKind::Other => write!(f, "other"),
        }
    }
}

/// One exhausted rewrite invocation strategy and why it failed.
#[derive(Debug, Clone)]
pub struct StrategyFailure {
    /// Human-readable strategy name, e.g. `git filter-repo`.
    pub strategy: String,
    pub reason: String,
}

/// Fatal pipeline failures. Any of these halts the run at the stage where it
/// was detected; the backup bundle (if one was created) is the recovery path.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required tool unavailable: {0}")]
    Environment(String),

    #[error("failed to create workspace at {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mirror clone of {url} failed ({kind}): {detail}")]
    Clone {
        url: String,
        kind: CloneFailureKind,
        detail: String,
    },

    #[error("history rewrite unavailable: all {} invocation strategies failed", .attempts.len())]
    RewriteUnavailable { attempts: Vec<StrategyFailure> },

    #[error("rewritten mirror at {mirror} has no references; refusing to continue")]
    EmptyHistory { mirror: PathBuf },

    #[error("mirror push to remote '{remote}' failed: {detail}")]
    Publish { remote: String, detail: String },
}

impl PipelineError {
    /// The stage at which this error halts the pipeline.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Environment(_) => Stage::Workspace,
            PipelineError::Workspace { .. } => Stage::Workspace,
            PipelineError::Clone { .. } => Stage::Clone,
            PipelineError::RewriteUnavailable { .. } => Stage::Rewrite,
            PipelineError::EmptyHistory { .. } => Stage::Verify,
            PipelineError::Publish { .. } => Stage::Publish,
        }
    }
}

/// Non-fatal failure to create the backup bundle. Carried as a value, not an
/// error: the pipeline continues only through operator consent at the rewrite
/// checkpoint, and the failure must never be silent.
#[derive(Debug, Clone, Error)]
#[error("backup bundle creation failed: {detail}")]
pub struct BackupFailure {
    pub detail: String,
}
