//! Workspace manager.
//!
//! Allocates the isolated, timestamped working directory that owns the
//! mirror repository, the backup bundle, and the run report. Workspaces are
//! never deleted by scour; the operator cleans up after verifying the
//! result.

use crate::errors::{CloneFailureKind, PipelineError};
use crate::exec::CommandRunner;
use chrono::Utc;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const MIRROR_DIR_NAME: &str = "mirror.git";

static AUTH_STDERR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)authentication failed|permission denied|could not read (Username|Password)|access denied|HTTP 40[13]",
    )
    .expect("auth stderr pattern is valid")
});

static NETWORK_STDERR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)could not resolve host|unable to access|connection (refused|reset|timed out)|operation timed out|network is unreachable",
    )
    .expect("network stderr pattern is valid")
});

/// Check that the git binary is present and answers `--version`.
pub async fn ensure_git(
    runner: &dyn CommandRunner,
    git_cmd: &str,
) -> Result<String, PipelineError> {
    let output = runner
        .run(git_cmd, &["--version".to_string()], None)
        .await
        .map_err(|e| PipelineError::Environment(e.to_string()))?;
    if !output.success() {
        return Err(PipelineError::Environment(format!(
            "{} --version exited with code {}",
            git_cmd, output.exit_code
        )));
    }
    Ok(output.stdout.trim().to_string())
}

/// Create a uniquely named workspace directory under `root`.
///
/// The name embeds a UTC timestamp down to nanoseconds, so two invocations
/// started in the same second still get distinct directories. Uniqueness by
/// naming, not locking: a pipeline run exclusively owns its workspace.
pub fn create_workspace(root: &Path) -> Result<PathBuf, PipelineError> {
    let name = format!("scour-{}", Utc::now().format("%Y%m%d-%H%M%S-%f"));
    let path = root.join(name);
    std::fs::create_dir_all(&path).map_err(|source| PipelineError::Workspace {
        path: path.clone(),
        source,
    })?;
    tracing::info!(workspace = %path.display(), "workspace created");
    Ok(path)
}

/// Mirror-clone the source into the workspace.
///
/// `git clone --mirror` replicates every reference, which makes the mirror a
/// complete rewrite target while the source stays untouched until publish.
/// There is no partial-mirror recovery: any failure aborts the pipeline.
pub async fn clone_mirror(
    runner: &dyn CommandRunner,
    git_cmd: &str,
    source_url: &str,
    workspace: &Path,
) -> Result<PathBuf, PipelineError> {
    let mirror = workspace.join(MIRROR_DIR_NAME);
    let args = vec![
        "clone".to_string(),
        "--mirror".to_string(),
        source_url.to_string(),
        mirror.display().to_string(),
    ];

    let output = runner
        .run(git_cmd, &args, None)
        .await
        .map_err(|e| PipelineError::Clone {
            url: source_url.to_string(),
            kind: CloneFailureKind::Other,
            detail: e.to_string(),
        })?;

    if !output.success() {
        let detail = output.diagnostic();
        return Err(PipelineError::Clone {
            url: source_url.to_string(),
            kind: classify_clone_stderr(&detail),
            detail,
        });
    }

    tracing::info!(mirror = %mirror.display(), "mirror clone complete");
    Ok(mirror)
}

/// Best-effort classification of a clone failure from the git stderr.
pub fn classify_clone_stderr(stderr: &str) -> CloneFailureKind {
    if AUTH_STDERR.is_match(stderr) {
        CloneFailureKind::Authentication
    } else if NETWORK_STDERR.is_match(stderr) {
        CloneFailureKind::Network
    } else {
        CloneFailureKind::Other
    }
}
