//! Publisher.
//!
//! Force-replaces the remote's reference set with the mirror's: every local
//! reference overwrites or creates its remote counterpart, and remote
//! references with no local counterpart are deleted. Failure is terminal —
//! a forced, history-altering push is never retried blindly, because a
//! partial failure can leave the remote refs in a mixed state a retry might
//! misinterpret.

use crate::errors::PipelineError;
use crate::exec::CommandRunner;
use std::path::Path;

/// Outcome of a successful mirror push.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub remote: String,
    /// The push transcript git printed, kept for the run report.
    pub transcript: String,
}

pub async fn publish(
    runner: &dyn CommandRunner,
    git_cmd: &str,
    mirror: &Path,
    remote: &str,
) -> Result<PublishOutcome, PipelineError> {
    let args = vec!["push".to_string(), "--mirror".to_string(), remote.to_string()];

    let output = runner
        .run(git_cmd, &args, Some(mirror))
        .await
        .map_err(|e| PipelineError::Publish {
            remote: remote.to_string(),
            detail: e.to_string(),
        })?;

    if !output.success() {
        return Err(PipelineError::Publish {
            remote: remote.to_string(),
            detail: output.diagnostic(),
        });
    }

    tracing::info!(remote, "mirror push complete; remote history replaced");
    Ok(PublishOutcome {
        remote: remote.to_string(),
        transcript: output.diagnostic(),
    })
}
