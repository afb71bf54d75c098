//! Backup manager.
//!
//! Captures every reference and reachable object of the freshly cloned
//! mirror into a single bundle file before anything destructive happens.
//! The bundle is the only rollback mechanism: the rewrite is irreversible on
//! the mirror and the push is irreversible on the remote. Bundle creation is
//! deliberately not fatal — the pipeline may continue past a failure, but
//! only through explicit operator consent at the rewrite checkpoint.

use crate::errors::BackupFailure;
use crate::exec::CommandRunner;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub const BUNDLE_FILE_NAME: &str = "backup.bundle";

/// A created, verified backup bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupBundle {
    pub path: PathBuf,
    pub bytes: u64,
    /// SHA-256 of the bundle contents, hex-encoded. Recorded so an operator
    /// can later verify the restore artifact has not been corrupted.
    pub sha256: String,
}

/// Bundle all refs and objects of `mirror` into `<workspace>/backup.bundle`.
///
/// The bundle must exist and be non-empty afterwards; an empty file would
/// restore nothing and counts as a failure.
pub async fn create_backup_bundle(
    runner: &dyn CommandRunner,
    git_cmd: &str,
    mirror: &Path,
    workspace: &Path,
) -> Result<BackupBundle, BackupFailure> {
    let bundle_path = workspace.join(BUNDLE_FILE_NAME);
    let args = vec![
        "bundle".to_string(),
        "create".to_string(),
        bundle_path.display().to_string(),
        "--all".to_string(),
    ];

    let output = runner
        .run(git_cmd, &args, Some(mirror))
        .await
        .map_err(|e| BackupFailure {
            detail: e.to_string(),
        })?;

    if !output.success() {
        return Err(BackupFailure {
            detail: format!("git bundle exited with code {}: {}", output.exit_code, output.diagnostic()),
        });
    }

    let metadata = std::fs::metadata(&bundle_path).map_err(|e| BackupFailure {
        detail: format!("bundle file missing after creation: {}", e),
    })?;
    if metadata.len() == 0 {
        return Err(BackupFailure {
            detail: format!("bundle file {} is empty", bundle_path.display()),
        });
    }

    let sha256 = sha256_file(&bundle_path).map_err(|e| BackupFailure {
        detail: format!("failed to checksum bundle: {}", e),
    })?;

    tracing::info!(bundle = %bundle_path.display(), bytes = metadata.len(), "backup bundle created");
    Ok(BackupBundle {
        path: bundle_path,
        bytes: metadata.len(),
        sha256,
    })
}

fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
