//! Integrity verifier.
//!
//! Inspects the rewritten mirror before the publish checkpoint. Two
//! independent checks:
//!
//! 1. the reference set must be non-empty — the hard safety rail that keeps
//!    a force-push from replacing the remote's history with nothing;
//! 2. the publish remote must exist and point at the source URL. The rewrite
//!    engine removes remotes from the mirror as a safety default, so the
//!    usual outcome here is re-creating it. Failing to reconfigure is a
//!    warning, not fatal: the publish step downstream will catch it.

use crate::errors::PipelineError;
use git2::Repository;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happened to the publish remote during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCheck {
    /// Present and already pointing at the source URL.
    Ok,
    /// Was absent; created pointing at the source URL.
    Created,
    /// Pointed elsewhere; URL corrected.
    Corrected { previous: String },
    /// Could not be created or corrected. Publish will likely fail.
    Unfixable { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub branches: usize,
    pub tags: usize,
    /// All named references, including any outside heads/tags.
    pub total_references: usize,
    pub remote: RemoteCheck,
    pub warnings: Vec<String>,
}

impl VerificationReport {
    pub fn reference_summary(&self) -> String {
        format!(
            "{} branches, {} tags ({} references total)",
            self.branches, self.tags, self.total_references
        )
    }
}

/// Verify the rewritten mirror.
///
/// Fails only on an empty reference set; every other finding lands in the
/// report as a warning.
pub fn verify(
    mirror: &Path,
    remote_name: &str,
    source_url: &str,
) -> Result<VerificationReport, PipelineError> {
    let repo = Repository::open(mirror).map_err(|e| {
        tracing::warn!(error = %e, "mirror did not open as a repository");
        PipelineError::EmptyHistory {
            mirror: mirror.to_path_buf(),
        }
    })?;

    let mut branches = 0usize;
    let mut tags = 0usize;
    let mut total = 0usize;
    let refs = repo.references().map_err(|_| PipelineError::EmptyHistory {
        mirror: mirror.to_path_buf(),
    })?;
    for reference in refs.flatten() {
        total += 1;
        if let Some(name) = reference.name() {
            if name.starts_with("refs/heads/") {
                branches += 1;
            } else if name.starts_with("refs/tags/") {
                tags += 1;
            }
        }
    }

    if total == 0 {
        return Err(PipelineError::EmptyHistory {
            mirror: mirror.to_path_buf(),
        });
    }

    let mut warnings = Vec::new();
    if branches == 0 {
        warnings.push("no branches survived the rewrite (tags only)".to_string());
    }

    let remote = check_remote(&repo, remote_name, source_url, &mut warnings);

    Ok(VerificationReport {
        branches,
        tags,
        total_references: total,
        remote,
        warnings,
    })
}

fn check_remote(
    repo: &Repository,
    remote_name: &str,
    source_url: &str,
    warnings: &mut Vec<String>,
) -> RemoteCheck {
    match repo.find_remote(remote_name) {
        Ok(remote) => {
            let current = remote.url().unwrap_or("").to_string();
            if current == source_url {
                RemoteCheck::Ok
            } else {
                match repo.remote_set_url(remote_name, source_url) {
                    Ok(()) => RemoteCheck::Corrected { previous: current },
                    Err(e) => {
                        let reason = format!(
                            "remote '{}' points at '{}' and could not be corrected: {}",
                            remote_name, current, e
                        );
                        warnings.push(reason.clone());
                        RemoteCheck::Unfixable { reason }
                    }
                }
            }
        }
        Err(_) => match repo.remote(remote_name, source_url) {
            Ok(_) => RemoteCheck::Created,
            Err(e) => {
                let reason = format!("remote '{}' could not be created: {}", remote_name, e);
                warnings.push(reason.clone());
                RemoteCheck::Unfixable { reason }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    /// Bare repository with no references at all — what a catastrophic
    /// rewrite would leave behind.
    fn empty_bare_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        Repository::init_bare(dir.path()).unwrap();
        dir
    }

    /// Repository with one commit on one branch and one tag.
    fn populated_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let sig = Signature::now("test", "test@test.com").unwrap();

        let tree_id = {
            let mut index = repo.index().unwrap();
            std::fs::write(dir.path().join("kept.txt"), "contents").unwrap();
            index.add_path(Path::new("kept.txt")).unwrap();
            index.write().unwrap();
            index.write_tree().unwrap()
        };
        let tree = repo.find_tree(tree_id).unwrap();
        let commit_id = repo
            .commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();

        let commit = repo.find_commit(commit_id).unwrap();
        repo.tag("v1", commit.as_object(), &sig, "release", false)
            .unwrap();
        dir
    }

    #[test]
    fn empty_reference_set_is_fatal() {
        let dir = empty_bare_repo();
        let err = verify(dir.path(), "origin", "https://example.com/repo.git").unwrap_err();
        assert!(matches!(err, PipelineError::EmptyHistory { .. }));
    }

    #[test]
    fn populated_repo_passes_and_counts_refs() {
        let dir = populated_repo();
        let report = verify(dir.path(), "origin", "https://example.com/repo.git").unwrap();
        assert_eq!(report.branches, 1);
        assert_eq!(report.tags, 1);
        assert!(report.total_references >= 2);
        assert!(report.reference_summary().contains("1 branches"));
    }

    #[test]
    fn absent_remote_is_created_with_the_source_url() {
        let dir = populated_repo();
        let report = verify(dir.path(), "origin", "https://example.com/repo.git").unwrap();
        assert_eq!(report.remote, RemoteCheck::Created);

        let repo = Repository::open(dir.path()).unwrap();
        let remote = repo.find_remote("origin").unwrap();
        assert_eq!(remote.url(), Some("https://example.com/repo.git"));
    }

    #[test]
    fn matching_remote_is_left_alone() {
        let dir = populated_repo();
        {
            let repo = Repository::open(dir.path()).unwrap();
            repo.remote("origin", "https://example.com/repo.git").unwrap();
        }
        let report = verify(dir.path(), "origin", "https://example.com/repo.git").unwrap();
        assert_eq!(report.remote, RemoteCheck::Ok);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn mismatched_remote_url_is_corrected() {
        let dir = populated_repo();
        {
            let repo = Repository::open(dir.path()).unwrap();
            repo.remote("origin", "https://wrong.example.com/other.git")
                .unwrap();
        }
        let report = verify(dir.path(), "origin", "https://example.com/repo.git").unwrap();
        assert_eq!(
            report.remote,
            RemoteCheck::Corrected {
                previous: "https://wrong.example.com/other.git".to_string()
            }
        );

        let repo = Repository::open(dir.path()).unwrap();
        let remote = repo.find_remote("origin").unwrap();
        assert_eq!(remote.url(), Some("https://example.com/repo.git"));
    }

    #[test]
    fn custom_remote_name_is_respected() {
        let dir = populated_repo();
        let report = verify(dir.path(), "publish", "https://example.com/repo.git").unwrap();
        assert_eq!(report.remote, RemoteCheck::Created);
        let repo = Repository::open(dir.path()).unwrap();
        assert!(repo.find_remote("publish").is_ok());
    }
}
