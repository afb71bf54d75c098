//! Filter specification builder.
//!
//! Translates declarative [`RemovalCriteria`] into the single rewrite
//! command handed to the history-rewriting engine. The builder is pure and
//! deterministic: the same criteria always produce the same argv, and the
//! operator preview is rendered from that exact argv. The pipeline passes
//! the argv — not a re-derived copy — to the executor, so what the operator
//! approved is what runs.

use serde::{Deserialize, Serialize};

pub const FILTER_ENGINE: &str = "git filter-repo";

/// Declarative description of what to strip from history.
///
/// Three independent selector kinds: literal repository-relative paths,
/// filename extensions matched anywhere in the tree, and a maximum retained
/// blob size. An empty criteria set is allowed and produces a
/// no-op-equivalent rewrite; `scour config validate` warns about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalCriteria {
    pub paths: Vec<String>,
    pub extensions: Vec<String>,
    /// 0 disables size-based stripping.
    pub max_blob_size_mb: u64,
}

impl RemovalCriteria {
    /// True when no selector is present at all.
    pub fn is_trivial(&self) -> bool {
        self.paths.is_empty() && self.extensions.is_empty() && self.max_blob_size_mb == 0
    }
}

/// The rewrite command, built once per run.
///
/// `preview` is shown to the operator verbatim before the rewrite
/// checkpoint; `args` is the argv actually executed. Both come from the same
/// construction, which is the auditability invariant the tests pin down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCommand {
    pub preview: String,
    pub args: Vec<String>,
}

/// Build the engine argv for the given criteria.
///
/// Selection runs in "keep everything except matches" mode: the union of all
/// matched paths, globs, and oversized blobs is removed from every commit in
/// history. Duplicate selectors collapse to one argument, first occurrence
/// wins.
pub fn build_command(criteria: &RemovalCriteria) -> FilterCommand {
    let mut args: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let mut push_unique = |args: &mut Vec<String>, arg: String| {
        if seen.insert(arg.clone()) {
            args.push(arg);
        }
    };

    for path in &criteria.paths {
        push_unique(&mut args, format!("--path={}", path));
    }

    for extension in &criteria.extensions {
        let normalized = extension.trim_start_matches('.');
        if normalized.is_empty() {
            continue;
        }
        push_unique(&mut args, format!("--path-glob=*.{}", normalized));
    }

    // --invert-paths flips the path/glob selection from "keep these" to
    // "remove these". Only meaningful when at least one selector exists;
    // the size threshold below is independent of it.
    if !args.is_empty() {
        args.push("--invert-paths".to_string());
    }

    if criteria.max_blob_size_mb > 0 {
        let bytes = criteria.max_blob_size_mb * 1024 * 1024;
        args.push(format!("--strip-blobs-bigger-than={}", bytes));
    }

    // A mirror clone is not the fresh clone filter-repo expects.
    args.push("--force".to_string());

    let preview = format!("{} {}", FILTER_ENGINE, args.join(" "));
    FilterCommand { preview, args }
}
