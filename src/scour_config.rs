//! Unified configuration for scour.
//!
//! Settings load from `scour.toml` and are overridden per invocation by CLI
//! flags (file → CLI layering). Every field has a default except the source
//! repository URL, which has no safe universal value and must come from the
//! file or `--source`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [source]
//! url = "git@example.com:team/repo.git"
//! remote = "origin"
//!
//! [filter]
//! max_blob_size_mb = 100
//! strip_extensions = ["db", "sqlite"]
//! strip_paths = []
//!
//! [run]
//! auto_confirm = false
//! rewrite_only = false
//! workspace_root = ""   # empty = system temp directory
//!
//! [tools]
//! git_cmd = "git"
//! python_cmd = "python3"
//! ```

use crate::filter::RemovalCriteria;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "scour.toml";

/// `[source]` — where the history lives and where it is republished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Repository URL to mirror, rewrite, and force-replace.
    #[serde(default)]
    pub url: Option<String>,
    /// Name of the publish remote inside the mirror.
    #[serde(default = "default_remote")]
    pub remote: String,
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            url: None,
            remote: default_remote(),
        }
    }
}

/// `[filter]` — what gets stripped from every commit in history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSection {
    /// Maximum retained blob size in megabytes; 0 disables size stripping.
    #[serde(default = "default_max_blob_size_mb")]
    pub max_blob_size_mb: u64,
    /// Filename extensions excluded everywhere in history.
    #[serde(default = "default_strip_extensions")]
    pub strip_extensions: Vec<String>,
    /// Literal repository-relative paths to remove. Kept for compatibility
    /// with prior invocations that enumerated offending files directly.
    #[serde(default)]
    pub strip_paths: Vec<String>,
}

fn default_max_blob_size_mb() -> u64 {
    100
}

fn default_strip_extensions() -> Vec<String> {
    vec!["db".to_string(), "sqlite".to_string()]
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            max_blob_size_mb: default_max_blob_size_mb(),
            strip_extensions: default_strip_extensions(),
            strip_paths: Vec::new(),
        }
    }
}

/// `[run]` — pipeline behavior switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSection {
    /// Bypass both interactive checkpoints.
    #[serde(default)]
    pub auto_confirm: bool,
    /// Halt successfully after rewrite + verification, before publish.
    #[serde(default)]
    pub rewrite_only: bool,
    /// Parent directory for workspaces; empty means the system temp dir.
    #[serde(default)]
    pub workspace_root: String,
}

/// `[tools]` — external binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsSection {
    #[serde(default = "default_git_cmd")]
    pub git_cmd: String,
    /// Interpreter for the module-form rewrite fallback.
    #[serde(default = "default_python_cmd")]
    pub python_cmd: String,
}

fn default_git_cmd() -> String {
    "git".to_string()
}

fn default_python_cmd() -> String {
    "python3".to_string()
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            git_cmd: default_git_cmd(),
            python_cmd: default_python_cmd(),
        }
    }
}

/// The complete scour.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScourToml {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

impl ScourToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scour.toml")
    }

    /// Load from `<dir>/scour.toml`, falling back to defaults when absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize scour.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.source.url.is_none() {
            warnings.push(
                "No [source] url configured; every run will need --source".to_string(),
            );
        }

        if self.filter.max_blob_size_mb == 0
            && self.filter.strip_extensions.is_empty()
            && self.filter.strip_paths.is_empty()
        {
            warnings.push(
                "Removal criteria are empty: the rewrite will strip nothing (no-op run)"
                    .to_string(),
            );
        }

        for extension in &self.filter.strip_extensions {
            if extension.contains('/') || extension.contains('*') {
                warnings.push(format!(
                    "strip_extensions entry '{}' looks like a path or glob; \
                     extensions should be bare suffixes like \"db\"",
                    extension
                ));
            }
        }

        for path in &self.filter.strip_paths {
            if path.starts_with('/') {
                warnings.push(format!(
                    "strip_paths entry '{}' is absolute; paths are matched \
                     relative to the repository root",
                    path
                ));
            }
        }

        if self.source.remote.trim().is_empty() {
            warnings.push("source.remote is empty; publish would have no target".to_string());
        }

        warnings
    }
}

/// CLI-provided overrides, applied on top of the file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub source_url: Option<String>,
    pub remote: Option<String>,
    pub max_blob_size_mb: Option<u64>,
    pub strip_extensions: Option<Vec<String>>,
    pub strip_paths: Option<Vec<String>>,
    pub auto_confirm: bool,
    pub rewrite_only: bool,
    pub workspace_root: Option<PathBuf>,
}

/// Fully resolved settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct ScourConfig {
    pub source_url: String,
    pub remote: String,
    pub criteria: RemovalCriteria,
    pub auto_confirm: bool,
    pub rewrite_only: bool,
    pub workspace_root: PathBuf,
    pub git_cmd: String,
    pub python_cmd: String,
}

impl ScourConfig {
    /// Merge file values and CLI overrides into a runnable config.
    ///
    /// Fails only when no source URL is available from either layer — the
    /// single setting with no default.
    pub fn resolve(toml: &ScourToml, cli: &CliOverrides) -> Result<Self> {
        let source_url = cli
            .source_url
            .clone()
            .or_else(|| toml.source.url.clone())
            .context(
                "No source repository configured. Set [source] url in scour.toml or pass --source",
            )?;

        let workspace_root = match &cli.workspace_root {
            Some(root) => root.clone(),
            None if !toml.run.workspace_root.trim().is_empty() => {
                PathBuf::from(toml.run.workspace_root.trim())
            }
            None => std::env::temp_dir(),
        };

        Ok(Self {
            source_url,
            remote: cli.remote.clone().unwrap_or_else(|| toml.source.remote.clone()),
            criteria: RemovalCriteria {
                paths: cli
                    .strip_paths
                    .clone()
                    .unwrap_or_else(|| toml.filter.strip_paths.clone()),
                extensions: cli
                    .strip_extensions
                    .clone()
                    .unwrap_or_else(|| toml.filter.strip_extensions.clone()),
                max_blob_size_mb: cli
                    .max_blob_size_mb
                    .unwrap_or(toml.filter.max_blob_size_mb),
            },
            auto_confirm: cli.auto_confirm || toml.run.auto_confirm,
            rewrite_only: cli.rewrite_only || toml.run.rewrite_only,
            workspace_root,
            git_cmd: toml.tools.git_cmd.clone(),
            python_cmd: toml.tools.python_cmd.clone(),
        })
    }
}
