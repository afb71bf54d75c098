//! Persisted run report.
//!
//! Every pipeline run writes `report.json` into its workspace and re-saves
//! it after each stage transition, so the record survives a fatal stop at
//! any point. The report is the operator's audit trail: what command was
//! previewed, whether the backup exists (and its digest), how each stage
//! ended, and what the confirmation checkpoints resolved to.

use crate::backup::BackupBundle;
use crate::errors::Stage;
use crate::gates::ConfirmState;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const REPORT_FILE_NAME: &str = "report.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Started,
    Succeeded,
    /// Completed with a recorded warning; the pipeline continued.
    Warned,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub source_url: String,
    pub workspace: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<BackupBundle>,
    pub rewrite_confirmation: ConfirmState,
    pub publish_confirmation: ConfirmState,
    pub stages: Vec<StageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl RunReport {
    pub fn new(source_url: &str, workspace: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            ended_at: None,
            source_url: source_url.to_string(),
            workspace: workspace.to_path_buf(),
            rewrite_preview: None,
            bundle: None,
            rewrite_confirmation: ConfirmState::NotAsked,
            publish_confirmation: ConfirmState::NotAsked,
            stages: Vec::new(),
            outcome: None,
        }
    }
}

/// Owns the report and re-saves after every mutation, so a fatal stop at
/// any stage still leaves a readable record on disk.
pub struct ReportWriter {
    path: PathBuf,
    report: RunReport,
}

impl ReportWriter {
    pub fn new(workspace: &Path, source_url: &str) -> Self {
        Self {
            path: workspace.join(REPORT_FILE_NAME),
            report: RunReport::new(source_url, workspace),
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a stage start. Saves; failure to save is itself a hard error
    /// so the audit trail can never silently go missing.
    pub fn stage_started(&mut self, stage: Stage) -> Result<()> {
        self.report.stages.push(StageRecord {
            stage,
            status: StageStatus::Started,
            started_at: Utc::now(),
            ended_at: None,
            detail: None,
        });
        self.save()
    }

    /// Close out the most recent record for `stage` with a final status.
    pub fn stage_finished(
        &mut self,
        stage: Stage,
        status: StageStatus,
        detail: Option<String>,
    ) -> Result<()> {
        let record = self
            .report
            .stages
            .iter_mut()
            .rev()
            .find(|r| r.stage == stage)
            .ok_or_else(|| anyhow::anyhow!("stage_finished called for unstarted stage {stage}"))?;
        record.status = status;
        record.ended_at = Some(Utc::now());
        record.detail = detail;
        self.save()
    }

    pub fn set_preview(&mut self, preview: &str) -> Result<()> {
        self.report.rewrite_preview = Some(preview.to_string());
        self.save()
    }

    pub fn set_bundle(&mut self, bundle: &BackupBundle) -> Result<()> {
        self.report.bundle = Some(bundle.clone());
        self.save()
    }

    pub fn set_confirmations(&mut self, rewrite: ConfirmState, publish: ConfirmState) -> Result<()> {
        self.report.rewrite_confirmation = rewrite;
        self.report.publish_confirmation = publish;
        self.save()
    }

    pub fn finish(&mut self, outcome: &str) -> Result<()> {
        self.report.ended_at = Some(Utc::now());
        self.report.outcome = Some(outcome.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.report)
            .context("Failed to serialize run report")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write run report at {}", self.path.display()))?;
        Ok(())
    }
}
