//! Confirmation gate for the two destructive transitions.
//!
//! One checkpoint each for the rewrite and the publish. A checkpoint starts
//! in `NotAsked`; with `--yes` it auto-confirms without touching the
//! terminal, otherwise the operator gets a single-line prompt and must type
//! the checkpoint's exact affirmative token. Anything else declines, and a
//! decline halts the pipeline with a clean zero exit.
//!
//! The publish token is longer, uppercase, and names the consequence — the
//! more dangerous action is deliberately harder to trigger by accident.
//!
//! Confirmation state is carried in a value passed through the pipeline, so
//! the state machine is unit-testable without a terminal.

use anyhow::Result;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use serde::{Deserialize, Serialize};

/// State of one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmState {
    NotAsked,
    AutoConfirmed,
    OperatorConfirmed,
    Declined,
}

impl ConfirmState {
    /// Whether the destructive transition may proceed from this state.
    pub fn permits(self) -> bool {
        matches!(self, ConfirmState::AutoConfirmed | ConfirmState::OperatorConfirmed)
    }
}

/// Which destructive action a checkpoint guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    Rewrite,
    Publish,
}

impl CheckpointKind {
    /// The exact token that confirms this checkpoint.
    pub fn token(self) -> &'static str {
        match self {
            CheckpointKind::Rewrite => "rewrite",
            CheckpointKind::Publish => "REPLACE HISTORY",
        }
    }

    pub fn prompt(self) -> String {
        match self {
            CheckpointKind::Rewrite => format!(
                "Rewrite the mirrored history now (irreversible on the mirror)? \
                 Type '{}' to proceed",
                self.token()
            ),
            CheckpointKind::Publish => format!(
                "Force-replace ALL remote history with the rewritten refs? \
                 Type '{}' to proceed",
                self.token()
            ),
        }
    }
}

impl std::fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointKind::Rewrite => write!(f, "rewrite"),
            CheckpointKind::Publish => write!(f, "publish"),
        }
    }
}

/// Source of single-line operator responses.
///
/// The pipeline only ever sees this trait; tests script it, the CLI wires in
/// [`TerminalPrompter`].
pub trait Prompter {
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// Interactive prompter backed by dialoguer. Blocks until the operator
/// answers; no timeout by design — timing out a destructive confirmation
/// could silently abort or silently proceed.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        let line: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(line)
    }
}

/// Tracks both checkpoints for one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationGate {
    auto_confirm: bool,
    pub rewrite: ConfirmState,
    pub publish: ConfirmState,
}

impl ConfirmationGate {
    pub fn new(auto_confirm: bool) -> Self {
        Self {
            auto_confirm,
            rewrite: ConfirmState::NotAsked,
            publish: ConfirmState::NotAsked,
        }
    }

    pub fn state(&self, kind: CheckpointKind) -> ConfirmState {
        match kind {
            CheckpointKind::Rewrite => self.rewrite,
            CheckpointKind::Publish => self.publish,
        }
    }

    /// Resolve a checkpoint: auto-confirm if the flag is set, otherwise ask
    /// once. The exact token (surrounding whitespace ignored) confirms;
    /// any other input declines.
    pub fn resolve(
        &mut self,
        kind: CheckpointKind,
        prompter: &mut dyn Prompter,
    ) -> Result<ConfirmState> {
        let state = if self.auto_confirm {
            ConfirmState::AutoConfirmed
        } else {
            let answer = prompter.read_line(&kind.prompt())?;
            if answer.trim() == kind.token() {
                ConfirmState::OperatorConfirmed
            } else {
                ConfirmState::Declined
            }
        };

        match kind {
            CheckpointKind::Rewrite => self.rewrite = state,
            CheckpointKind::Publish => self.publish = state,
        }
        Ok(state)
    }
}
