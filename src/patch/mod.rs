//! Applies an externally produced change plan to files under a project root.
//!
//! Failures are isolated: a change whose `old` text is not found is skipped,
//! a step whose file is missing or unreadable is skipped, and the remaining
//! work still runs. Nothing is rolled back.

pub mod matcher;

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::format::{Dialect, SourceFormatter};
use crate::persist::write_atomic;

use matcher::{MatchOutcome, normalize_whitespace, prefix, replace_first};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePlan {
    pub plan: Vec<PlanStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Path relative to the project root.
    pub file: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Informational; edits are located by text, not offsets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_range: Option<TargetRange>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub old: String,
    #[serde(default)]
    pub new: String,
}

impl ChangePlan {
    /// Parse a plan document.
    ///
    /// # Errors
    /// [`Error::InvalidPlan`] if the document has no `plan` array or a step
    /// does not have the expected shape.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::InvalidPlan(e.to_string()))?;
        if !value.get("plan").is_some_and(Value::is_array) {
            return Err(Error::InvalidPlan(
                "'plan' array is missing or invalid".to_owned(),
            ));
        }
        serde_json::from_value(value).map_err(|e| Error::InvalidPlan(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The file was rewritten. `skipped` counts changes that were invalid or
    /// did not match; `formatted` is false when the formatter rejected the
    /// text and it was written as-is.
    Applied {
        applied: usize,
        skipped: usize,
        formatted: bool,
    },
    FileNotFound,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub file: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchReport {
    pub steps: Vec<StepReport>,
}

impl PatchReport {
    pub fn applied_changes(&self) -> usize {
        self.steps
            .iter()
            .map(|s| match s.outcome {
                StepOutcome::Applied { applied, .. } => applied,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped_changes(&self) -> usize {
        self.steps
            .iter()
            .map(|s| match s.outcome {
                StepOutcome::Applied { skipped, .. } => skipped,
                _ => 0,
            })
            .sum()
    }

    /// Steps that did not rewrite their file.
    pub fn failed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| !matches!(s.outcome, StepOutcome::Applied { .. }))
            .count()
    }
}

/// What a step would do, as reported by [`preview_plan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepPreview {
    pub file: String,
    pub action: String,
    pub reason: Option<String>,
    pub changes: usize,
}

/// Apply every step of `plan` in order, resolving files against `root`.
pub fn apply_plan(root: &Path, plan: &ChangePlan, formatter: &dyn SourceFormatter) -> PatchReport {
    info!("applying {} modification(s)", plan.plan.len());
    let mut report = PatchReport::default();

    for step in &plan.plan {
        let outcome = match apply_step(root, step, formatter) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("error modifying {}: {err}", step.file);
                StepOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };
        report.steps.push(StepReport {
            file: step.file.clone(),
            outcome,
        });
    }

    info!(
        "{} change(s) applied, {} skipped, {} step(s) not applied",
        report.applied_changes(),
        report.skipped_changes(),
        report.failed_steps()
    );
    report
}

/// Resolve a step's `file` under `root`. Absolute paths, `..` segments and
/// symlinks leading out of the root are rejected.
fn resolve_in_root(root: &Path, file: &str) -> Result<PathBuf> {
    let relative = Path::new(file);
    let lexically_inside = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if file.is_empty() || !lexically_inside {
        return Err(Error::OutsideRoot(file.to_owned()));
    }

    let path = root.join(relative);
    if let (Ok(real_root), Ok(real_path)) = (root.canonicalize(), path.canonicalize())
        && !real_path.starts_with(&real_root)
    {
        return Err(Error::OutsideRoot(file.to_owned()));
    }
    Ok(path)
}

fn apply_step(root: &Path, step: &PlanStep, formatter: &dyn SourceFormatter) -> Result<StepOutcome> {
    let path = resolve_in_root(root, &step.file)?;
    if !path.exists() {
        let err = Error::FileNotFound(path.clone());
        error!("{err} (step file: {})", step.file);
        return Ok(StepOutcome::FileNotFound);
    }

    info!(
        "modifying {} (reason: {})",
        step.file,
        step.reason.as_deref().unwrap_or("n/a")
    );
    let mut code = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;

    let (mut applied, mut skipped) = (0, 0);
    for change in &step.changes {
        if change.old.is_empty() {
            warn!("skipping invalid change in {}: empty 'old'", step.file);
            skipped += 1;
            continue;
        }
        match replace_first(&code, &change.old, &change.new) {
            MatchOutcome::Applied(next) => {
                code = next;
                applied += 1;
                debug!("applied change in {}", step.file);
            }
            MatchOutcome::NotFound => {
                let err = Error::PatchMismatch {
                    file: path.clone(),
                    snippet: prefix(&change.old, 80).to_owned(),
                };
                let normalized_file = normalize_whitespace(&code);
                warn!(
                    "{err}\n  normalized old: {:?}\n  file starts with: {:?}",
                    prefix(&normalize_whitespace(&change.old), 80),
                    prefix(&normalized_file, 200)
                );
                skipped += 1;
            }
        }
    }

    let (text, formatted) = match formatter.format(&code, Dialect::from_path(&path)) {
        Ok(text) => (text, true),
        Err(err) => {
            warn!("{err}; writing unformatted {}", step.file);
            (code, false)
        }
    };
    write_atomic(&path, text.as_bytes())?;

    Ok(StepOutcome::Applied {
        applied,
        skipped,
        formatted,
    })
}

/// Dry run: log and return what each step would do without touching files.
pub fn preview_plan(plan: &ChangePlan) -> Vec<StepPreview> {
    let previews: Vec<StepPreview> = plan
        .plan
        .iter()
        .map(|step| StepPreview {
            file: step.file.clone(),
            action: step.action.clone(),
            reason: step.reason.clone(),
            changes: step.changes.len(),
        })
        .collect();

    for p in &previews {
        info!(
            "would modify {} (action: {}, reason: {}, {} replacement(s))",
            p.file,
            p.action,
            p.reason.as_deref().unwrap_or("n/a"),
            p.changes
        );
    }
    previews
}
