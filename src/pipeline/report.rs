//! Per-unit outcomes of a run.

use std::fmt;
use std::path::PathBuf;

use hlsaux_core::Warning;
use serde::Serialize;

/// Which pipeline a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// One variant's I-frame-only playlist.
    IFrames,
    /// One segmented caption stream.
    Captions,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::IFrames => write!(f, "iframes"),
            UnitKind::Captions => write!(f, "captions"),
        }
    }
}

/// How a unit ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    Completed {
        /// Files written by the unit.
        artifacts: Vec<PathBuf>,
    },
    Failed {
        error: String,
    },
}

/// Result of one variant or caption stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub kind: UnitKind,
    /// Variant URI or caption stream name.
    pub name: String,
    #[serde(flatten)]
    pub outcome: UnitOutcome,
    /// Non-fatal degradations, rendered for display.
    pub warnings: Vec<String>,
}

impl UnitReport {
    pub fn completed(
        kind: UnitKind,
        name: impl Into<String>,
        artifacts: Vec<PathBuf>,
        warnings: &[Warning],
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            outcome: UnitOutcome::Completed { artifacts },
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }

    /// A failed unit. The reason is logged here so every failure leaves a
    /// trace even when the report is never printed.
    pub fn failed(kind: UnitKind, name: impl Into<String>, error: &hlsaux_core::Error) -> Self {
        let name = name.into();
        tracing::error!(unit = %kind, name = %name, "unit failed: {error}");
        Self {
            kind,
            name,
            outcome: UnitOutcome::Failed {
                error: error.to_string(),
            },
            warnings: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Failed { .. })
    }
}

/// Aggregated outcome of every unit in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub fn push(&mut self, unit: UnitReport) {
        self.units.push(unit);
    }

    pub fn extend(&mut self, units: impl IntoIterator<Item = UnitReport>) {
        self.units.extend(units);
    }

    pub fn has_failures(&self) -> bool {
        self.units.iter().any(UnitReport::is_failed)
    }

    pub fn warning_count(&self) -> usize {
        self.units.iter().map(|u| u.warnings.len()).sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for unit in &self.units {
            match &unit.outcome {
                UnitOutcome::Completed { artifacts } => {
                    writeln!(
                        f,
                        "✓ [{}] {} ({} files)",
                        unit.kind,
                        unit.name,
                        artifacts.len()
                    )?;
                }
                UnitOutcome::Failed { error } => {
                    writeln!(f, "✗ [{}] {}: {}", unit.kind, unit.name, error)?;
                }
            }
            for warning in &unit.warnings {
                writeln!(f, "    warning: {warning}")?;
            }
        }

        let failed = self.units.iter().filter(|u| u.is_failed()).count();
        write!(
            f,
            "{} units, {} failed, {} warnings",
            self.units.len(),
            failed,
            self.warning_count()
        )
    }
}
