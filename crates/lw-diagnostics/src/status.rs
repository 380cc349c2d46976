//! Health status and issue records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Overall loop condition, ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum HealthStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Raise to `other` if it is more severe. Never lowers the status.
    pub fn escalate(&mut self, other: HealthStatus) {
        if other > *self {
            *self = other;
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Warning => "Warning",
            HealthStatus::Critical => "Critical",
        };
        f.write_str(name)
    }
}

/// Category of a detected problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SaturationHigh,
    SaturationLow,
    Noise,
    Divergence,
    Oscillation,
    SteadyStateOffset,
    Overshoot,
    Stiction,
}

/// One finding of the loop-health analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIssue {
    pub kind: IssueKind,
    pub severity: HealthStatus,
    pub message: String,
}

impl HealthIssue {
    pub fn new(kind: IssueKind, severity: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}
