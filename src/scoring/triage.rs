use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongTaskSeverity {
    Minor,
    Moderate,
    Severe,
}

impl LongTaskSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            LongTaskSeverity::Minor => "Minor",
            LongTaskSeverity::Moderate => "Moderate",
            LongTaskSeverity::Severe => "Severe",
        }
    }
}

impl fmt::Display for LongTaskSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cut-offs for the signals that are reported as soon as they are seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriageConfig {
    /// Long tasks at or below this duration are stored but not reported.
    pub long_task_report_over_ms: f64,
    /// Upper bound (inclusive) of a minor long task.
    pub minor_max_ms: f64,
    /// Upper bound (inclusive) of a moderate long task; longer is severe.
    pub moderate_max_ms: f64,
    /// Interactions slower than this are reported; also passed to the
    /// host as the `event` channel's duration threshold.
    pub interaction_report_over_ms: f64,
    /// Input delays longer than this are reported.
    pub first_input_report_over_ms: f64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            long_task_report_over_ms: 125.0,
            minor_max_ms: 200.0,
            moderate_max_ms: 300.0,
            interaction_report_over_ms: 300.0,
            first_input_report_over_ms: 1.0,
        }
    }
}

impl TriageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            self.long_task_report_over_ms,
            self.minor_max_ms,
            self.moderate_max_ms,
            self.interaction_report_over_ms,
            self.first_input_report_over_ms,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::InvalidTriage {
                reason: "thresholds must be finite and non-negative".into(),
            });
        }
        if !(self.long_task_report_over_ms < self.minor_max_ms
            && self.minor_max_ms < self.moderate_max_ms)
        {
            return Err(ConfigError::InvalidTriage {
                reason: format!(
                    "long-task bounds must increase (report over {}, minor up to {}, moderate up to {})",
                    self.long_task_report_over_ms, self.minor_max_ms, self.moderate_max_ms
                ),
            });
        }
        Ok(())
    }

    /// Severity of a long task, or `None` when it is short enough to stay
    /// silent.
    pub fn long_task_severity(&self, duration_ms: f64) -> Option<LongTaskSeverity> {
        if !(duration_ms > self.long_task_report_over_ms) {
            return None;
        }
        let severity = if duration_ms <= self.minor_max_ms {
            LongTaskSeverity::Minor
        } else if duration_ms <= self.moderate_max_ms {
            LongTaskSeverity::Moderate
        } else {
            LongTaskSeverity::Severe
        };
        Some(severity)
    }
}
