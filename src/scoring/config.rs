use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::SignalKind;

/// Configuration rejected before any ingestion starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold for {signal} must satisfy good < needsImprovement (got good={good}, needsImprovement={needs_improvement})")]
    InvertedThreshold {
        signal: SignalKind,
        good: f64,
        needs_improvement: f64,
    },

    #[error("weight for {signal} must be in (0, 1] (got {weight})")]
    WeightOutOfRange { signal: SignalKind, weight: f64 },

    #[error("threshold for {signal} configured more than once")]
    DuplicateThreshold { signal: SignalKind },

    #[error("weight for {signal} configured more than once")]
    DuplicateWeight { signal: SignalKind },

    #[error("invalid triage configuration: {reason}")]
    InvalidTriage { reason: String },
}

/// Verdict boundaries for one signal. Values up to `good` are good, up to
/// `needs_improvement` need improvement, anything above is poor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSpec {
    pub signal: SignalKind,
    pub good: f64,
    pub needs_improvement: f64,
}

impl ThresholdSpec {
    pub fn new(signal: SignalKind, good: f64, needs_improvement: f64) -> Self {
        Self {
            signal,
            good,
            needs_improvement,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        // Written so NaN bounds fail too.
        if !(self.good.is_finite() && self.needs_improvement.is_finite())
            || !(self.good < self.needs_improvement)
        {
            return Err(ConfigError::InvertedThreshold {
                signal: self.signal,
                good: self.good,
                needs_improvement: self.needs_improvement,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    pub signal: SignalKind,
    pub weight: f64,
}

impl Weight {
    pub fn new(signal: SignalKind, weight: f64) -> Self {
        Self { signal, weight }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.weight > 0.0 && self.weight <= 1.0) {
            return Err(ConfigError::WeightOutOfRange {
                signal: self.signal,
                weight: self.weight,
            });
        }
        Ok(())
    }
}

/// Threshold table and composite weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    pub thresholds: Vec<ThresholdSpec>,
    /// Signals without a weight contribute nothing to the composite score.
    pub weights: Vec<Weight>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![
                ThresholdSpec::new(SignalKind::Lcp, 2500.0, 4000.0),
                ThresholdSpec::new(SignalKind::Cls, 0.1, 0.25),
                ThresholdSpec::new(SignalKind::Ttfb, 800.0, 1800.0),
                ThresholdSpec::new(SignalKind::Inp, 200.0, 500.0),
                ThresholdSpec::new(SignalKind::Fcp, 1800.0, 3000.0),
                ThresholdSpec::new(SignalKind::LongTask, 150.0, 300.0),
            ],
            weights: vec![
                Weight::new(SignalKind::Lcp, 0.25),
                Weight::new(SignalKind::Cls, 0.20),
                Weight::new(SignalKind::Ttfb, 0.20),
                Weight::new(SignalKind::Inp, 0.20),
                Weight::new(SignalKind::Fcp, 0.15),
            ],
        }
    }
}
