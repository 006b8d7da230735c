use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::{ConfigError, ScoringConfig, ThresholdSpec};
use crate::metrics::SignalKind;

/// Points used when a weighted signal has no verdict.
pub const MISSING_VERDICT_POINTS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Good,
    NeedsImprovement,
    Poor,
}

impl Verdict {
    pub fn points(&self) -> f64 {
        match self {
            Verdict::Good => 100.0,
            Verdict::NeedsImprovement => 60.0,
            Verdict::Poor => 20.0,
        }
    }
}

impl ThresholdSpec {
    pub fn classify(&self, value: f64) -> Verdict {
        if value <= self.good {
            Verdict::Good
        } else if value <= self.needs_improvement {
            Verdict::NeedsImprovement
        } else {
            Verdict::Poor
        }
    }
}

/// Weighted sum of verdict points, rounded and clamped into `0..=100`.
///
/// A weighted signal missing from `verdicts` scores [`MISSING_VERDICT_POINTS`].
/// Weights are not renormalized.
pub fn composite<'a>(
    verdicts: &BTreeMap<SignalKind, Verdict>,
    weights: impl IntoIterator<Item = (&'a SignalKind, &'a f64)>,
) -> u8 {
    let total: f64 = weights
        .into_iter()
        .map(|(signal, weight)| {
            let points = verdicts
                .get(signal)
                .map(Verdict::points)
                .unwrap_or(MISSING_VERDICT_POINTS);
            points * weight
        })
        .sum();

    if !total.is_finite() {
        return 0;
    }
    total.round().clamp(0.0, 100.0) as u8
}

/// Validated threshold table. Read-only after construction, so one table can
/// be shared by any number of sessions.
#[derive(Debug, Clone)]
pub struct ScoringTable {
    thresholds: BTreeMap<SignalKind, ThresholdSpec>,
    weights: BTreeMap<SignalKind, f64>,
}

impl ScoringTable {
    pub fn new(config: &ScoringConfig) -> Result<Self, ConfigError> {
        let mut thresholds = BTreeMap::new();
        for spec in &config.thresholds {
            spec.validate()?;
            if thresholds.insert(spec.signal, *spec).is_some() {
                return Err(ConfigError::DuplicateThreshold {
                    signal: spec.signal,
                });
            }
        }

        let mut weights = BTreeMap::new();
        for weight in &config.weights {
            weight.validate()?;
            if weights.insert(weight.signal, weight.weight).is_some() {
                return Err(ConfigError::DuplicateWeight {
                    signal: weight.signal,
                });
            }
        }

        Ok(Self {
            thresholds,
            weights,
        })
    }

    pub fn threshold(&self, signal: SignalKind) -> Option<&ThresholdSpec> {
        self.thresholds.get(&signal)
    }

    pub fn weight(&self, signal: SignalKind) -> Option<f64> {
        self.weights.get(&signal).copied()
    }

    /// Verdict for `value`, or `None` when the signal has no threshold.
    pub fn classify(&self, signal: SignalKind, value: f64) -> Option<Verdict> {
        self.thresholds.get(&signal).map(|spec| spec.classify(value))
    }

    pub fn composite(&self, verdicts: &BTreeMap<SignalKind, Verdict>) -> u8 {
        composite(verdicts, &self.weights)
    }
}

impl Default for ScoringTable {
    fn default() -> Self {
        let config = ScoringConfig::default();
        Self {
            thresholds: config.thresholds.iter().map(|t| (t.signal, *t)).collect(),
            weights: config.weights.iter().map(|w| (w.signal, w.weight)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ThresholdSpec, Weight};

    #[test]
    fn classify_boundaries_are_inclusive() {
        let table = ScoringTable::default();
        assert_eq!(table.classify(SignalKind::Lcp, 2500.0), Some(Verdict::Good));
        assert_eq!(
            table.classify(SignalKind::Lcp, 2500.1),
            Some(Verdict::NeedsImprovement)
        );
        assert_eq!(
            table.classify(SignalKind::Lcp, 4000.0),
            Some(Verdict::NeedsImprovement)
        );
        assert_eq!(table.classify(SignalKind::Lcp, 4000.1), Some(Verdict::Poor));
        assert_eq!(table.classify(SignalKind::Loaf, 10.0), None);
    }

    #[test]
    fn all_good_scores_one_hundred() {
        let table = ScoringTable::default();
        let verdicts = [
            SignalKind::Lcp,
            SignalKind::Cls,
            SignalKind::Ttfb,
            SignalKind::Inp,
            SignalKind::Fcp,
        ]
        .into_iter()
        .map(|signal| (signal, Verdict::Good))
        .collect();
        assert_eq!(table.composite(&verdicts), 100);
    }

    #[test]
    fn missing_verdicts_count_as_fifty() {
        let table = ScoringTable::default();
        assert_eq!(table.composite(&BTreeMap::new()), 50);

        let mut verdicts = BTreeMap::new();
        verdicts.insert(SignalKind::Cls, Verdict::Poor);
        // 0.2 * 20 + 0.8 * 50
        assert_eq!(table.composite(&verdicts), 44);
    }

    #[test]
    fn unweighted_signals_contribute_nothing() {
        let table = ScoringTable::new(&ScoringConfig {
            thresholds: ScoringConfig::default().thresholds,
            weights: vec![Weight::new(SignalKind::Cls, 0.5)],
        })
        .unwrap();
        let mut verdicts = BTreeMap::new();
        verdicts.insert(SignalKind::Cls, Verdict::NeedsImprovement);
        verdicts.insert(SignalKind::Lcp, Verdict::Good);
        assert_eq!(table.composite(&verdicts), 30);
    }

    #[test]
    fn oversized_weight_sum_is_clamped() {
        let table = ScoringTable::new(&ScoringConfig {
            thresholds: Vec::new(),
            weights: vec![
                Weight::new(SignalKind::Lcp, 1.0),
                Weight::new(SignalKind::Cls, 1.0),
            ],
        })
        .unwrap();
        let verdicts = [(SignalKind::Lcp, Verdict::Good), (SignalKind::Cls, Verdict::Good)]
            .into_iter()
            .collect();
        assert_eq!(table.composite(&verdicts), 100);
    }

    #[test]
    fn inverted_threshold_fails_construction() {
        let config = ScoringConfig {
            thresholds: vec![ThresholdSpec::new(SignalKind::Ttfb, 5.0, 2.0)],
            weights: Vec::new(),
        };
        assert_eq!(
            ScoringTable::new(&config).unwrap_err(),
            ConfigError::InvertedThreshold {
                signal: SignalKind::Ttfb,
                good: 5.0,
                needs_improvement: 2.0,
            }
        );
    }

    #[test]
    fn duplicate_entries_fail_construction() {
        let config = ScoringConfig {
            thresholds: Vec::new(),
            weights: vec![
                Weight::new(SignalKind::Inp, 0.2),
                Weight::new(SignalKind::Inp, 0.3),
            ],
        };
        assert!(matches!(
            ScoringTable::new(&config),
            Err(ConfigError::DuplicateWeight { signal: SignalKind::Inp })
        ));
    }
}
