use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::{MetricValue, SignalKind};
use crate::scoring::{ScoringTable, Verdict};
use crate::session::{SessionState, SessionStatus};
use crate::timeline::TimelineEvent;

/// Point-in-time view of a session. Built fresh on every request and never
/// changed afterwards; serializing it is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub status: SessionStatus,
    /// One entry per signal, zero-valued when nothing was observed.
    pub metrics: BTreeMap<SignalKind, MetricValue>,
    /// Signals that have a configured threshold.
    pub verdicts: BTreeMap<SignalKind, Verdict>,
    pub composite_score: u8,
    /// One line per timeline event, in the order events were recorded.
    pub issues: Vec<String>,
    pub timeline: Vec<TimelineEvent>,
    /// Host description supplied by the caller; not interpreted here.
    pub environment: serde_json::Value,
}

impl Report {
    pub fn metric(&self, kind: SignalKind) -> Option<&MetricValue> {
        self.metrics.get(&kind)
    }

    pub fn verdict(&self, kind: SignalKind) -> Option<Verdict> {
        self.verdicts.get(&kind).copied()
    }
}

/// Reads a session without touching it.
pub struct ReportBuilder<'a> {
    state: &'a SessionState,
    table: &'a ScoringTable,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(state: &'a SessionState, table: &'a ScoringTable) -> Self {
        Self { state, table }
    }

    pub fn snapshot(&self, environment: serde_json::Value) -> Report {
        let metrics: BTreeMap<SignalKind, MetricValue> = self
            .state
            .accumulators()
            .map(|accumulator| (accumulator.kind(), accumulator.value().clone()))
            .collect();

        let verdicts: BTreeMap<SignalKind, Verdict> = metrics
            .iter()
            .filter_map(|(kind, value)| {
                self.table
                    .classify(*kind, value.headline())
                    .map(|verdict| (*kind, verdict))
            })
            .collect();

        let composite_score = self.table.composite(&verdicts);

        let timeline = self.state.timeline().events().to_vec();
        let issues = timeline
            .iter()
            .map(|event| format!("{}: {}", event.category, event.messages.join("; ")))
            .collect();

        Report {
            session_id: self.state.id.clone(),
            started_at: self.state.started_at,
            status: self.state.status(),
            metrics,
            verdicts,
            composite_score,
            issues,
            timeline,
            environment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricSample;
    use serde_json::json;

    #[test]
    fn empty_session_reports_zero_values_for_every_signal() {
        let state = SessionState::new();
        let table = ScoringTable::default();
        let report = ReportBuilder::new(&state, &table).snapshot(json!({ "userAgent": "test" }));

        assert_eq!(report.metrics.len(), SignalKind::ALL.len());
        assert_eq!(report.metric(SignalKind::Fcp), Some(&MetricValue::Scalar(0.0)));
        assert_eq!(
            report.metric(SignalKind::Loaf),
            Some(&MetricValue::Series(Vec::new()))
        );
        assert_eq!(report.verdict(SignalKind::Fcp), Some(Verdict::Good));
        assert_eq!(report.verdict(SignalKind::Loaf), None);
        assert_eq!(report.composite_score, 100);
        assert_eq!(report.environment["userAgent"], "test");
    }

    #[test]
    fn snapshot_reads_provisional_values_without_mutating() {
        let mut state = SessionState::new();
        state
            .accumulator_mut(SignalKind::Lcp)
            .ingest(MetricSample::new(SignalKind::Lcp, 4200.0, 1.0));
        state
            .accumulator_mut(SignalKind::LongTask)
            .ingest(MetricSample::new(SignalKind::LongTask, 220.0, 2.0));
        let table = ScoringTable::default();

        let first = ReportBuilder::new(&state, &table).snapshot(serde_json::Value::Null);
        let second = ReportBuilder::new(&state, &table).snapshot(serde_json::Value::Null);
        assert_eq!(first, second);
        assert!(!state.accumulator(SignalKind::Lcp).is_finalized());

        assert_eq!(first.verdict(SignalKind::Lcp), Some(Verdict::Poor));
        assert_eq!(first.verdict(SignalKind::LongTask), Some(Verdict::NeedsImprovement));
        // 0.25 * 20 + 0.75 * 100
        assert_eq!(first.composite_score, 80);
    }

    #[test]
    fn report_serializes_with_signal_keys() {
        let state = SessionState::new();
        let table = ScoringTable::default();
        let report = ReportBuilder::new(&state, &table).snapshot(serde_json::Value::Null);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metrics"]["CLS"], json!(0.0));
        assert_eq!(value["metrics"]["LongTask"], json!([]));
        assert_eq!(value["verdicts"]["LCP"], json!("good"));
        assert_eq!(value["status"], json!("active"));
    }
}
