//! Per-signal running state.
//!
//! Three update rules exist:
//! - latest-wins scalars (LCP, INP, FCP, TTFB) overwrite on every sample,
//! - CLS sums shift values that were not caused by recent user input,
//! - collections (LongTask, LoAF) append every sample.
//!
//! Once finalized the value is frozen and later samples are dropped
//! silently; observers routinely fire while a page is unloading.

use serde::Serialize;

use crate::metrics::{ElementRef, MetricSample, MetricValue, SignalKind};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Shift sources kept per counted layout-shift entry.
const MAX_SOURCES_PER_SHIFT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorState {
    pub kind: SignalKind,
    pub current: MetricValue,
    pub finalized: bool,
    pub raw_entries: Vec<MetricSample>,
}

#[derive(Debug, Clone)]
pub struct Accumulator {
    state: AccumulatorState,
    shift_sources: Vec<ElementRef>,
}

impl Accumulator {
    pub fn new(kind: SignalKind) -> Self {
        Self {
            state: AccumulatorState {
                kind,
                current: MetricValue::zero_for(kind),
                finalized: false,
                raw_entries: Vec::new(),
            },
            shift_sources: Vec::new(),
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.state.kind
    }

    pub fn value(&self) -> &MetricValue {
        &self.state.current
    }

    pub fn is_finalized(&self) -> bool {
        self.state.finalized
    }

    pub fn raw_entries(&self) -> &[MetricSample] {
        &self.state.raw_entries
    }

    pub fn has_samples(&self) -> bool {
        !self.state.raw_entries.is_empty()
    }

    /// Element of the most recent sample that carried one.
    pub fn latest_element(&self) -> Option<&ElementRef> {
        self.state
            .raw_entries
            .last()
            .and_then(MetricSample::element)
    }

    /// Layout-shift sources gathered from counted shifts, oldest first.
    pub fn shift_sources(&self) -> &[ElementRef] {
        &self.shift_sources
    }

    pub fn state(&self) -> &AccumulatorState {
        &self.state
    }

    /// Folds one sample into the running value. Returns `false` when the
    /// sample was dropped (late, or addressed to another signal).
    pub fn ingest(&mut self, sample: MetricSample) -> bool {
        if self.state.finalized {
            log_debug!(
                "{} already finalized, dropping late sample at {:.0}ms",
                self.state.kind,
                sample.captured_at_ms
            );
            return false;
        }
        if sample.signal != self.state.kind {
            log_debug!(
                "{} accumulator ignoring sample for {}",
                self.state.kind,
                sample.signal
            );
            return false;
        }

        let value = if sample.value.is_finite() {
            sample.value
        } else {
            0.0
        };

        match (&mut self.state.current, self.state.kind) {
            (MetricValue::Series(values), _) => values.push(value),
            (MetricValue::Scalar(total), SignalKind::Cls) => {
                if !sample.had_recent_input() {
                    *total += value;
                    if let Some(attribution) = &sample.attribution {
                        self.shift_sources.extend(
                            attribution
                                .sources
                                .iter()
                                .take(MAX_SOURCES_PER_SHIFT)
                                .cloned(),
                        );
                    }
                }
            }
            (MetricValue::Scalar(current), _) => *current = value,
        }

        self.state.raw_entries.push(sample);
        true
    }

    /// Freezes the current value. Only the first call has an effect; it
    /// returns `true` so the caller knows to report the final value.
    pub fn finalize(&mut self) -> bool {
        if self.state.finalized {
            return false;
        }
        self.state.finalized = true;
        true
    }
}
