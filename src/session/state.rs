use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::accumulator::Accumulator;
use crate::metrics::SignalKind;
use crate::timeline::TimelineLog;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Active,
    Finalized,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

/// Everything one observed page owns: an accumulator per signal and the
/// timeline. Lives exactly as long as the session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: String,
    pub started_at: DateTime<Utc>,
    status: SessionStatus,
    /// Monotonic origin of every `captured_at_ms`.
    origin: Instant,
    accumulators: [Accumulator; 7],
    timeline: TimelineLog,
}

impl SessionState {
    pub fn new() -> Self {
        Self::starting_at(Utc::now(), Instant::now())
    }

    pub fn starting_at(started_at: DateTime<Utc>, origin: Instant) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at,
            status: SessionStatus::Active,
            origin,
            accumulators: SignalKind::ALL.map(Accumulator::new),
            timeline: TimelineLog::new(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Milliseconds since the session origin.
    pub fn elapsed_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    pub fn accumulator(&self, kind: SignalKind) -> &Accumulator {
        &self.accumulators[kind.index()]
    }

    pub fn accumulator_mut(&mut self, kind: SignalKind) -> &mut Accumulator {
        &mut self.accumulators[kind.index()]
    }

    pub fn accumulators(&self) -> impl Iterator<Item = &Accumulator> {
        self.accumulators.iter()
    }

    pub fn timeline(&self) -> &TimelineLog {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut TimelineLog {
        &mut self.timeline
    }

    /// Moves `Active → Finalized`. Returns `false` if the session was
    /// already finalized; there is no way back to `Active`.
    pub fn mark_finalized(&mut self) -> bool {
        if self.status == SessionStatus::Finalized {
            return false;
        }
        self.status = SessionStatus::Finalized;
        true
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
