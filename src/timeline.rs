//! Append-only record of every emitted event.
//!
//! Events are stored in arrival order. Analysis orders them by monotonic
//! capture time instead, because callbacks for different signals arrive in
//! no particular order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Emitted instead of an ordering when there is nothing to compare.
pub const TIMELINE_PLACEHOLDER: &str =
    "Not enough events recorded yet to compare their timing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub category: String,
    pub messages: Vec<String>,
    /// Milliseconds since the session origin; the ordering key.
    pub captured_at_ms: f64,
    /// Wall-clock time, for display only.
    pub logged_at: String,
}

impl TimelineEvent {
    pub fn new(
        category: impl Into<String>,
        messages: Vec<String>,
        captured_at_ms: f64,
        logged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category: category.into(),
            messages,
            captured_at_ms,
            logged_at: logged_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimelineLog {
    events: Vec<TimelineEvent>,
}

impl TimelineLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in arrival order.
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Lines of the form `"<n>. <category> ➜ <delta>ms"`, ordered by capture
    /// time, with `delta` measured from the earliest event. Fewer than two
    /// events yield a single placeholder line.
    pub fn analyze(&self) -> TimelineAnalysis<'_> {
        if self.events.len() < 2 {
            return TimelineAnalysis {
                ordered: Vec::new(),
                origin: 0.0,
                position: 0,
                placeholder: true,
            };
        }

        let mut ordered: Vec<&TimelineEvent> = self.events.iter().collect();
        ordered.sort_by(|a, b| a.captured_at_ms.total_cmp(&b.captured_at_ms));
        let origin = ordered[0].captured_at_ms;

        TimelineAnalysis {
            ordered,
            origin,
            position: 0,
            placeholder: false,
        }
    }
}

/// Lazy rendering of a timeline ordering; see [`TimelineLog::analyze`].
#[derive(Debug)]
pub struct TimelineAnalysis<'a> {
    ordered: Vec<&'a TimelineEvent>,
    origin: f64,
    position: usize,
    placeholder: bool,
}

impl Iterator for TimelineAnalysis<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.placeholder {
            if self.position > 0 {
                return None;
            }
            self.position = 1;
            return Some(TIMELINE_PLACEHOLDER.to_string());
        }

        let event = self.ordered.get(self.position)?;
        self.position += 1;
        let delta = (event.captured_at_ms - self.origin).round() as i64;
        Some(format!("{}. {} ➜ {}ms", self.position, event.category, delta))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.placeholder {
            usize::from(self.position == 0)
        } else {
            self.ordered.len() - self.position
        };
        (remaining, Some(remaining))
    }
}
