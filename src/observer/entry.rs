//! Entries as delivered by the host, one shape per channel.
//!
//! Hosts that speak JSON hand over duck-typed objects; they are decoded
//! here, once, and the rest of the crate only sees [`RawEntry`]. Timing
//! fields a host may omit are `Option`, everything else defaults to zero.

use serde::{Deserialize, Serialize};

use super::SignalChannel;
use crate::metrics::{Attribution, ElementRef, MetricSample, SignalKind};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Paint entry name that carries first contentful paint.
pub const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entryType")]
pub enum RawEntry {
    #[serde(rename = "longtask")]
    LongTask(LongTaskEntry),
    #[serde(rename = "long-animation-frame")]
    AnimationFrame(AnimationFrameEntry),
    #[serde(rename = "layout-shift")]
    LayoutShift(LayoutShiftEntry),
    #[serde(rename = "paint")]
    Paint(PaintEntry),
    #[serde(rename = "largest-contentful-paint")]
    LargestPaint(LargestPaintEntry),
    #[serde(rename = "event")]
    Event(EventTimingEntry),
    #[serde(rename = "first-input")]
    FirstInput(FirstInputEntry),
    #[serde(rename = "navigation")]
    Navigation(NavigationEntry),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LongTaskEntry {
    pub start_time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimationFrameEntry {
    pub start_time: f64,
    pub duration: Option<f64>,
    pub blocking_duration: Option<f64>,
    #[serde(alias = "renderStart")]
    pub render_time: Option<f64>,
    pub style_and_layout_duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutShiftEntry {
    pub start_time: f64,
    pub value: f64,
    pub had_recent_input: bool,
    pub sources: Vec<ShiftSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftSource {
    pub node: Option<ElementRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaintEntry {
    pub name: String,
    pub start_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LargestPaintEntry {
    pub start_time: f64,
    pub render_time: Option<f64>,
    pub load_time: Option<f64>,
    pub element: Option<ElementRef>,
}

impl LargestPaintEntry {
    /// Render time when the host reports one, otherwise load time. Some
    /// hosts zero or omit render time for cross-origin images. Falls back
    /// to the start time, which the platform defines as the same choice.
    pub fn resolved_time(&self) -> f64 {
        self.render_time
            .filter(|t| t.is_finite() && *t > 0.0)
            .or_else(|| self.load_time.filter(|t| t.is_finite()))
            .unwrap_or(self.start_time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventTimingEntry {
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    pub target: Option<ElementRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FirstInputEntry {
    pub name: String,
    pub start_time: f64,
    pub processing_start: Option<f64>,
    pub target: Option<ElementRef>,
}

impl FirstInputEntry {
    /// `processingStart - startTime`, when both are known.
    pub fn input_delay(&self) -> Option<f64> {
        let processing_start = self.processing_start?;
        if self.start_time <= 0.0 || processing_start <= 0.0 {
            return None;
        }
        Some(processing_start - self.start_time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationEntry {
    pub start_time: f64,
    pub response_start: Option<f64>,
}

impl RawEntry {
    /// Decodes one host object. Objects of unknown type or with badly typed
    /// fields are dropped.
    pub fn decode(value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log_debug!("dropping undecodable entry: {err}");
                None
            }
        }
    }

    pub fn channel(&self) -> SignalChannel {
        match self {
            RawEntry::LongTask(_) => SignalChannel::LongTask,
            RawEntry::AnimationFrame(_) => SignalChannel::LongAnimationFrame,
            RawEntry::LayoutShift(_) => SignalChannel::LayoutShift,
            RawEntry::Paint(_) => SignalChannel::Paint,
            RawEntry::LargestPaint(_) => SignalChannel::LargestContentfulPaint,
            RawEntry::Event(_) => SignalChannel::Event,
            RawEntry::FirstInput(_) => SignalChannel::FirstInput,
            RawEntry::Navigation(_) => SignalChannel::Navigation,
        }
    }

    /// Entry duration, for channels that have one.
    pub fn duration(&self) -> Option<f64> {
        match self {
            RawEntry::LongTask(e) => Some(e.duration),
            RawEntry::AnimationFrame(e) => e.duration,
            RawEntry::Event(e) => Some(e.duration),
            _ => None,
        }
    }

    /// Sample this entry contributes to its signal's accumulator. First-input
    /// entries and non-FCP paints feed no accumulator.
    pub fn to_sample(&self, captured_at_ms: f64) -> Option<MetricSample> {
        let sample = match self {
            RawEntry::LongTask(e) => MetricSample::new(SignalKind::LongTask, e.duration, captured_at_ms),
            RawEntry::AnimationFrame(e) => MetricSample::new(
                SignalKind::Loaf,
                e.duration.unwrap_or(0.0),
                captured_at_ms,
            ),
            RawEntry::LayoutShift(e) => MetricSample::new(SignalKind::Cls, e.value, captured_at_ms)
                .with_attribution(Attribution {
                    element: None,
                    had_recent_input: e.had_recent_input,
                    sources: e.sources.iter().filter_map(|s| s.node.clone()).collect(),
                }),
            RawEntry::Paint(e) if e.name == FIRST_CONTENTFUL_PAINT => {
                MetricSample::new(SignalKind::Fcp, e.start_time, captured_at_ms)
            }
            RawEntry::Paint(_) => return None,
            RawEntry::LargestPaint(e) => {
                MetricSample::new(SignalKind::Lcp, e.resolved_time(), captured_at_ms)
                    .with_attribution(Attribution {
                        element: e.element.clone(),
                        ..Attribution::default()
                    })
            }
            RawEntry::Event(e) => MetricSample::new(SignalKind::Inp, e.duration, captured_at_ms)
                .with_attribution(Attribution {
                    element: e.target.clone(),
                    ..Attribution::default()
                }),
            RawEntry::FirstInput(_) => return None,
            RawEntry::Navigation(e) => MetricSample::new(
                SignalKind::Ttfb,
                e.response_start.unwrap_or(0.0),
                captured_at_ms,
            ),
        };
        Some(sample)
    }
}
