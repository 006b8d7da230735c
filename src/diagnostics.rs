//! Message lines attached to emitted events.
//!
//! Streaming signals (long tasks, slow interactions, input delay, TTFB,
//! animation frames) produce a finding per entry. Held signals (LCP, CLS,
//! FCP) produce one finding when the session finalizes.

use serde::{Deserialize, Serialize};

use crate::accumulator::Accumulator;
use crate::metrics::{ElementRef, SignalKind};
use crate::observer::RawEntry;
use crate::scoring::TriageConfig;

pub const LONG_TASK: &str = "Long Task";
pub const ANIMATION_FRAME: &str = "LoAF Detected";
pub const SLOW_INTERACTION: &str = "INP Interaction Issue";
pub const FIRST_INPUT: &str = "FID";
pub const TIME_TO_FIRST_BYTE: &str = "TTFB";
pub const LARGEST_PAINT: &str = "LCP";
pub const LAYOUT_SHIFT: &str = "CLS";
pub const FIRST_PAINT: &str = "FCP";
pub const TIMELINE_REPORT: &str = "Timeline Report";

/// A category plus its message lines; the payload of a timeline event
/// before it is timestamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: String,
    pub messages: Vec<String>,
}

impl Finding {
    pub fn new(category: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            category: category.into(),
            messages,
        }
    }
}

fn whole_ms(value: f64) -> i64 {
    value.round() as i64
}

fn whole_or_na(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => whole_ms(v).to_string(),
        _ => "N/A".to_string(),
    }
}

/// Finding for an entry that is reported as soon as it arrives, if it
/// crosses its threshold.
pub fn on_entry(entry: &RawEntry, triage: &TriageConfig) -> Option<Finding> {
    match entry {
        RawEntry::LongTask(task) => {
            let severity = triage.long_task_severity(task.duration)?;
            Some(Finding::new(
                LONG_TASK,
                vec![
                    format!("Duration: {}ms", whole_ms(task.duration)),
                    format!("Severity: {severity}"),
                    "→ Consider breaking into smaller tasks or deferring heavy JS".to_string(),
                ],
            ))
        }
        RawEntry::AnimationFrame(frame) => {
            let mut messages = vec![
                format!(
                    "Duration: {}ms, Blocking: {}ms",
                    whole_or_na(frame.duration),
                    whole_or_na(frame.blocking_duration)
                ),
                format!(
                    "Render: {}ms, Layout: {}ms",
                    whole_or_na(frame.render_time),
                    whole_or_na(frame.style_and_layout_duration)
                ),
            ];
            if frame.render_time.is_none() || frame.style_and_layout_duration.is_none() {
                messages.push(
                    "Note: host does not report render/layout detail for animation frames"
                        .to_string(),
                );
            }
            messages.push("→ Investigate heavy scripts or CSS causing recalculations".to_string());
            Some(Finding::new(ANIMATION_FRAME, messages))
        }
        RawEntry::Event(event) if event.duration > triage.interaction_report_over_ms => {
            let mut messages = vec![format!(
                "{} delayed interaction response by {}ms",
                event.name,
                whole_ms(event.duration)
            )];
            if let Some(target) = &event.target {
                messages.push(format!("Element: {}", target.describe()));
            }
            messages.push("→ Consider simplifying event handlers or deferring tasks".to_string());
            Some(Finding::new(SLOW_INTERACTION, messages))
        }
        RawEntry::FirstInput(input) => {
            let delay = input.input_delay()?;
            if !(delay > triage.first_input_report_over_ms) {
                return None;
            }
            let mut messages = vec![format!("First Input Delay: {}ms", whole_ms(delay))];
            if let Some(target) = &input.target {
                messages.push(format!("Element: {}", target.describe()));
            }
            Some(Finding::new(FIRST_INPUT, messages))
        }
        RawEntry::Navigation(navigation) => Some(Finding::new(
            TIME_TO_FIRST_BYTE,
            vec![
                format!(
                    "Time To First Byte: {}ms",
                    whole_or_na(navigation.response_start)
                ),
                "→ Consider optimizing backend response times and CDN performance".to_string(),
            ],
        )),
        _ => None,
    }
}

/// Finding for a held signal at session end. LCP and FCP stay silent when
/// nothing was observed; CLS always reports, zero included.
pub fn on_finalize(accumulator: &Accumulator) -> Option<Finding> {
    let value = accumulator.value().headline();
    match accumulator.kind() {
        SignalKind::Lcp if accumulator.has_samples() => Some(Finding::new(
            LARGEST_PAINT,
            vec![
                format!("Largest Contentful Paint: {}ms", whole_ms(value)),
                format!(
                    "Element: {}",
                    ElementRef::describe_opt(accumulator.latest_element())
                ),
                "→ Optimize images, text, and video content for faster loading".to_string(),
            ],
        )),
        SignalKind::Cls => {
            let mut messages = vec![
                format!("Cumulative Layout Shift: {value:.2}"),
                "→ Consider adding size attributes to images/videos, reserving space for embeds, or avoiding dynamic content injection".to_string(),
            ];
            let sources = accumulator.shift_sources();
            if !sources.is_empty() {
                let described: Vec<String> = sources.iter().map(ElementRef::describe).collect();
                messages.push(format!("Top layout shift sources: {}", described.join(" | ")));
            }
            Some(Finding::new(LAYOUT_SHIFT, messages))
        }
        SignalKind::Fcp if accumulator.has_samples() => Some(Finding::new(
            FIRST_PAINT,
            vec![format!("First Contentful Paint: {}ms", whole_ms(value))],
        )),
        _ => None,
    }
}
