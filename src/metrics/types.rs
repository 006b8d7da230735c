use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest attribution string (element markup) put into an emitted message.
pub const ATTRIBUTION_MAX_CHARS: usize = 100;

/// Rendered when an entry carries no element at all.
pub const NO_ELEMENT: &str = "N/A";

/// Rendered when an element is present but its markup could not be read.
pub const UNREADABLE_ELEMENT: &str = "[unreadable]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "LCP")]
    Lcp,
    #[serde(rename = "CLS")]
    Cls,
    #[serde(rename = "INP")]
    Inp,
    #[serde(rename = "FCP")]
    Fcp,
    #[serde(rename = "TTFB")]
    Ttfb,
    #[serde(rename = "LongTask")]
    LongTask,
    #[serde(rename = "LoAF")]
    Loaf,
}

impl SignalKind {
    pub const ALL: [SignalKind; 7] = [
        SignalKind::Lcp,
        SignalKind::Cls,
        SignalKind::Inp,
        SignalKind::Fcp,
        SignalKind::Ttfb,
        SignalKind::LongTask,
        SignalKind::Loaf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Lcp => "LCP",
            SignalKind::Cls => "CLS",
            SignalKind::Inp => "INP",
            SignalKind::Fcp => "FCP",
            SignalKind::Ttfb => "TTFB",
            SignalKind::LongTask => "LongTask",
            SignalKind::Loaf => "LoAF",
        }
    }

    /// Position in [`SignalKind::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Collection signals keep every sample instead of a single running value.
    pub fn is_collection(&self) -> bool {
        matches!(self, SignalKind::LongTask | SignalKind::Loaf)
    }

    /// Signals whose value is held until the session ends and reported once.
    pub fn finalizes_at_session_end(&self) -> bool {
        matches!(self, SignalKind::Lcp | SignalKind::Cls | SignalKind::Fcp)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value held by an accumulator: one number for scalar signals, every
/// observed sample for collection signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl MetricValue {
    pub fn zero_for(kind: SignalKind) -> Self {
        if kind.is_collection() {
            MetricValue::Series(Vec::new())
        } else {
            MetricValue::Scalar(0.0)
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(value) => Some(*value),
            MetricValue::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            MetricValue::Scalar(_) => None,
            MetricValue::Series(values) => Some(values),
        }
    }

    /// Number a verdict is computed from. Series use their worst (largest)
    /// sample, and an empty series counts as zero.
    pub fn headline(&self) -> f64 {
        match self {
            MetricValue::Scalar(value) => *value,
            MetricValue::Series(values) => values.iter().copied().fold(0.0, f64::max),
        }
    }
}

/// Reference to a page element as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRef {
    #[serde(rename = "outerHTML", default)]
    pub outer_html: Option<String>,
}

impl ElementRef {
    pub fn from_markup(markup: impl Into<String>) -> Self {
        Self {
            outer_html: Some(markup.into()),
        }
    }

    /// Markup cut to [`ATTRIBUTION_MAX_CHARS`], or a placeholder when the
    /// host handed us an element without readable markup.
    pub fn describe(&self) -> String {
        match &self.outer_html {
            Some(html) => truncate_attribution(html),
            None => UNREADABLE_ELEMENT.to_string(),
        }
    }

    pub fn describe_opt(element: Option<&ElementRef>) -> String {
        element
            .map(ElementRef::describe)
            .unwrap_or_else(|| NO_ELEMENT.to_string())
    }
}

pub fn truncate_attribution(text: &str) -> String {
    text.chars().take(ATTRIBUTION_MAX_CHARS).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub element: Option<ElementRef>,
    pub had_recent_input: bool,
    /// Elements that moved during a layout shift, at most three per entry.
    pub sources: Vec<ElementRef>,
}

/// One observation for one signal. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub signal: SignalKind,
    pub value: f64,
    pub captured_at_ms: f64,
    pub attribution: Option<Attribution>,
}

impl MetricSample {
    pub fn new(signal: SignalKind, value: f64, captured_at_ms: f64) -> Self {
        Self {
            signal,
            value,
            captured_at_ms,
            attribution: None,
        }
    }

    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = Some(attribution);
        self
    }

    pub fn had_recent_input(&self) -> bool {
        self.attribution
            .as_ref()
            .map(|attribution| attribution.had_recent_input)
            .unwrap_or(false)
    }

    pub fn element(&self) -> Option<&ElementRef> {
        self.attribution
            .as_ref()
            .and_then(|attribution| attribution.element.as_ref())
    }
}
