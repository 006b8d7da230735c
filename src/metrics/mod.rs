mod types;

pub use types::{
    truncate_attribution, Attribution, ElementRef, MetricSample, MetricValue, SignalKind,
    ATTRIBUTION_MAX_CHARS, NO_ELEMENT, UNREADABLE_ELEMENT,
};
