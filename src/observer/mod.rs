//! Boundary to whatever produces performance entries.
//!
//! The core never polls: it registers a callback per channel and the host
//! invokes it with batches of entries whenever it has some.

pub mod entry;
pub mod pump;
pub mod source;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use entry::RawEntry;
pub use pump::ObservationPump;
pub use source::{ChannelSource, EntryBatch, EntryFeed};

/// Receives every batch delivered for one subscription, in delivery order.
pub type EntryCallback = Box<dyn FnMut(Vec<RawEntry>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalChannel {
    #[serde(rename = "longtask")]
    LongTask,
    #[serde(rename = "long-animation-frame")]
    LongAnimationFrame,
    #[serde(rename = "layout-shift")]
    LayoutShift,
    #[serde(rename = "paint")]
    Paint,
    #[serde(rename = "largest-contentful-paint")]
    LargestContentfulPaint,
    #[serde(rename = "event")]
    Event,
    #[serde(rename = "first-input")]
    FirstInput,
    #[serde(rename = "navigation")]
    Navigation,
}

impl SignalChannel {
    pub const ALL: [SignalChannel; 8] = [
        SignalChannel::LongTask,
        SignalChannel::LongAnimationFrame,
        SignalChannel::LayoutShift,
        SignalChannel::Paint,
        SignalChannel::LargestContentfulPaint,
        SignalChannel::Event,
        SignalChannel::FirstInput,
        SignalChannel::Navigation,
    ];

    /// Entry type name used by the host platform.
    pub fn entry_type(&self) -> &'static str {
        match self {
            SignalChannel::LongTask => "longtask",
            SignalChannel::LongAnimationFrame => "long-animation-frame",
            SignalChannel::LayoutShift => "layout-shift",
            SignalChannel::Paint => "paint",
            SignalChannel::LargestContentfulPaint => "largest-contentful-paint",
            SignalChannel::Event => "event",
            SignalChannel::FirstInput => "first-input",
            SignalChannel::Navigation => "navigation",
        }
    }
}

impl fmt::Display for SignalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubscribeOptions {
    /// Also deliver entries the host recorded before the subscription.
    pub buffered: bool,
    /// Only deliver entries at least this long (event timing).
    pub duration_threshold: Option<f64>,
}

/// Page visibility as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// A host capable of pushing entries for some set of channels.
pub trait ObservationSource {
    /// Whether the host can observe `channel` at all.
    fn supports(&self, _channel: SignalChannel) -> bool {
        true
    }

    /// Registers `callback` for `channel`. Subscribing to an unsupported
    /// channel is not an error; the callback simply never fires.
    fn subscribe(
        &mut self,
        channel: SignalChannel,
        options: SubscribeOptions,
        callback: EntryCallback,
    );
}
