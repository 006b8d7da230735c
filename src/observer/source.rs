use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

use super::{EntryCallback, ObservationSource, RawEntry, SignalChannel, SubscribeOptions};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Entries kept per channel for late `buffered` subscribers.
const MAX_BUFFERED_ENTRIES: usize = 150;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryBatch {
    pub channel: SignalChannel,
    /// Undecodable entries are dropped one by one; the rest of the batch
    /// survives.
    #[serde(deserialize_with = "decode_entries")]
    pub entries: Vec<RawEntry>,
}

fn decode_entries<'de, D>(deserializer: D) -> Result<Vec<RawEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values.into_iter().filter_map(RawEntry::decode).collect())
}

/// Host-side handle for pushing batches into a [`ChannelSource`].
#[derive(Debug, Clone)]
pub struct EntryFeed {
    tx: mpsc::UnboundedSender<EntryBatch>,
}

impl EntryFeed {
    /// Queues a batch. Returns `false` once the source has gone away.
    pub fn push(&self, channel: SignalChannel, entries: Vec<RawEntry>) -> bool {
        self.tx.send(EntryBatch { channel, entries }).is_ok()
    }
}

struct Subscriber {
    options: SubscribeOptions,
    callback: EntryCallback,
}

impl Subscriber {
    fn deliver(&mut self, entries: &[RawEntry]) {
        let selected: Vec<RawEntry> = match self.options.duration_threshold {
            Some(threshold) => entries
                .iter()
                .filter(|e| e.duration().map_or(true, |d| d >= threshold))
                .cloned()
                .collect(),
            None => entries.to_vec(),
        };
        if !selected.is_empty() {
            (self.callback)(selected);
        }
    }
}

/// [`ObservationSource`] fed through an unbounded channel. Batches are
/// dispatched by whoever owns the source, normally an [`super::ObservationPump`].
pub struct ChannelSource {
    supported: HashSet<SignalChannel>,
    subscribers: HashMap<SignalChannel, Vec<Subscriber>>,
    history: HashMap<SignalChannel, Vec<RawEntry>>,
    rx: Option<mpsc::UnboundedReceiver<EntryBatch>>,
}

impl ChannelSource {
    pub fn new(supported: impl IntoIterator<Item = SignalChannel>) -> (Self, EntryFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            supported: supported.into_iter().collect(),
            subscribers: HashMap::new(),
            history: HashMap::new(),
            rx: Some(rx),
        };
        (source, EntryFeed { tx })
    }

    pub fn with_all_channels() -> (Self, EntryFeed) {
        Self::new(SignalChannel::ALL)
    }

    pub(crate) fn take_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<EntryBatch>> {
        self.rx.take()
    }

    /// Hands `batch` to every subscriber of its channel and returns how many
    /// subscribers were called. Batches for unsupported channels vanish.
    pub fn dispatch(&mut self, batch: EntryBatch) -> usize {
        if !self.supported.contains(&batch.channel) {
            log_debug!("ignoring batch for unsupported channel {}", batch.channel);
            return 0;
        }

        let history = self.history.entry(batch.channel).or_default();
        history.extend(batch.entries.iter().cloned());
        if history.len() > MAX_BUFFERED_ENTRIES {
            let excess = history.len() - MAX_BUFFERED_ENTRIES;
            history.drain(..excess);
        }

        let Some(subscribers) = self.subscribers.get_mut(&batch.channel) else {
            return 0;
        };
        for subscriber in subscribers.iter_mut() {
            subscriber.deliver(&batch.entries);
        }
        subscribers.len()
    }
}

impl ObservationSource for ChannelSource {
    fn supports(&self, channel: SignalChannel) -> bool {
        self.supported.contains(&channel)
    }

    fn subscribe(
        &mut self,
        channel: SignalChannel,
        options: SubscribeOptions,
        callback: EntryCallback,
    ) {
        if !self.supports(channel) {
            log_debug!("subscription to unsupported channel {channel} will stay silent");
            return;
        }

        let mut subscriber = Subscriber { options, callback };
        if options.buffered {
            if let Some(buffered) = self.history.get(&channel) {
                subscriber.deliver(buffered);
            }
        }
        self.subscribers.entry(channel).or_default().push(subscriber);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::entry::{EventTimingEntry, LongTaskEntry};
    use std::sync::{Arc, Mutex};

    fn long_task(duration: f64) -> RawEntry {
        RawEntry::LongTask(LongTaskEntry {
            start_time: 0.0,
            duration,
        })
    }

    fn recorder() -> (Arc<Mutex<Vec<RawEntry>>>, EntryCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: EntryCallback = Box::new(move |entries: Vec<RawEntry>| {
            sink.lock().unwrap().extend(entries)
        });
        (seen, callback)
    }

    #[test]
    fn delivers_whole_batch() {
        let (mut source, _feed) = ChannelSource::with_all_channels();
        let (seen, callback) = recorder();
        source.subscribe(SignalChannel::LongTask, SubscribeOptions::default(), callback);

        let called = source.dispatch(EntryBatch {
            channel: SignalChannel::LongTask,
            entries: vec![long_task(130.0), long_task(260.0), long_task(90.0)],
        });
        assert_eq!(called, 1);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn unsupported_channel_stays_silent() {
        let (mut source, _feed) = ChannelSource::new([SignalChannel::Paint]);
        let (seen, callback) = recorder();
        source.subscribe(SignalChannel::LongTask, SubscribeOptions::default(), callback);
        source.dispatch(EntryBatch {
            channel: SignalChannel::LongTask,
            entries: vec![long_task(500.0)],
        });
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn buffered_subscriber_receives_history() {
        let (mut source, _feed) = ChannelSource::with_all_channels();
        source.dispatch(EntryBatch {
            channel: SignalChannel::LongTask,
            entries: vec![long_task(140.0)],
        });

        let (seen, callback) = recorder();
        source.subscribe(
            SignalChannel::LongTask,
            SubscribeOptions {
                buffered: true,
                duration_threshold: None,
            },
            callback,
        );
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn malformed_entry_does_not_sink_its_batch() {
        let batch: EntryBatch = serde_json::from_value(serde_json::json!({
            "channel": "longtask",
            "entries": [
                { "entryType": "longtask", "startTime": 0.0, "duration": 350.0 },
                { "entryType": "longtask", "duration": "slow" },
                { "entryType": "not-a-real-type", "duration": 10.0 },
                { "entryType": "longtask", "startTime": 500.0, "duration": 400.0 }
            ]
        }))
        .unwrap();

        let durations: Vec<Option<f64>> = batch.entries.iter().map(RawEntry::duration).collect();
        assert_eq!(durations, vec![Some(350.0), Some(400.0)]);
    }

    #[test]
    fn duration_threshold_filters_short_events() {
        let (mut source, _feed) = ChannelSource::with_all_channels();
        let (seen, callback) = recorder();
        source.subscribe(
            SignalChannel::Event,
            SubscribeOptions {
                buffered: false,
                duration_threshold: Some(300.0),
            },
            callback,
        );
        let event = |duration| {
            RawEntry::Event(EventTimingEntry {
                name: "click".into(),
                duration,
                ..Default::default()
            })
        };
        source.dispatch(EntryBatch {
            channel: SignalChannel::Event,
            entries: vec![event(40.0), event(320.0)],
        });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
