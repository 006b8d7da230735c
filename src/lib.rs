mod utils;

pub mod accumulator;
pub mod diagnostics;
pub mod metrics;
pub mod observer;
pub mod report;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod sink;
pub mod timeline;

pub use accumulator::{Accumulator, AccumulatorState};
pub use diagnostics::Finding;
pub use metrics::{MetricSample, MetricValue, SignalKind};
pub use observer::{
    ChannelSource, EntryBatch, EntryFeed, ObservationPump, ObservationSource, RawEntry,
    SignalChannel, SubscribeOptions, Visibility,
};
pub use report::{Report, ReportBuilder};
pub use scoring::{ConfigError, ScoringConfig, ScoringTable, TriageConfig, Verdict};
pub use session::{SessionController, SessionState, SessionStatus};
pub use settings::Settings;
pub use sink::{ConsoleSink, LogSink, NullSink};
pub use timeline::{TimelineEvent, TimelineLog};

/// Installs `env_logger` as the `log` backend. `RUST_LOG` still wins over
/// the level picked here. Calling it twice is harmless.
pub fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
