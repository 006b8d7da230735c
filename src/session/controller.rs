use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{SessionState, SessionStatus};
use crate::accumulator::AccumulatorState;
use crate::diagnostics::{self, Finding};
use crate::metrics::SignalKind;
use crate::observer::{ObservationSource, RawEntry, SignalChannel, SubscribeOptions, Visibility};
use crate::report::{Report, ReportBuilder};
use crate::scoring::{ConfigError, ScoringTable, TriageConfig};
use crate::settings::Settings;
use crate::sink::{ConsoleSink, LogSink};
use crate::timeline::TimelineEvent;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Cheap-to-clone handle on one observed session. Clones share the same
/// state, so every subscription callback can hold its own handle.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    table: Arc<ScoringTable>,
    triage: Arc<TriageConfig>,
    sink: Arc<dyn LogSink>,
    label: Arc<str>,
}

impl SessionController {
    /// Validates `settings` and opens an `Active` session that logs through
    /// [`ConsoleSink`].
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        Self::with_sink(settings, Arc::new(ConsoleSink))
    }

    pub fn with_sink(settings: &Settings, sink: Arc<dyn LogSink>) -> Result<Self, ConfigError> {
        let table = ScoringTable::new(&settings.scoring)?;
        Self::from_parts(
            Arc::new(table),
            settings.triage.clone(),
            settings.label.as_str(),
            sink,
        )
    }

    /// Opens a session on an already validated, possibly shared table.
    pub fn from_parts(
        table: Arc<ScoringTable>,
        triage: TriageConfig,
        label: &str,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, ConfigError> {
        triage.validate()?;
        let state = SessionState::new();
        log_info!("session {} started", state.id);

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            table,
            triage: Arc::new(triage),
            sink,
            label: Arc::from(label),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            log_warn!("session state lock was poisoned, continuing with last state");
            poisoned.into_inner()
        })
    }

    pub fn session_id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    pub fn accumulator_state(&self, kind: SignalKind) -> AccumulatorState {
        self.lock().accumulator(kind).state().clone()
    }

    pub fn timeline(&self) -> Vec<TimelineEvent> {
        self.lock().timeline().events().to_vec()
    }

    /// Subscribes to every channel on `source`. Channels the source cannot
    /// observe are skipped quietly; those signals keep their zero value.
    pub fn attach(&self, source: &mut dyn ObservationSource) {
        for channel in SignalChannel::ALL {
            if !source.supports(channel) {
                log_debug!("channel {channel} unsupported by host, signal stays empty");
            }
            let options = SubscribeOptions {
                buffered: true,
                duration_threshold: match channel {
                    SignalChannel::Event => Some(self.triage.interaction_report_over_ms),
                    _ => None,
                },
            };
            let handle = self.clone();
            source.subscribe(
                channel,
                options,
                Box::new(move |entries: Vec<RawEntry>| handle.ingest_batch(entries)),
            );
        }
    }

    /// Processes every entry of one host callback, in order.
    pub fn ingest_batch(&self, entries: Vec<RawEntry>) {
        let mut outbox = Vec::new();
        {
            let mut state = self.lock();
            for entry in entries {
                self.ingest_entry(&mut state, &entry, &mut outbox);
            }
        }
        self.flush(outbox);
    }

    fn ingest_entry(
        &self,
        state: &mut SessionState,
        entry: &RawEntry,
        outbox: &mut Vec<TimelineEvent>,
    ) {
        let now = state.elapsed_ms();
        if let Some(sample) = entry.to_sample(now) {
            let kind = sample.signal;
            if !state.accumulator_mut(kind).ingest(sample) {
                return;
            }
        }
        if let Some(finding) = diagnostics::on_entry(entry, &self.triage) {
            outbox.push(self.record(state, finding));
        }
    }

    /// Appends an externally produced finding, e.g. from a one-shot page
    /// check, to the timeline and the sink.
    pub fn log_issue(&self, category: impl Into<String>, messages: Vec<String>) {
        let event = {
            let mut state = self.lock();
            self.record(&mut state, Finding::new(category, messages))
        };
        self.flush(vec![event]);
    }

    pub fn on_visibility_change(&self, visibility: Visibility) {
        match visibility {
            Visibility::Hidden => {
                self.finalize();
            }
            Visibility::Visible => log_debug!("page visible again, nothing to do"),
        }
    }

    /// Ends the session: freezes LCP, CLS and FCP, reports their final
    /// values, then records the timeline analysis. Returns `false` if the
    /// session had already been finalized.
    pub fn finalize(&self) -> bool {
        let mut outbox = Vec::new();
        {
            let mut state = self.lock();
            if !state.mark_finalized() {
                log_debug!("session {} already finalized", state.id);
                return false;
            }

            for kind in SignalKind::ALL {
                if !kind.finalizes_at_session_end() {
                    continue;
                }
                let finding = {
                    let accumulator = state.accumulator_mut(kind);
                    if accumulator.finalize() {
                        diagnostics::on_finalize(accumulator)
                    } else {
                        None
                    }
                };
                if let Some(finding) = finding {
                    outbox.push(self.record(&mut state, finding));
                }
            }

            let lines: Vec<String> = state.timeline().analyze().collect();
            outbox.push(self.record(
                &mut state,
                Finding::new(diagnostics::TIMELINE_REPORT, lines),
            ));
            log_info!(
                "session {} finalized with {} timeline events",
                state.id,
                state.timeline().len()
            );
        }
        self.flush(outbox);
        true
    }

    /// Snapshot of the session as it is right now. Unfinalized signals
    /// report their provisional values.
    pub fn get_report(&self, environment: serde_json::Value) -> Report {
        let state = self.lock();
        ReportBuilder::new(&state, &self.table).snapshot(environment)
    }

    fn record(&self, state: &mut SessionState, finding: Finding) -> TimelineEvent {
        let event = TimelineEvent::new(
            finding.category,
            finding.messages,
            state.elapsed_ms(),
            Utc::now(),
        );
        state.timeline_mut().append(event.clone());
        event
    }

    // Sinks run outside the state lock.
    fn flush(&self, outbox: Vec<TimelineEvent>) {
        for event in &outbox {
            self.sink.emit(&self.label, event);
        }
    }
}
